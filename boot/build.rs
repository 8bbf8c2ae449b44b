fn main() {
    println!("cargo:rustc-link-arg=-no-pie");
}
