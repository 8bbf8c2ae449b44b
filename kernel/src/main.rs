//! Kernel entry: hand control to the bring-up sequence, then idle.

#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", no_main)]

#[cfg(target_os = "none")]
mod entry {
    use core::panic::PanicInfo;

    use ternos_boot as boot;
    use ternos_lib::{klog_attach_serial, klog_error, klog_info, klog_init};

    const ARCH_NAME: &str = if cfg!(target_arch = "x86_64") {
        "x86_64"
    } else if cfg!(target_arch = "aarch64") {
        "arm64"
    } else {
        "riscv64"
    };

    #[panic_handler]
    fn panic(info: &PanicInfo) -> ! {
        ternos_hal::disable_traps();
        klog_error!("Kernel panic: {}", info);
        ternos_hal::halt_loop()
    }

    #[unsafe(no_mangle)]
    pub extern "C" fn _start() -> ! {
        klog_init();
        klog_attach_serial();
        klog_info!("TernOS early boot on {}", ARCH_NAME);

        #[cfg(target_arch = "x86_64")]
        boot::limine_protocol::ensure_base_revision();

        boot::boot_init_run_all();

        klog_info!("TernOS: bring-up complete, idling");
        ternos_hal::halt_loop()
    }
}

// Hosted builds exist only so `cargo test` can traverse the workspace; the
// kernel proper is the `target_os = "none"` half above.
#[cfg(not(target_os = "none"))]
fn main() {}
