//! Fixed parameters of the boot memory layout.

use ternos_abi::arch::x86_64::paging::{PAGE_SIZE_1GB, PAGE_SIZE_2MB};

/// Base page size.
pub const PAGE_SIZE: u64 = 0x1000;

/// Granule the boot identity map is built from.
pub const IDENTITY_MAP_PAGE_SIZE: u64 = PAGE_SIZE_2MB;

/// Physical span the boot identity map covers.
pub const IDENTITY_MAP_SIZE: u64 = PAGE_SIZE_1GB;

/// One page directory of 2 MiB entries is the ceiling of the bootstrap
/// tables; a larger request is a build defect, not a runtime condition.
pub const MAX_IDENTITY_MAP_SIZE: u64 = PAGE_SIZE_1GB;

/// Virtual address the kernel image is linked at.
pub const KERNEL_VIRTUAL_BASE: u64 = 0xFFFF_FFFF_8000_0000;

/// Span of the kernel-image window mapped below the top of the address
/// space (the link address the image executes at).
pub const KERNEL_WINDOW_SIZE: u64 = 64 * 1024 * 1024;

const _: () = assert!(IDENTITY_MAP_SIZE <= MAX_IDENTITY_MAP_SIZE);
const _: () = assert!(IDENTITY_MAP_SIZE % IDENTITY_MAP_PAGE_SIZE == 0);
