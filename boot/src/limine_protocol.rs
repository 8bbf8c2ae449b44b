//! Limine boot protocol handshake.
//!
//! The kernel asks the bootloader for exactly what this layer needs: a
//! supported base revision and the higher-half direct map it uses to reach
//! physical memory before its own tables are live.

use limine::BaseRevision;
use limine::request::HhdmRequest;
use spin::Once;

use crate::kernel_panic::kernel_panic;

#[used]
static BASE_REVISION: BaseRevision = BaseRevision::with_revision(2);

#[used]
static HHDM_REQUEST: HhdmRequest = HhdmRequest::with_revision(0);

/// Boot facts captured once from the bootloader responses.
#[derive(Clone, Copy, Debug)]
pub struct BootInfo {
    /// Offset of the bootloader's direct map of physical memory.
    pub hhdm_offset: u64,
}

static BOOT_INFO: Once<BootInfo> = Once::new();

/// Verify the bootloader speaks a revision we understand. Must run before
/// any response is trusted.
pub fn ensure_base_revision() {
    if !BASE_REVISION.is_supported() {
        kernel_panic("bootloader does not support the requested base revision");
    }
}

/// The captured boot facts, reading the responses on first use.
pub fn boot_info() -> &'static BootInfo {
    BOOT_INFO.call_once(|| {
        let hhdm_offset = match HHDM_REQUEST.get_response() {
            Some(response) => response.offset(),
            None => kernel_panic("bootloader provided no direct-map response"),
        };
        BootInfo { hhdm_offset }
    })
}
