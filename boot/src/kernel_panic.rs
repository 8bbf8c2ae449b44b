//! Fatal-condition reporting.
//!
//! There is no supervisor beneath this layer, so a fatal hardware
//! condition ends here: mask traps, report once over the best available
//! synchronous channel, and park the core.

use ternos_lib::{StateFlag, klog_error};

static PANIC_IN_PROGRESS: StateFlag = StateFlag::new();

/// Report `message` and halt in place. Re-entrant panics skip the report
/// and go straight to the halt loop.
pub fn kernel_panic(message: &str) -> ! {
    ternos_hal::disable_traps();

    if PANIC_IN_PROGRESS.enter() {
        klog_error!("");
        klog_error!("=== KERNEL PANIC ===");
        klog_error!("PANIC: {}", message);
    }

    ternos_hal::halt_loop()
}

/// Panic unless `condition` holds.
pub fn kernel_assert(condition: bool, message: &str) {
    if !condition {
        kernel_panic(message);
    }
}
