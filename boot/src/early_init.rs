//! The ordered bring-up sequence.
//!
//! Order is load-bearing: descriptor table, then trap table, then
//! controller programming, then the identity map, and only then trap
//! unmasking. Each step either completes or the kernel stops; there is no
//! partial bring-up to fall back to.

use ternos_lib::klog_info;

use crate::kernel_panic::kernel_panic;

/// One bring-up step. Steps run in array order, exactly once.
pub struct BootInitStep {
    pub name: &'static str,
    pub func: fn() -> Result<(), &'static str>,
}

/// Run the whole sequence, then unmask traps.
pub fn boot_init_run_all() {
    for step in init_steps() {
        klog_info!("boot: {}", step.name);
        if let Err(reason) = (step.func)() {
            klog_info!("boot: {} failed: {}", step.name, reason);
            kernel_panic(reason);
        }
    }

    #[cfg(feature = "builtin-tests")]
    run_builtin_suites();

    go_live();
    klog_info!("boot: traps live");
}

#[cfg(target_arch = "x86_64")]
fn init_steps() -> [BootInitStep; 4] {
    [
        BootInitStep {
            name: "descriptor-table",
            func: init_descriptor_table,
        },
        BootInitStep {
            name: "trap-table",
            func: init_trap_table,
        },
        BootInitStep {
            name: "interrupt-controller",
            func: init_controller,
        },
        BootInitStep {
            name: "identity-map",
            func: init_identity_map,
        },
    ]
}

#[cfg(target_arch = "x86_64")]
fn init_descriptor_table() -> Result<(), &'static str> {
    crate::gdt::build_and_load();
    Ok(())
}

#[cfg(target_arch = "x86_64")]
fn init_trap_table() -> Result<(), &'static str> {
    crate::idt::build_and_load();
    Ok(())
}

#[cfg(target_arch = "x86_64")]
fn init_controller() -> Result<(), &'static str> {
    ternos_drivers::trap::program_controller();
    Ok(())
}

#[cfg(target_arch = "x86_64")]
fn init_identity_map() -> Result<(), &'static str> {
    let hhdm_offset = crate::limine_protocol::boot_info().hhdm_offset;
    // SAFETY: single-context bring-up; the image, stack, and tables all
    // fall inside the windows the map covers.
    unsafe { ternos_mm::paging::build_identity_map(ternos_mm::mm_constants::IDENTITY_MAP_SIZE, hhdm_offset) }
}

#[cfg(target_arch = "x86_64")]
fn go_live() {
    ternos_drivers::trap::go_live();
}

// The other targets bring up their trap and translation machinery through
// the capability layer alone; there are no descriptor tables or legacy
// controllers to program.
#[cfg(not(target_arch = "x86_64"))]
fn init_steps() -> [BootInitStep; 1] {
    [BootInitStep {
        name: "capability-layer",
        func: init_capability_layer,
    }]
}

#[cfg(not(target_arch = "x86_64"))]
fn init_capability_layer() -> Result<(), &'static str> {
    ternos_hal::flush_icache();
    ternos_hal::flush_tlb();
    Ok(())
}

#[cfg(not(target_arch = "x86_64"))]
fn go_live() {
    ternos_hal::enable_traps();
}

#[cfg(feature = "builtin-tests")]
fn run_builtin_suites() {
    use ternos_lib::testing::{TestRunSummary, TestSuiteResult};

    klog_info!("boot: running builtin self-tests");
    let mut summary = TestRunSummary::new();
    for desc in ternos_tests::all_suites() {
        let mut result = TestSuiteResult::empty();
        (desc.run)(&mut result);
        klog_info!(
            "  suite {}: {}/{} passed ({} ms)",
            result.name,
            result.passed,
            result.total,
            result.elapsed_ms
        );
        summary.absorb(&result);
    }

    if summary.all_passed() {
        klog_info!(
            "boot: self-tests passed ({}/{} tests)",
            summary.tests_passed,
            summary.tests_total
        );
    } else {
        kernel_panic("builtin self-tests failed");
    }
}
