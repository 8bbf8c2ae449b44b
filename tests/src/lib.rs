//! Builtin self-test suites.
//!
//! These run on the real machine from the boot path (feature
//! `builtin-tests`), after the tables are armed but before traps go live.
//! They exercise the same logic the host unit tests cover, plus the pieces
//! that only mean anything on hardware.

#![no_std]

use ternos_lib::testing::TestSuiteDesc;

#[cfg(target_arch = "x86_64")]
mod suites {
    use core::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

    use ternos_abi::arch::x86_64::gdt::SegmentDescriptor;
    use ternos_abi::arch::x86_64::idt::{GateDescriptor, IDT_GATE_TRAP};
    use ternos_abi::arch::x86_64::ports::{PIC_EOI, Port};
    use ternos_drivers::pic::CascadedPics;
    use ternos_drivers::trap::{DispatchOutcome, HandlerRegistry, TrapHandler, dispatch_with};
    use ternos_hal::io::RecordingPortBus;
    use ternos_lib::testing::{SUITE_BASIC, SUITE_PAGING, SUITE_TABLES, SUITE_TRAPS, TestResult};
    use ternos_lib::{TrapFrame, define_test_suite, fail, pass};
    use ternos_mm::mm_constants::IDENTITY_MAP_PAGE_SIZE;
    use ternos_mm::paging::{IdentityMapTables, PageTable};

    fn fake_phys(table: &PageTable) -> u64 {
        table as *const PageTable as u64
    }

    // ---------------------------------------------------------------------
    // basic: capability-layer atomics
    // ---------------------------------------------------------------------

    fn test_atomic_add_previous() -> TestResult {
        let cell = AtomicU64::new(5);
        if ternos_hal::atomic_add(&cell, 3) != 5 {
            return fail!("atomic_add returned the wrong previous value");
        }
        if cell.load(Ordering::SeqCst) != 8 {
            return fail!("atomic_add left the wrong value");
        }
        pass!()
    }

    fn test_compare_exchange() -> TestResult {
        let cell = AtomicU64::new(1);
        if ternos_hal::atomic_compare_exchange(&cell, 1, 2) != 1 {
            return fail!("matching exchange returned the wrong previous value");
        }
        if ternos_hal::atomic_compare_exchange(&cell, 1, 3) != 2 {
            return fail!("non-matching exchange should leave the value alone");
        }
        if cell.load(Ordering::SeqCst) != 2 {
            return fail!("cell corrupted by failed exchange");
        }
        pass!()
    }

    define_test_suite!(capability_atomics, SUITE_BASIC, [
        test_atomic_add_previous,
        test_compare_exchange,
    ]);

    // ---------------------------------------------------------------------
    // tables: descriptor round trips
    // ---------------------------------------------------------------------

    fn test_segment_round_trip() -> TestResult {
        let desc = SegmentDescriptor {
            base: 0x00CA_FE00,
            limit: 0x000B_EEF0,
            access: 0x9A,
            flags: 0xA,
        };
        if SegmentDescriptor::decode(desc.encode()) != desc {
            return fail!("segment descriptor round trip lost bits");
        }
        pass!()
    }

    fn test_null_descriptor_is_zero() -> TestResult {
        if SegmentDescriptor::NULL.encode() != 0 {
            return fail!("null descriptor must encode to zero");
        }
        pass!()
    }

    fn test_gate_round_trip() -> TestResult {
        let gate = GateDescriptor {
            offset: 0xFFFF_FFFF_8010_2030,
            selector: ternos_abi::arch::x86_64::gdt::SegmentSelector::KERNEL_CODE,
            ist: 1,
            type_attr: IDT_GATE_TRAP,
        };
        if GateDescriptor::decode(gate.encode()) != gate {
            return fail!("gate descriptor round trip lost bits");
        }
        pass!()
    }

    define_test_suite!(descriptor_tables, SUITE_TABLES, [
        test_segment_round_trip,
        test_null_descriptor_is_zero,
        test_gate_round_trip,
    ]);

    // ---------------------------------------------------------------------
    // traps: registry, dispatch, controller transcript
    // ---------------------------------------------------------------------

    struct CountingHandler {
        calls: AtomicUsize,
    }

    impl TrapHandler for CountingHandler {
        fn handle(&self, _frame: &mut TrapFrame) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn test_keyboard_vector_end_to_end() -> TestResult {
        static COUNTER: CountingHandler = CountingHandler {
            calls: AtomicUsize::new(0),
        };
        COUNTER.calls.store(0, Ordering::SeqCst);

        let mut registry = HandlerRegistry::new();
        registry.register(33, &COUNTER);

        let mut pics = CascadedPics::new();
        let mut bus = RecordingPortBus::new();
        pics.remap(&mut bus, registry.registered_lines());
        pics.unmask_line(&mut bus, 1);
        bus.clear();

        let mut frame = TrapFrame::synthetic(33);
        if dispatch_with(&registry, &mut pics, &mut bus, &mut frame) != DispatchOutcome::Handled {
            return fail!("registered vector must dispatch to its handler");
        }
        if COUNTER.calls.load(Ordering::SeqCst) != 1 {
            return fail!("handler must run exactly once");
        }
        if bus.writes() != &[(Port::PIC1_COMMAND.number(), PIC_EOI)] {
            return fail!("vector 33 must acknowledge the primary controller only");
        }
        pass!()
    }

    fn test_unregistered_page_fault_reports() -> TestResult {
        let registry = HandlerRegistry::new();
        let mut pics = CascadedPics::new();
        let mut bus = RecordingPortBus::new();
        let mut frame = TrapFrame::synthetic(14);

        if dispatch_with(&registry, &mut pics, &mut bus, &mut frame) != DispatchOutcome::Unhandled {
            return fail!("unregistered vector must fall to the default handler");
        }
        if !bus.writes().is_empty() {
            return fail!("an unhandled exception must not acknowledge the controller");
        }
        pass!()
    }

    fn test_remap_transcript() -> TestResult {
        let mut pics = CascadedPics::new();
        let mut bus = RecordingPortBus::new();
        pics.remap(&mut bus, 0);

        let mut primary = bus.writes_to(Port::PIC1_DATA.number());
        let expected = [0x20u8, 0x04, 0x01, 0xFF];
        for want in expected {
            if primary.next() != Some(want) {
                return fail!("primary controller programming diverged");
            }
        }
        let mut secondary = bus.writes_to(Port::PIC2_DATA.number());
        for want in [0x28u8, 0x02, 0x01, 0xFF] {
            if secondary.next() != Some(want) {
                return fail!("secondary controller programming diverged");
            }
        }
        pass!()
    }

    define_test_suite!(trap_dispatch, SUITE_TRAPS, [
        test_keyboard_vector_end_to_end,
        test_unregistered_page_fault_reports,
        test_remap_transcript,
    ]);

    // ---------------------------------------------------------------------
    // paging: identity-map walk
    // ---------------------------------------------------------------------

    fn test_identity_span_translates() -> TestResult {
        let mut tables = IdentityMapTables::new();
        tables.build(IDENTITY_MAP_PAGE_SIZE * 8, &fake_phys);

        let mut vaddr = 0u64;
        while vaddr < IDENTITY_MAP_PAGE_SIZE * 8 {
            if tables.translate(vaddr, &fake_phys) != Some(vaddr) {
                return fail!("identity translation broke at 0x{:x}", vaddr);
            }
            vaddr += IDENTITY_MAP_PAGE_SIZE;
        }
        pass!()
    }

    fn test_unmapped_address_misses() -> TestResult {
        let mut tables = IdentityMapTables::new();
        tables.build(IDENTITY_MAP_PAGE_SIZE, &fake_phys);

        if tables.translate(IDENTITY_MAP_PAGE_SIZE, &fake_phys).is_some() {
            return fail!("address beyond the span must not translate");
        }
        pass!()
    }

    define_test_suite!(boot_paging, SUITE_PAGING, [
        test_identity_span_translates,
        test_unmapped_address_misses,
    ]);

    static ALL: [&ternos_lib::testing::TestSuiteDesc; 4] = [
        &CAPABILITY_ATOMICS_SUITE_DESC,
        &DESCRIPTOR_TABLES_SUITE_DESC,
        &TRAP_DISPATCH_SUITE_DESC,
        &BOOT_PAGING_SUITE_DESC,
    ];

    pub fn all() -> &'static [&'static ternos_lib::testing::TestSuiteDesc] {
        &ALL
    }
}

/// Every suite this build carries.
pub fn all_suites() -> &'static [&'static TestSuiteDesc] {
    #[cfg(target_arch = "x86_64")]
    {
        suites::all()
    }
    #[cfg(not(target_arch = "x86_64"))]
    {
        &[]
    }
}
