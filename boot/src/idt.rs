//! Trap descriptor table build and load.
//!
//! Every one of the 256 vectors gets a gate aimed at its trampoline from
//! `trap_stubs.s`; the trampolines tag the saved context with the vector
//! number and call the generic dispatch routine in `ternos-drivers`. No
//! gate is left unpopulated - a vector nobody registered still lands in
//! dispatch, where the default diagnostic handler takes it.

#![allow(static_mut_refs)]

use core::arch::{asm, global_asm};

use ternos_abi::arch::x86_64::idt::{GateDescriptor, IDT_ENTRIES, RawGateDescriptor};
use ternos_drivers::trap;
use ternos_lib::klog_debug;

global_asm!(include_str!("trap_stubs.s"));

unsafe extern "C" {
    /// Vector-indexed stub entry points, emitted by `trap_stubs.s`.
    static trap_stub_table: [u64; IDT_ENTRIES];
}

#[repr(C, packed)]
struct IdtPointer {
    limit: u16,
    base: u64,
}

static mut IDT: [RawGateDescriptor; IDT_ENTRIES] = [RawGateDescriptor::EMPTY; IDT_ENTRIES];

/// Write one kernel interrupt gate per vector, aimed at the matching stub.
pub fn populate(gates: &mut [RawGateDescriptor; IDT_ENTRIES], stubs: &[u64; IDT_ENTRIES]) {
    for (gate, &stub) in gates.iter_mut().zip(stubs.iter()) {
        *gate = GateDescriptor::interrupt(stub).encode();
    }
}

/// Zero the table, populate all 256 gates, load it, and arm the trap
/// subsystem. Traps stay masked until `go_live`.
pub fn build_and_load() {
    unsafe {
        IDT = [RawGateDescriptor::EMPTY; IDT_ENTRIES];
        populate(&mut IDT, &trap_stub_table);

        let pointer = IdtPointer {
            limit: (core::mem::size_of::<[RawGateDescriptor; IDT_ENTRIES]>() - 1) as u16,
            base: IDT.as_ptr() as u64,
        };
        load_idt(&pointer);
    }

    trap::mark_armed();
    klog_debug!("IDT: 256 gates populated and loaded");
}

unsafe fn load_idt(pointer: &IdtPointer) {
    unsafe {
        asm!("lidt [{0}]", in(reg) pointer, options(nostack, preserves_flags));
    }
}
