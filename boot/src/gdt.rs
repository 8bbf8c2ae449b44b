//! Segment descriptor table build and load.
//!
//! The flat-memory model needs exactly six fixed entries; all literals live
//! in `ternos-abi`, this module only lays them into the table and installs
//! it. After `build_and_load` returns, the active code and data selectors
//! reference the fresh table and nothing points at bootloader descriptors.

#![allow(static_mut_refs)]

use core::arch::asm;

use ternos_abi::arch::x86_64::gdt::{GDT_ENTRIES, SegmentDescriptor, SegmentSelector};
use ternos_lib::klog_debug;

#[repr(C, packed)]
struct GdtPointer {
    limit: u16,
    base: u64,
}

static mut GDT_TABLE: [u64; GDT_ENTRIES] = [0; GDT_ENTRIES];

/// The six fixed entries, encoded, in their mandated slots.
pub fn table_entries() -> [u64; GDT_ENTRIES] {
    [
        SegmentDescriptor::NULL.encode(),
        SegmentDescriptor::KERNEL_CODE.encode(),
        SegmentDescriptor::KERNEL_DATA.encode(),
        SegmentDescriptor::USER_CODE.encode(),
        SegmentDescriptor::USER_DATA.encode(),
        SegmentDescriptor::TSS_SLOT.encode(),
    ]
}

/// Zero the table, lay in the six entries, and make it the active
/// segmentation context.
pub fn build_and_load() {
    unsafe {
        GDT_TABLE = [0; GDT_ENTRIES];
        GDT_TABLE = table_entries();

        let descriptor = GdtPointer {
            limit: (core::mem::size_of::<[u64; GDT_ENTRIES]>() - 1) as u16,
            base: GDT_TABLE.as_ptr() as u64,
        };
        load_gdt(&descriptor);
    }

    klog_debug!("GDT: flat descriptor table loaded");
}

unsafe fn load_gdt(descriptor: &GdtPointer) {
    unsafe { asm!("lgdt [{0}]", in(reg) descriptor, options(nostack, preserves_flags)) };

    // Far-return through the new code selector, then point every data
    // selector at the new data entry.
    unsafe {
        asm!(
            "pushq ${code}",
            "lea 2f(%rip), %rax",
            "pushq %rax",
            "lretq",
            "2:",
            "movw ${data}, %ax",
            "movw %ax, %ds",
            "movw %ax, %es",
            "movw %ax, %ss",
            "movw %ax, %fs",
            "movw %ax, %gs",
            code = const SegmentSelector::KERNEL_CODE.bits() as usize,
            data = const SegmentSelector::KERNEL_DATA.bits() as usize,
            out("rax") _,
            options(att_syntax, nostack)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_descriptor_is_all_zero() {
        assert_eq!(table_entries()[0], 0);
    }

    #[test]
    fn entries_decode_to_the_flat_model_literals() {
        let entries = table_entries();
        assert_eq!(SegmentDescriptor::decode(entries[1]), SegmentDescriptor::KERNEL_CODE);
        assert_eq!(SegmentDescriptor::decode(entries[2]), SegmentDescriptor::KERNEL_DATA);
        assert_eq!(SegmentDescriptor::decode(entries[3]), SegmentDescriptor::USER_CODE);
        assert_eq!(SegmentDescriptor::decode(entries[4]), SegmentDescriptor::USER_DATA);
        assert_eq!(SegmentDescriptor::decode(entries[5]), SegmentDescriptor::TSS_SLOT);
    }

    #[test]
    fn table_has_exactly_six_entries() {
        assert_eq!(table_entries().len(), 6);
    }
}
