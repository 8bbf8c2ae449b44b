//! Legacy 8259 cascade programming.
//!
//! The two controllers power up delivering their lines over vectors 8-15,
//! colliding with CPU exceptions. `CascadedPics::remap` sends the four-word
//! initialization sequence that rebases them to 32-47, wires the cascade,
//! and selects 8086 mode, then installs the initial line mask.
//!
//! All port traffic goes through a [`PortBus`] so the exact command stream
//! can be captured in tests. The global instance used by dispatch lives in
//! [`crate::trap`].

use ternos_abi::arch::x86_64::idt::{IRQ_BASE_VECTOR, IRQ_LINES, IRQ_SECONDARY_BASE_VECTOR};
use ternos_abi::arch::x86_64::ports::{
    PIC_CASCADE_LINE, PIC_EOI, PIC_ICW1_INIT_ICW4, PIC_ICW2_PRIMARY_BASE,
    PIC_ICW2_SECONDARY_BASE, PIC_ICW3_CASCADE_ID, PIC_ICW3_CASCADE_MASK, PIC_ICW4_8086, Port,
};
use ternos_hal::io::PortBus;
use ternos_lib::klog_debug;

const PIC1_COMMAND: u16 = Port::PIC1_COMMAND.number();
const PIC1_DATA: u16 = Port::PIC1_DATA.number();
const PIC2_COMMAND: u16 = Port::PIC2_COMMAND.number();
const PIC2_DATA: u16 = Port::PIC2_DATA.number();

/// POST diagnostic port; a write gives the controllers time to settle
/// between initialization words.
const DELAY_PORT: u16 = 0x80;

/// Vector a legacy line lands on after remapping.
#[inline]
pub const fn vector_for_line(line: u8) -> u8 {
    IRQ_BASE_VECTOR + line
}

/// The legacy line behind a vector, if the vector belongs to the remapped
/// hardware-interrupt window.
#[inline]
pub const fn line_for_vector(vector: u8) -> Option<u8> {
    if vector >= IRQ_BASE_VECTOR && (vector as usize) < IRQ_BASE_VECTOR as usize + IRQ_LINES {
        Some(vector - IRQ_BASE_VECTOR)
    } else {
        None
    }
}

/// Software view of the two cascaded controllers.
///
/// Only the mask registers survive programming as state; the ICW sequence
/// is fire-and-forget.
pub struct CascadedPics {
    primary_mask: u8,
    secondary_mask: u8,
    remapped: bool,
}

impl CascadedPics {
    /// Both controllers fully masked, not yet remapped.
    pub const fn new() -> Self {
        Self {
            primary_mask: 0xFF,
            secondary_mask: 0xFF,
            remapped: false,
        }
    }

    /// Whether `remap` has run.
    #[inline]
    pub fn is_remapped(&self) -> bool {
        self.remapped
    }

    /// Whether a line is currently unmasked.
    pub fn line_unmasked(&self, line: u8) -> bool {
        if (line as usize) >= IRQ_LINES {
            return false;
        }
        if line < 8 {
            self.primary_mask & (1 << line) == 0
        } else {
            self.secondary_mask & (1 << (line - 8)) == 0
        }
    }

    /// Derive the pair of mask registers from a bitmap of open lines
    /// (bit n = line n unmasked). The cascade line opens automatically
    /// whenever any secondary line is open.
    pub fn compute_masks(mut unmasked_lines: u16) -> (u8, u8) {
        if unmasked_lines & 0xFF00 != 0 {
            unmasked_lines |= 1 << PIC_CASCADE_LINE;
        }
        (!(unmasked_lines as u8), !((unmasked_lines >> 8) as u8))
    }

    /// Send the full initialization sequence to both controllers.
    ///
    /// `unmasked_lines` is the bitmap of lines that already have handlers
    /// registered; everything else starts masked. Must run before any gate
    /// in the 32-47 window is exercised.
    pub fn remap<B: PortBus>(&mut self, bus: &mut B, unmasked_lines: u16) {
        // ICW1: begin initialization, ICW4 follows.
        bus.write_u8(PIC1_COMMAND, PIC_ICW1_INIT_ICW4);
        Self::settle(bus);
        bus.write_u8(PIC2_COMMAND, PIC_ICW1_INIT_ICW4);
        Self::settle(bus);

        // ICW2: vector bases 32 and 40.
        bus.write_u8(PIC1_DATA, PIC_ICW2_PRIMARY_BASE);
        Self::settle(bus);
        bus.write_u8(PIC2_DATA, PIC_ICW2_SECONDARY_BASE);
        Self::settle(bus);

        // ICW3: secondary cascades through line 2.
        bus.write_u8(PIC1_DATA, PIC_ICW3_CASCADE_MASK);
        Self::settle(bus);
        bus.write_u8(PIC2_DATA, PIC_ICW3_CASCADE_ID);
        Self::settle(bus);

        // ICW4: 8086 mode.
        bus.write_u8(PIC1_DATA, PIC_ICW4_8086);
        Self::settle(bus);
        bus.write_u8(PIC2_DATA, PIC_ICW4_8086);
        Self::settle(bus);

        let (primary, secondary) = Self::compute_masks(unmasked_lines);
        self.primary_mask = primary;
        self.secondary_mask = secondary;
        bus.write_u8(PIC1_DATA, self.primary_mask);
        bus.write_u8(PIC2_DATA, self.secondary_mask);

        self.remapped = true;
        klog_debug!(
            "PIC: remapped to {}-{}, masks {:#04x}/{:#04x}",
            IRQ_BASE_VECTOR,
            IRQ_BASE_VECTOR as usize + IRQ_LINES - 1,
            self.primary_mask,
            self.secondary_mask
        );
    }

    /// Open one line. Opening a secondary line also opens the cascade.
    pub fn unmask_line<B: PortBus>(&mut self, bus: &mut B, line: u8) {
        if (line as usize) >= IRQ_LINES {
            return;
        }
        if line < 8 {
            self.primary_mask &= !(1 << line);
            bus.write_u8(PIC1_DATA, self.primary_mask);
        } else {
            self.secondary_mask &= !(1 << (line - 8));
            bus.write_u8(PIC2_DATA, self.secondary_mask);
            if self.primary_mask & (1 << PIC_CASCADE_LINE) != 0 {
                self.primary_mask &= !(1 << PIC_CASCADE_LINE);
                bus.write_u8(PIC1_DATA, self.primary_mask);
            }
        }
    }

    /// Close one line. The cascade line stays open; closing it would cut
    /// off every secondary line at once.
    pub fn mask_line<B: PortBus>(&mut self, bus: &mut B, line: u8) {
        if (line as usize) >= IRQ_LINES || line == PIC_CASCADE_LINE {
            return;
        }
        if line < 8 {
            self.primary_mask |= 1 << line;
            bus.write_u8(PIC1_DATA, self.primary_mask);
        } else {
            self.secondary_mask |= 1 << (line - 8);
            bus.write_u8(PIC2_DATA, self.secondary_mask);
        }
    }

    /// Acknowledge a delivered hardware interrupt.
    ///
    /// Secondary first when it was involved (vectors 40-47), then the
    /// primary, which always participates in delivery. Vectors outside the
    /// hardware window need no acknowledgment.
    pub fn end_of_interrupt<B: PortBus>(&mut self, bus: &mut B, vector: u8) {
        if line_for_vector(vector).is_none() {
            return;
        }
        if vector >= IRQ_SECONDARY_BASE_VECTOR {
            bus.write_u8(PIC2_COMMAND, PIC_EOI);
        }
        bus.write_u8(PIC1_COMMAND, PIC_EOI);
    }

    #[inline]
    fn settle<B: PortBus>(bus: &mut B) {
        bus.write_u8(DELAY_PORT, 0);
    }
}

impl Default for CascadedPics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ternos_hal::io::RecordingPortBus;

    fn data_writes(bus: &RecordingPortBus, port: u16) -> ([u8; 8], usize) {
        let mut out = [0u8; 8];
        let mut n = 0;
        for value in bus.writes_to(port) {
            out[n] = value;
            n += 1;
        }
        (out, n)
    }

    #[test]
    fn remap_sends_the_icw_sequence_in_order() {
        let mut pics = CascadedPics::new();
        let mut bus = RecordingPortBus::new();
        pics.remap(&mut bus, 0);

        let (primary_cmd, n) = data_writes(&bus, PIC1_COMMAND);
        assert_eq!(&primary_cmd[..n], &[PIC_ICW1_INIT_ICW4]);
        let (secondary_cmd, n) = data_writes(&bus, PIC2_COMMAND);
        assert_eq!(&secondary_cmd[..n], &[PIC_ICW1_INIT_ICW4]);

        // Vector rebase to 32 / 40, cascade on line 2, 8086 mode, then the
        // all-masked initial state.
        let (primary, n) = data_writes(&bus, PIC1_DATA);
        assert_eq!(&primary[..n], &[0x20, 0x04, 0x01, 0xFF]);
        let (secondary, n) = data_writes(&bus, PIC2_DATA);
        assert_eq!(&secondary[..n], &[0x28, 0x02, 0x01, 0xFF]);

        assert!(pics.is_remapped());
    }

    #[test]
    fn initial_mask_reflects_registered_lines() {
        let mut pics = CascadedPics::new();
        let mut bus = RecordingPortBus::new();
        // Lines 1 (keyboard) and 12 (secondary) registered.
        pics.remap(&mut bus, (1 << 1) | (1 << 12));

        // Cascade line 2 opens because a secondary line is open.
        let (primary, n) = data_writes(&bus, PIC1_DATA);
        assert_eq!(primary[n - 1], !((1 << 1) | (1 << 2)));
        let (secondary, n) = data_writes(&bus, PIC2_DATA);
        assert_eq!(secondary[n - 1], !(1u8 << 4));

        assert!(pics.line_unmasked(1));
        assert!(pics.line_unmasked(12));
        assert!(!pics.line_unmasked(3));
    }

    #[test]
    fn unmasking_a_secondary_line_opens_the_cascade() {
        let mut pics = CascadedPics::new();
        let mut bus = RecordingPortBus::new();
        pics.remap(&mut bus, 0);
        bus.clear();

        pics.unmask_line(&mut bus, 8);
        assert!(pics.line_unmasked(8));
        assert!(pics.line_unmasked(PIC_CASCADE_LINE));

        let (secondary, n) = data_writes(&bus, PIC2_DATA);
        assert_eq!(secondary[n - 1], 0xFE);
        let (primary, n) = data_writes(&bus, PIC1_DATA);
        assert_eq!(primary[n - 1], !(1u8 << PIC_CASCADE_LINE));
    }

    #[test]
    fn eoi_targets_only_the_involved_controllers() {
        let mut pics = CascadedPics::new();
        let mut bus = RecordingPortBus::new();

        // Primary-only vector (keyboard, line 1).
        pics.end_of_interrupt(&mut bus, 33);
        assert!(bus.writes_to(PIC2_COMMAND).next().is_none());
        assert!(bus.writes_to(PIC1_COMMAND).eq([PIC_EOI]));

        // Secondary vector: secondary first, then primary.
        bus.clear();
        pics.end_of_interrupt(&mut bus, 44);
        assert_eq!(bus.writes(), &[(PIC2_COMMAND, PIC_EOI), (PIC1_COMMAND, PIC_EOI)]);

        // Outside the hardware window: nothing.
        bus.clear();
        pics.end_of_interrupt(&mut bus, 14);
        assert!(bus.writes().is_empty());
    }

    #[test]
    fn vector_line_mapping_round_trips() {
        assert_eq!(vector_for_line(0), 32);
        assert_eq!(vector_for_line(15), 47);
        assert_eq!(line_for_vector(33), Some(1));
        assert_eq!(line_for_vector(47), Some(15));
        assert_eq!(line_for_vector(31), None);
        assert_eq!(line_for_vector(48), None);
    }
}
