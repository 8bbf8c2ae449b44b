//! Global Descriptor Table (GDT) layouts.
//!
//! This module provides type-safe segment selectors and the 8-byte segment
//! descriptor record the processor reads from the GDT. The flat-memory model
//! uses a fixed six-entry table; the literals for those entries live here so
//! the privileged build/load code contains no magic numbers.

/// x86_64 segment selector.
///
/// Layout (16 bits):
/// - Bits 0-1: Requested Privilege Level (RPL)
/// - Bit 2: Table Indicator (0 = GDT, 1 = LDT)
/// - Bits 3-15: Descriptor index
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct SegmentSelector(pub u16);

impl SegmentSelector {
    // =========================================================================
    // Standard Selectors
    // =========================================================================

    /// Null selector (index 0, GDT, RPL 0).
    pub const NULL: Self = Self(0);

    /// Kernel code segment (GDT index 1, RPL 0) = 0x08.
    pub const KERNEL_CODE: Self = Self::new(1, false, 0);

    /// Kernel data segment (GDT index 2, RPL 0) = 0x10.
    pub const KERNEL_DATA: Self = Self::new(2, false, 0);

    /// User code segment (GDT index 3, RPL 3) = 0x1B.
    pub const USER_CODE: Self = Self::new(3, false, 3);

    /// User data segment (GDT index 4, RPL 3) = 0x23.
    pub const USER_DATA: Self = Self::new(4, false, 3);

    /// Task-state segment slot (GDT index 5, RPL 0) = 0x28.
    pub const TSS: Self = Self::new(5, false, 0);

    // =========================================================================
    // Constructor and Accessors
    // =========================================================================

    /// Create a new segment selector.
    ///
    /// # Arguments
    /// * `index` - Descriptor table index (0-8191)
    /// * `ldt` - Use LDT instead of GDT
    /// * `rpl` - Requested privilege level (0-3)
    #[inline]
    pub const fn new(index: u16, ldt: bool, rpl: u8) -> Self {
        let ti = if ldt { 1 << 2 } else { 0 };
        Self((index << 3) | ti | (rpl as u16 & 0x3))
    }

    /// Get the descriptor table index.
    #[inline]
    pub const fn index(self) -> u16 {
        self.0 >> 3
    }

    /// Check if this selector references the LDT.
    #[inline]
    pub const fn is_ldt(self) -> bool {
        self.0 & (1 << 2) != 0
    }

    /// Get the requested privilege level (0-3).
    #[inline]
    pub const fn rpl(self) -> u8 {
        (self.0 & 0x3) as u8
    }

    /// Get the raw selector value for loading into a segment register.
    #[inline]
    pub const fn bits(self) -> u16 {
        self.0
    }
}

// =========================================================================
// Descriptor Access Byte Fields
// =========================================================================

/// Present bit in the access byte (bit 7).
pub const GDT_ACCESS_PRESENT: u8 = 1 << 7;

/// DPL = 0 (Ring 0 / Kernel) in the access byte (bits 5-6).
pub const GDT_ACCESS_DPL_KERNEL: u8 = 0 << 5;

/// DPL = 3 (Ring 3 / User) in the access byte (bits 5-6).
pub const GDT_ACCESS_DPL_USER: u8 = 3 << 5;

/// Descriptor-type bit (bit 4) - 1 for code/data segment, 0 for system.
pub const GDT_ACCESS_SEGMENT: u8 = 1 << 4;

/// Code segment type: executable, readable, non-conforming.
pub const GDT_ACCESS_CODE_TYPE: u8 = 0b1010;

/// Data segment type: writable, expand-up.
pub const GDT_ACCESS_DATA_TYPE: u8 = 0b0010;

/// System descriptor type: 64-bit available TSS.
pub const GDT_ACCESS_TSS_TYPE: u8 = 0b1001;

// =========================================================================
// Descriptor Flags (bits 52-55 of the raw descriptor)
// =========================================================================

/// Granularity flag (G=1) - limit counted in 4 KiB units.
pub const GDT_FLAG_GRANULARITY: u8 = 1 << 3;

/// Long mode flag (L=1) - 64-bit code segment.
pub const GDT_FLAG_LONG_MODE: u8 = 1 << 1;

/// Flags for 64-bit code segments: G=1, D/B=0, L=1, AVL=0 = 0xA.
pub const GDT_FLAGS_CODE_64: u8 = GDT_FLAG_GRANULARITY | GDT_FLAG_LONG_MODE;

/// Flags for data segments: G=1, everything else clear = 0x8.
pub const GDT_FLAGS_DATA: u8 = GDT_FLAG_GRANULARITY;

/// Maximum 20-bit segment limit (with G=1 this spans the full 4 GiB).
pub const GDT_LIMIT_MAX: u32 = 0x000F_FFFF;

/// Number of entries in the descriptor table.
pub const GDT_ENTRIES: usize = 6;

/// Table slot indices, in the order the flat-memory model fixes them.
pub const GDT_NULL_INDEX: usize = 0;
pub const GDT_KERNEL_CODE_INDEX: usize = 1;
pub const GDT_KERNEL_DATA_INDEX: usize = 2;
pub const GDT_USER_CODE_INDEX: usize = 3;
pub const GDT_USER_DATA_INDEX: usize = 4;
pub const GDT_TSS_INDEX: usize = 5;

// =========================================================================
// Segment Descriptor Record
// =========================================================================

/// Decoded form of one 8-byte segment descriptor.
///
/// Raw layout, low bit to high:
/// - limit\[0:16) - low 16 bits of the limit
/// - base\[0:16)  - low 16 bits of the base
/// - base\[16:24) - middle 8 bits of the base
/// - access byte  - present, DPL, descriptor type, code/data type bits
/// - limit\[16:20) then flags (G, D/B, L, AVL) in the same byte
/// - base\[24:32) - high 8 bits of the base
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SegmentDescriptor {
    /// 32-bit segment base address.
    pub base: u32,
    /// 20-bit segment limit (only the low 20 bits are encodable).
    pub limit: u32,
    /// Access byte.
    pub access: u8,
    /// Flags nibble (only the low 4 bits are encodable).
    pub flags: u8,
}

impl SegmentDescriptor {
    /// The all-zero null descriptor that must occupy table index 0.
    pub const NULL: Self = Self {
        base: 0,
        limit: 0,
        access: 0,
        flags: 0,
    };

    /// Flat 64-bit kernel code segment.
    pub const KERNEL_CODE: Self = Self::flat(
        GDT_ACCESS_PRESENT | GDT_ACCESS_DPL_KERNEL | GDT_ACCESS_SEGMENT | GDT_ACCESS_CODE_TYPE,
        GDT_FLAGS_CODE_64,
    );

    /// Flat kernel data segment.
    pub const KERNEL_DATA: Self = Self::flat(
        GDT_ACCESS_PRESENT | GDT_ACCESS_DPL_KERNEL | GDT_ACCESS_SEGMENT | GDT_ACCESS_DATA_TYPE,
        GDT_FLAGS_DATA,
    );

    /// Flat 64-bit user code segment.
    pub const USER_CODE: Self = Self::flat(
        GDT_ACCESS_PRESENT | GDT_ACCESS_DPL_USER | GDT_ACCESS_SEGMENT | GDT_ACCESS_CODE_TYPE,
        GDT_FLAGS_CODE_64,
    );

    /// Flat user data segment.
    pub const USER_DATA: Self = Self::flat(
        GDT_ACCESS_PRESENT | GDT_ACCESS_DPL_USER | GDT_ACCESS_SEGMENT | GDT_ACCESS_DATA_TYPE,
        GDT_FLAGS_DATA,
    );

    /// Task-state slot. The slot is reserved but never loaded; base and
    /// limit stay zero until a TSS exists.
    pub const TSS_SLOT: Self = Self {
        base: 0,
        limit: 0,
        access: GDT_ACCESS_PRESENT | GDT_ACCESS_TSS_TYPE,
        flags: 0,
    };

    /// A flat (base 0, maximum limit) descriptor with the given access and flags.
    #[inline]
    pub const fn flat(access: u8, flags: u8) -> Self {
        Self {
            base: 0,
            limit: GDT_LIMIT_MAX,
            access,
            flags,
        }
    }

    /// Pack into the 8-byte form the processor reads.
    pub const fn encode(self) -> u64 {
        let limit = self.limit & GDT_LIMIT_MAX;
        let granularity = ((limit >> 16) & 0x0F) as u8 | (self.flags << 4);

        (limit & 0xFFFF) as u64
            | ((self.base & 0xFFFF) as u64) << 16
            | (((self.base >> 16) & 0xFF) as u64) << 32
            | (self.access as u64) << 40
            | (granularity as u64) << 48
            | (((self.base >> 24) & 0xFF) as u64) << 56
    }

    /// Unpack an 8-byte descriptor back into its fields.
    pub const fn decode(raw: u64) -> Self {
        let granularity = ((raw >> 48) & 0xFF) as u8;
        Self {
            base: ((raw >> 16) & 0xFFFF) as u32
                | (((raw >> 32) & 0xFF) as u32) << 16
                | (((raw >> 56) & 0xFF) as u32) << 24,
            limit: (raw & 0xFFFF) as u32 | ((granularity & 0x0F) as u32) << 16,
            access: ((raw >> 40) & 0xFF) as u8,
            flags: granularity >> 4,
        }
    }
}
