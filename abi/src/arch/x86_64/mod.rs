//! x86_64 architecture definitions.
//!
//! This module provides type-safe definitions for the x86_64 hardware
//! structures the boot layer builds: segment descriptors, trap gates,
//! page-table entries, and the I/O port map of the legacy devices.
//!
//! # Design Philosophy
//!
//! Hardware-read records are modeled as explicit field structs with a
//! dedicated encode/decode pair rather than ad-hoc shifting at the use
//! site. Raw integer constants are wrapped in newtypes to prevent misuse:
//! - `SegmentSelector(u16)` for descriptor-table references
//! - `Port(u16)` for I/O port addresses
//! - `PageFlags` bitflags for page-table entry bits
//!
//! This keeps the bit layouts auditable and testable on any host.

pub mod gdt;
pub mod idt;
pub mod paging;
pub mod ports;

// Re-export commonly used types at module level
pub use gdt::{SegmentDescriptor, SegmentSelector};
pub use idt::{GateDescriptor, IRQ_BASE_VECTOR, RawGateDescriptor};
pub use paging::{PageFlags, PageTableEntry};
pub use ports::Port;
