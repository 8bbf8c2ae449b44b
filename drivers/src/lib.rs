//! TernOS trap delivery: the legacy interrupt controller and the handler
//! registry consulted by the generic dispatch routine.
//!
//! Device drivers layered above consume exactly two entry points from here:
//! [`trap::register`] and [`trap::unmask`]. They never construct table
//! entries themselves.

#![cfg_attr(not(test), no_std)]

#[cfg(target_arch = "x86_64")]
pub mod pic;
#[cfg(target_arch = "x86_64")]
pub mod trap;
