//! Handler registry and the generic trap dispatch routine.
//!
//! Every gate in the loaded table funnels into [`trap_dispatch`] with the
//! saved context tagged by vector. The registry maps vectors to kernel
//! callbacks; a vector without one falls to the default diagnostic handler,
//! which reports the context and parks the core - with no process model
//! there is nothing to recover to.
//!
//! Lifecycle is one-directional: `Unconfigured` (table zeroed, controller
//! unprogrammed) -> `Armed` (table loaded, controller remapped, traps still
//! masked) -> `Live` (traps unmasked). Registry writes are scoped critical
//! sections via `IrqMutex`, so registration stays safe after going live.

use core::sync::atomic::{AtomicU8, Ordering};

use ternos_abi::arch::x86_64::idt::{IDT_ENTRIES, IRQ_LINES, exception_name};
use ternos_hal::io::{IoPortBus, PortBus};
use ternos_lib::{IrqMutex, TrapFrame, kdiag_dump_trap_frame, klog_error, klog_warn};

use crate::pic::{CascadedPics, line_for_vector};

/// One registered trap callback.
///
/// Implementations must tolerate running with traps unmasked: the gates do
/// not mask other lines, so anything they touch that is shared with normal
/// context needs its own discipline.
pub trait TrapHandler: Sync {
    fn handle(&self, frame: &mut TrapFrame);
}

/// Vector-indexed callback table. Absent entries resolve to the default
/// diagnostic handler in dispatch.
pub struct HandlerRegistry {
    handlers: [Option<&'static dyn TrapHandler>; IDT_ENTRIES],
}

impl HandlerRegistry {
    pub const fn new() -> Self {
        Self {
            handlers: [None; IDT_ENTRIES],
        }
    }

    /// Bind a callback to a vector, replacing any previous binding.
    ///
    /// Unmasking the matching hardware line is the caller's business and
    /// must happen only after this returns; a line must never be open
    /// without a handler behind it.
    pub fn register(&mut self, vector: u8, handler: &'static dyn TrapHandler) {
        self.handlers[vector as usize] = Some(handler);
    }

    pub fn handler(&self, vector: u8) -> Option<&'static dyn TrapHandler> {
        self.handlers[vector as usize]
    }

    /// Bitmap of legacy lines (0-15) that currently have handlers, used to
    /// derive the controller's initial mask.
    pub fn registered_lines(&self) -> u16 {
        let mut lines = 0u16;
        for line in 0..IRQ_LINES as u8 {
            if self.handlers[crate::pic::vector_for_line(line) as usize].is_some() {
                lines |= 1 << line;
            }
        }
        lines
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// What dispatch did with a trap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A registered callback ran (and any needed EOI was sent).
    Handled,
    /// No callback; the default diagnostic handler reported the trap.
    Unhandled,
}

/// Bring-up states of the trap subsystem. Transitions only move forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum TrapLifecycle {
    Unconfigured = 0,
    Armed = 1,
    Live = 2,
}

static LIFECYCLE: AtomicU8 = AtomicU8::new(TrapLifecycle::Unconfigured as u8);

static REGISTRY: IrqMutex<HandlerRegistry> = IrqMutex::new(HandlerRegistry::new());
static PICS: IrqMutex<CascadedPics> = IrqMutex::new(CascadedPics::new());

pub fn lifecycle() -> TrapLifecycle {
    match LIFECYCLE.load(Ordering::Acquire) {
        0 => TrapLifecycle::Unconfigured,
        1 => TrapLifecycle::Armed,
        _ => TrapLifecycle::Live,
    }
}

/// Record that the gate table is built and loaded. Called by the table
/// builder; out-of-order calls are a bring-up defect.
pub fn mark_armed() {
    debug_assert_eq!(lifecycle(), TrapLifecycle::Unconfigured);
    LIFECYCLE.store(TrapLifecycle::Armed as u8, Ordering::Release);
}

/// Unmask traps on the core. Final step of the bring-up order.
pub fn go_live() {
    debug_assert_eq!(lifecycle(), TrapLifecycle::Armed);
    LIFECYCLE.store(TrapLifecycle::Live as u8, Ordering::Release);
    ternos_hal::enable_traps();
}

/// Bind a kernel callback to a vector.
///
/// The write path is a scoped critical section: traps are disabled for the
/// duration of the update and restored on release, even on early return.
pub fn register(vector: u8, handler: &'static dyn TrapHandler) {
    REGISTRY.lock().register(vector, handler);
}

/// Program both controllers: remap to 32-47 and install the initial mask
/// derived from the registry (all lines closed except registered ones).
///
/// Must run after the gate table is armed and before any hardware vector
/// can fire.
pub fn program_controller() {
    debug_assert_ne!(lifecycle(), TrapLifecycle::Unconfigured);
    let lines = REGISTRY.lock().registered_lines();
    PICS.lock().remap(&mut IoPortBus, lines);
}

/// Open a hardware line. Callers must have registered the matching vector
/// first; this is what keeps "never unmask an unhandled line" true.
pub fn unmask(line: u8) {
    PICS.lock().unmask_line(&mut IoPortBus, line);
}

/// Close a hardware line.
pub fn mask(line: u8) {
    PICS.lock().mask_line(&mut IoPortBus, line);
}

/// The generic dispatch routine over explicit state.
///
/// Looks up the vector, invokes the callback with the saved context, and
/// acknowledges the controllers involved after the callback returns -
/// acknowledging earlier would race a re-delivery of the same line.
/// Unhandled traps only report here; the halting policy belongs to the
/// caller, so tests can observe the outcome.
pub fn dispatch_with<B: PortBus>(
    registry: &HandlerRegistry,
    pics: &mut CascadedPics,
    bus: &mut B,
    frame: &mut TrapFrame,
) -> DispatchOutcome {
    let vector = (frame.vector & 0xFF) as u8;
    match registry.handler(vector) {
        Some(handler) => {
            handler.handle(frame);
            if line_for_vector(vector).is_some() {
                pics.end_of_interrupt(bus, vector);
            }
            DispatchOutcome::Handled
        }
        None => {
            report_unhandled(vector, frame);
            DispatchOutcome::Unhandled
        }
    }
}

/// Default diagnostic handler: name the trap and dump the saved context.
fn report_unhandled(vector: u8, frame: &TrapFrame) {
    if (vector as usize) < 32 {
        klog_error!("TRAP: unhandled exception {} ({})", vector, exception_name(vector));
    } else {
        klog_error!("TRAP: unhandled vector {}", vector);
    }
    #[cfg(target_os = "none")]
    if vector == ternos_abi::arch::x86_64::idt::EXCEPTION_PAGE_FAULT {
        let cr2 = ternos_hal::read_system_register(ternos_hal::SystemRegister::Cr2);
        klog_error!("  faulting address: 0x{:016x}", cr2);
    }
    kdiag_dump_trap_frame(frame);
}

/// Entry point the trampoline stubs call with a pointer to the frame they
/// saved on the trap stack.
///
/// # Safety
/// Only the trampolines may call this; `frame` must point at a live,
/// correctly laid out [`TrapFrame`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn trap_dispatch(frame: *mut TrapFrame) {
    let frame = unsafe { &mut *frame };
    let vector = (frame.vector & 0xFF) as u8;

    if lifecycle() == TrapLifecycle::Unconfigured {
        klog_warn!("TRAP: vector {} before initialization", vector);
        return;
    }

    // Snapshot the callback in a brief critical section, then invoke it
    // outside the lock so a handler can take the registry lock itself.
    let handler = REGISTRY.lock().handler(vector);
    match handler {
        Some(handler) => {
            handler.handle(frame);
            if line_for_vector(vector).is_some() {
                PICS.lock().end_of_interrupt(&mut IoPortBus, vector);
            }
        }
        None => {
            report_unhandled(vector, frame);
            // Fatal: no supervisor exists to escalate to.
            ternos_hal::halt_loop();
        }
    }
}
