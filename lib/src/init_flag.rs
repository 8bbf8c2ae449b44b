//! Atomic initialization and state flags for kernel subsystems.
//!
//! `InitFlag` captures the common "has this been brought up yet" pattern;
//! `StateFlag` tracks conditions that can toggle (panic in progress, test
//! mode). Both are thin `AtomicBool` wrappers with the orderings spelled
//! out once instead of at every call site.

use core::sync::atomic::{AtomicBool, Ordering};

/// Atomic flag for tracking initialization state.
///
/// Monotonic: once set it stays set (barring an explicit `reset`, which
/// exists for tests and re-initializable subsystems only).
#[repr(transparent)]
pub struct InitFlag {
    flag: AtomicBool,
}

impl InitFlag {
    /// Create a new unset flag.
    #[inline]
    pub const fn new() -> Self {
        Self {
            flag: AtomicBool::new(false),
        }
    }

    /// Atomically attempt to initialize.
    ///
    /// Returns `true` if this call performed the initialization (flag was
    /// previously unset), `false` if someone already did.
    ///
    /// Uses `SeqCst` so the transition is visible everywhere.
    #[inline]
    pub fn init_once(&self) -> bool {
        !self.flag.swap(true, Ordering::SeqCst)
    }

    /// Check if the flag is set.
    ///
    /// `Acquire`: side effects published before `mark_set`/`init_once`
    /// are visible after this returns `true`.
    #[inline]
    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Check if the flag is set without ordering guarantees.
    ///
    /// For logging guards and other fast paths that don't depend on the
    /// initialization's side effects.
    #[inline]
    pub fn is_set_relaxed(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Explicitly mark initialization complete.
    #[inline]
    pub fn mark_set(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Reset to unset.
    #[inline]
    pub fn reset(&self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl Default for InitFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// Atomic flag for conditions that can toggle.
#[repr(transparent)]
pub struct StateFlag {
    flag: AtomicBool,
}

impl StateFlag {
    /// Create a new inactive flag.
    #[inline]
    pub const fn new() -> Self {
        Self {
            flag: AtomicBool::new(false),
        }
    }

    /// Atomically try to enter this state.
    ///
    /// Returns `true` if this call entered the state (was previously
    /// inactive), `false` if already active. The panic path uses this to
    /// keep a recursive panic from re-reporting.
    #[inline]
    pub fn enter(&self) -> bool {
        !self.flag.swap(true, Ordering::SeqCst)
    }

    /// Check if currently in this state.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Leave this state.
    #[inline]
    pub fn leave(&self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl Default for StateFlag {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_once_fires_exactly_once() {
        let flag = InitFlag::new();
        assert!(flag.init_once());
        assert!(!flag.init_once());
        assert!(flag.is_set());
    }

    #[test]
    fn state_flag_reenters_after_leave() {
        let flag = StateFlag::new();
        assert!(flag.enter());
        assert!(!flag.enter());
        flag.leave();
        assert!(flag.enter());
    }
}
