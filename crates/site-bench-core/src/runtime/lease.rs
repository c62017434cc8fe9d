// crates/site-bench-core/src/runtime/lease.rs
// ============================================================================
// Module: Site Bench Run Lease
// Description: Run-level mutual exclusion and cooperative cancellation.
// Purpose: Keep at most one benchmark in flight and let callers stop it.
// Dependencies: std::sync
// ============================================================================

//! ## Overview
//! [`RunLock`] is a non-blocking lease: [`RunLock::try_acquire`] either hands
//! out a [`RunGuard`] or reports that a run is already active. The guard
//! releases the lease on drop, including on early returns. [`CancelFlag`] is
//! checked by the orchestrator between generator phases only.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::LazyLock;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

// ============================================================================
// SECTION: Run Lock
// ============================================================================

/// Lease shared by everything in this process that can start a run.
static PROCESS_RUN_LOCK: LazyLock<RunLock> = LazyLock::new(RunLock::new);

/// Non-blocking run-level lock.
#[derive(Debug, Clone, Default)]
pub struct RunLock {
    /// Set while a guard is alive.
    held: Arc<AtomicBool>,
}

impl RunLock {
    /// Creates an independent, unheld lock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the process-wide lock.
    #[must_use]
    pub fn process() -> Self {
        PROCESS_RUN_LOCK.clone()
    }

    /// Acquires the lease, or returns `None` when it is already held.
    #[must_use]
    pub fn try_acquire(&self) -> Option<RunGuard> {
        self.held
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunGuard {
                held: Arc::clone(&self.held),
            })
    }

    /// Returns true while a guard is alive.
    #[must_use]
    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }
}

/// Proof of holding the run lease; releases it on drop.
#[derive(Debug)]
pub struct RunGuard {
    /// Flag shared with the issuing lock.
    held: Arc<AtomicBool>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.held.store(false, Ordering::Release);
    }
}

// ============================================================================
// SECTION: Cancellation
// ============================================================================

/// Shared cooperative cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    /// Set once cancellation is requested.
    cancelled: Arc<AtomicBool>,
}

impl CancelFlag {
    /// Creates an unset flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Clears a pending cancellation request.
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::Release);
    }

    /// Returns true once cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_until_guard_drops() {
        let lock = RunLock::new();
        let guard = lock.try_acquire();
        assert!(guard.is_some());
        assert!(lock.is_held());
        assert!(lock.try_acquire().is_none());
        drop(guard);
        assert!(!lock.is_held());
        assert!(lock.try_acquire().is_some());
    }

    #[test]
    fn clones_share_the_lease() {
        let lock = RunLock::new();
        let other = lock.clone();
        let _guard = lock.try_acquire();
        assert!(other.try_acquire().is_none());
    }

    #[test]
    fn cancel_is_visible_through_clones() {
        let flag = CancelFlag::new();
        let observer = flag.clone();
        assert!(!observer.is_cancelled());
        flag.cancel();
        assert!(observer.is_cancelled());
        observer.reset();
        assert!(!flag.is_cancelled());
    }
}
