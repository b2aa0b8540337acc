//! Cooperative interruption of a running migration.
//!
//! An [`Interrupt`] is shared by everything taking part in one operation.
//! Each call to [`Interrupt::signal`] records one interrupt (typically one
//! Ctrl-C). In graceful mode the first signal lets the in-flight file finish
//! and stops dispatch of the next; the second stops waiting immediately. In
//! immediate mode the first signal does both.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// How the first interrupt is handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterruptMode {
    /// Finish the current file, then stop. A second interrupt forces.
    #[default]
    Graceful,
    /// Stop immediately on the first interrupt.
    Immediate,
}

/// Shared interruption state for one or more operations.
#[derive(Debug, Clone)]
pub struct Interrupt {
    mode: InterruptMode,
    signals: Arc<AtomicUsize>,
    stop: CancellationToken,
    force: CancellationToken,
}

impl Interrupt {
    pub fn new(mode: InterruptMode) -> Self {
        Self {
            mode,
            signals: Arc::new(AtomicUsize::new(0)),
            stop: CancellationToken::new(),
            force: CancellationToken::new(),
        }
    }

    /// Record one interrupt and return how many have been received.
    pub fn signal(&self) -> usize {
        let count = self.signals.fetch_add(1, Ordering::SeqCst) + 1;
        self.stop.cancel();
        if self.mode == InterruptMode::Immediate || count > 1 {
            self.force.cancel();
        }
        count
    }

    /// Number of interrupts received so far.
    pub fn count(&self) -> usize {
        self.signals.load(Ordering::SeqCst)
    }

    /// No further files may be dispatched.
    pub fn is_requested(&self) -> bool {
        self.stop.is_cancelled()
    }

    /// Waiting on the in-flight file must stop now.
    pub fn is_forced(&self) -> bool {
        self.force.is_cancelled()
    }

    /// Resolves once a stop has been requested.
    pub async fn requested(&self) {
        self.stop.cancelled().await
    }

    /// Resolves once a forced stop has been requested.
    pub async fn forced(&self) {
        self.force.cancelled().await
    }
}

impl Default for Interrupt {
    fn default() -> Self {
        Self::new(InterruptMode::Graceful)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graceful_needs_two_signals_to_force() {
        let interrupt = Interrupt::new(InterruptMode::Graceful);
        assert!(!interrupt.is_requested());

        assert_eq!(interrupt.signal(), 1);
        assert!(interrupt.is_requested());
        assert!(!interrupt.is_forced());

        assert_eq!(interrupt.signal(), 2);
        assert!(interrupt.is_forced());
    }

    #[test]
    fn test_immediate_forces_on_first_signal() {
        let interrupt = Interrupt::new(InterruptMode::Immediate);
        interrupt.signal();
        assert!(interrupt.is_requested());
        assert!(interrupt.is_forced());
        assert_eq!(interrupt.count(), 1);
    }

    #[test]
    fn test_clones_share_state() {
        let interrupt = Interrupt::default();
        let other = interrupt.clone();
        other.signal();
        assert!(interrupt.is_requested());
    }

    #[tokio::test]
    async fn test_requested_future_resolves() {
        let interrupt = Interrupt::default();
        let waiter = interrupt.clone();
        let handle = tokio::spawn(async move { waiter.requested().await });
        interrupt.signal();
        handle.await.unwrap();
    }
}
