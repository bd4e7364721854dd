//! Suspension gate for the event-driven synchronizer.
//!
//! Bulk administrative operations grant roles in rapid succession; letting
//! each grant trigger a full membership synchronization would storm the
//! platform's rate limits. Bulk operations therefore acquire a suspension
//! before starting, and the synchronizer no-ops while any suspension is
//! alive. The count is reference-counted so overlapping bulk operations
//! compose instead of racing on a shared boolean.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Process-wide gate the synchronizer consults before doing any work.
#[derive(Default)]
pub struct SyncGate {
    suspensions: AtomicUsize,
}

impl SyncGate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// True while at least one [`SyncSuspension`] is alive.
    pub fn is_suspended(&self) -> bool {
        self.suspensions.load(Ordering::SeqCst) > 0
    }

    /// Suspends event-driven synchronization until the returned guard drops.
    pub fn suspend(self: &Arc<Self>) -> SyncSuspension {
        self.suspensions.fetch_add(1, Ordering::SeqCst);
        SyncSuspension {
            gate: Arc::clone(self),
        }
    }
}

/// RAII guard holding one suspension on the gate.
pub struct SyncSuspension {
    gate: Arc<SyncGate>,
}

impl Drop for SyncSuspension {
    fn drop(&mut self) {
        self.gate.suspensions.fetch_sub(1, Ordering::SeqCst);
    }
}
