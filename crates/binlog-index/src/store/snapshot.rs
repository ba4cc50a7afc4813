//! Scoped snapshot guard
//!
//! Owns a store snapshot for exactly one read operation. The snapshot goes
//! away on [`ScopedSnapshot::release`] or, on any other exit path including
//! unwinding, when the guard is dropped.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::trace;

use super::OrderedStore;
use crate::error::IndexError;

static NEXT_SNAPSHOT_ID: AtomicU64 = AtomicU64::new(1);

/// A snapshot bound to the scope that acquired it
pub struct ScopedSnapshot<S: OrderedStore> {
    id: u64,
    snapshot: S::Snapshot,
}

impl<S: OrderedStore> ScopedSnapshot<S> {
    /// Take a snapshot from `store`
    pub fn acquire(store: &S) -> Result<Self, IndexError> {
        let snapshot = store.snapshot()?;
        let id = NEXT_SNAPSHOT_ID.fetch_add(1, Ordering::Relaxed);
        trace!(snapshot_id = id, "Acquired snapshot");
        Ok(Self { id, snapshot })
    }

    /// The read view
    pub fn snapshot(&self) -> &S::Snapshot {
        &self.snapshot
    }

    /// Release the snapshot now
    pub fn release(self) {
        drop(self);
    }
}

impl<S: OrderedStore> Drop for ScopedSnapshot<S> {
    fn drop(&mut self) {
        trace!(snapshot_id = self.id, "Released snapshot");
    }
}
