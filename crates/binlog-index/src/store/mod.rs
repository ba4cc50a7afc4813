//! Ordered key-value stores
//!
//! The index only needs a small ordered-store surface: point reads and
//! writes, plus snapshot reads that can seek and scan in key order. Both
//! backends order keys with [`GtidOrdering`](crate::ordering::GtidOrdering).

use std::ops::ControlFlow;

use crate::error::IndexError;

pub mod memory;
pub mod redb_store;
mod snapshot;

pub use memory::InMemoryStore;
pub use redb_store::{RedbStore, RedbStoreConfig};
pub use snapshot::ScopedSnapshot;

/// A stored (key, value) pair
pub type Entry = (Vec<u8>, Vec<u8>);

/// Direction of a snapshot scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOrder {
    Ascending,
    Descending,
}

/// Point-in-time read view of a store
pub trait StoreSnapshot {
    /// First entry whose key is `>= key`
    fn seek(&self, key: &[u8]) -> Result<Option<Entry>, IndexError>;

    /// Visit entries with `start <= key <= end` in `order`
    ///
    /// The visitor returns `ControlFlow::Break` to stop early.
    fn scan(
        &self,
        start: &[u8],
        end: &[u8],
        order: ScanOrder,
        visit: &mut dyn FnMut(&[u8], &[u8]) -> ControlFlow<()>,
    ) -> Result<(), IndexError>;
}

/// Ordered key-value store consumed by the event index
///
/// Implementations must be safe for concurrent readers and writers. Every
/// write is applied atomically and is visible to reads that start after it.
pub trait OrderedStore: Send + Sync {
    /// Snapshot type handed out by [`snapshot`](Self::snapshot)
    type Snapshot: StoreSnapshot;

    /// Insert or overwrite a key
    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), IndexError>;

    /// Read a key
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, IndexError>;

    /// Remove a key; removing an absent key succeeds
    fn delete(&self, key: &[u8]) -> Result<(), IndexError>;

    /// Take a snapshot; it is released when dropped
    fn snapshot(&self) -> Result<Self::Snapshot, IndexError>;

    /// Run `f` against a snapshot that is released before this returns
    fn with_snapshot<T, F>(&self, f: F) -> Result<T, IndexError>
    where
        Self: Sized,
        F: FnOnce(&Self::Snapshot) -> Result<T, IndexError>,
    {
        let scoped = ScopedSnapshot::acquire(self)?;
        let result = f(scoped.snapshot());
        scoped.release();
        result
    }
}
