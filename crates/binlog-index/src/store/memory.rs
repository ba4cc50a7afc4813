//! In-memory ordered store
//!
//! This module provides an in-memory [`OrderedStore`], suitable for testing
//! and simulation environments. Snapshots share the map through an `Arc`;
//! writers copy it on write only while a snapshot still holds the old one.

use std::collections::BTreeMap;
use std::ops::{Bound, ControlFlow};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use tracing::trace;

use super::{Entry, OrderedStore, ScanOrder, StoreSnapshot};
use crate::error::IndexError;
use crate::ordering::{GtidOrdering, OrderedKey};

type Map = BTreeMap<OrderedKey, Vec<u8>>;

/// In-memory implementation of OrderedStore
#[derive(Debug, Default)]
pub struct InMemoryStore {
    map: RwLock<Arc<Map>>,
    /// Snapshots handed out and not yet dropped
    live_snapshots: Arc<AtomicUsize>,
}

impl InMemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys, tombstones included
    pub fn len(&self) -> usize {
        self.read().map(|m| m.len()).unwrap_or(0)
    }

    /// Check if the store holds no keys
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of snapshots currently alive
    pub fn live_snapshots(&self) -> usize {
        self.live_snapshots.load(Ordering::SeqCst)
    }

    fn read(&self) -> Result<Arc<Map>, IndexError> {
        self.map
            .read()
            .map(|guard| Arc::clone(&*guard))
            .map_err(|_| IndexError::store("in-memory store lock poisoned"))
    }

    fn write<T>(&self, f: impl FnOnce(&mut Map) -> T) -> Result<T, IndexError> {
        let mut guard = self
            .map
            .write()
            .map_err(|_| IndexError::store("in-memory store lock poisoned"))?;
        Ok(f(Arc::make_mut(&mut *guard)))
    }
}

impl OrderedStore for InMemoryStore {
    type Snapshot = InMemorySnapshot;

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), IndexError> {
        self.write(|map| {
            map.insert(OrderedKey::new(key), value.to_vec());
        })
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, IndexError> {
        Ok(self.read()?.get(&OrderedKey::new(key)).cloned())
    }

    fn delete(&self, key: &[u8]) -> Result<(), IndexError> {
        self.write(|map| {
            map.remove(&OrderedKey::new(key));
        })
    }

    fn snapshot(&self) -> Result<InMemorySnapshot, IndexError> {
        let map = self.read()?;
        let live = self.live_snapshots.fetch_add(1, Ordering::SeqCst) + 1;
        trace!(live, "In-memory snapshot taken");
        Ok(InMemorySnapshot {
            map,
            live_snapshots: Arc::clone(&self.live_snapshots),
        })
    }
}

/// Frozen view of an [`InMemoryStore`]
#[derive(Debug)]
pub struct InMemorySnapshot {
    map: Arc<Map>,
    live_snapshots: Arc<AtomicUsize>,
}

impl StoreSnapshot for InMemorySnapshot {
    fn seek(&self, key: &[u8]) -> Result<Option<Entry>, IndexError> {
        Ok(self
            .map
            .range((Bound::Included(OrderedKey::new(key)), Bound::Unbounded))
            .next()
            .map(|(k, v)| (k.0.clone(), v.clone())))
    }

    fn scan(
        &self,
        start: &[u8],
        end: &[u8],
        order: ScanOrder,
        visit: &mut dyn FnMut(&[u8], &[u8]) -> ControlFlow<()>,
    ) -> Result<(), IndexError> {
        // BTreeMap::range panics on reversed bounds
        if GtidOrdering::global().compare(start, end).is_gt() {
            return Ok(());
        }

        let range = self
            .map
            .range(OrderedKey::new(start)..=OrderedKey::new(end));
        let entries: Box<dyn Iterator<Item = (&OrderedKey, &Vec<u8>)>> = match order {
            ScanOrder::Ascending => Box::new(range),
            ScanOrder::Descending => Box::new(range.rev()),
        };

        for (k, v) in entries {
            if visit(k.as_bytes(), v).is_break() {
                break;
            }
        }
        Ok(())
    }
}

impl Drop for InMemorySnapshot {
    fn drop(&mut self) {
        self.live_snapshots.fetch_sub(1, Ordering::SeqCst);
    }
}
