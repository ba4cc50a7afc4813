//! redb-backed ordered store
//!
//! One table, `event_index`, keyed by [`GtidKey`] so redb orders it with the
//! GTID policy. Each write is its own committed transaction; each snapshot
//! is a read transaction.

use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::Arc;

use redb::{Builder, Database, ReadOnlyTable, ReadTransaction, TableDefinition};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use super::{Entry, OrderedStore, ScanOrder, StoreSnapshot};
use crate::error::IndexError;
use crate::ordering::{GtidKey, GtidOrdering};

// Key: GTID string bytes, Value: encoded record (empty = tombstone)
pub const EVENT_INDEX: TableDefinition<GtidKey, &[u8]> = TableDefinition::new("event_index");

/// Configuration for the redb store
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedbStoreConfig {
    /// Path to the database file
    pub db_path: PathBuf,
    /// Cache size in bytes
    pub cache_size: usize,
}

impl Default for RedbStoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./data/binlog-index.redb"),
            cache_size: 64 * 1024 * 1024, // 64MB
        }
    }
}

/// Durable ordered store on a single redb file
pub struct RedbStore {
    db: Arc<Database>,
    config: RedbStoreConfig,
}

impl RedbStore {
    /// Open or create the database
    #[instrument(skip(config), fields(path = %config.db_path.display()))]
    pub fn open(config: RedbStoreConfig) -> Result<Self, IndexError> {
        let path = config.db_path.clone();
        let open_err = move |reason: String| IndexError::Open {
            path: path.clone(),
            reason,
        };

        // Ensure parent directory exists
        if let Some(parent) = config.db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| open_err(e.to_string()))?;
        }

        let db = Builder::new()
            .set_cache_size(config.cache_size)
            .create(&config.db_path)
            .map_err(|e| open_err(e.to_string()))?;

        let store = Self {
            db: Arc::new(db),
            config,
        };
        store
            .init_tables()
            .map_err(|e| open_err(e.to_string()))?;

        info!(
            ordering = GtidOrdering::global().name(),
            "Opened redb event index"
        );
        Ok(store)
    }

    fn init_tables(&self) -> Result<(), IndexError> {
        let write_txn = self.db.begin_write()?;
        write_txn.open_table(EVENT_INDEX)?;
        write_txn.commit()?;

        debug!("Initialized redb tables");
        Ok(())
    }

    /// Get a reference to the database
    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Get the configuration
    pub fn config(&self) -> &RedbStoreConfig {
        &self.config
    }
}

impl OrderedStore for RedbStore {
    type Snapshot = RedbSnapshot;

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), IndexError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(EVENT_INDEX)?;
            table.insert(key, value)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, IndexError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(EVENT_INDEX)?;
        let value = table.get(key)?.map(|v| v.value().to_vec());
        Ok(value)
    }

    fn delete(&self, key: &[u8]) -> Result<(), IndexError> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(EVENT_INDEX)?;
            table.remove(key)?.is_some()
        };
        write_txn.commit()?;

        if !removed {
            debug!(key = %String::from_utf8_lossy(key), "Delete of absent key");
        }
        Ok(())
    }

    fn snapshot(&self) -> Result<RedbSnapshot, IndexError> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(EVENT_INDEX)?;
        Ok(RedbSnapshot { table, _txn: txn })
    }
}

/// Read transaction pinned for the life of one lookup
pub struct RedbSnapshot {
    table: ReadOnlyTable<GtidKey, &'static [u8]>,
    _txn: ReadTransaction,
}

impl StoreSnapshot for RedbSnapshot {
    fn seek(&self, key: &[u8]) -> Result<Option<Entry>, IndexError> {
        let mut range = self.table.range(key..)?;
        match range.next() {
            Some(entry) => {
                let (k, v) = entry?;
                Ok(Some((k.value().to_vec(), v.value().to_vec())))
            }
            None => Ok(None),
        }
    }

    fn scan(
        &self,
        start: &[u8],
        end: &[u8],
        order: ScanOrder,
        visit: &mut dyn FnMut(&[u8], &[u8]) -> ControlFlow<()>,
    ) -> Result<(), IndexError> {
        if GtidOrdering::global().compare(start, end).is_gt() {
            return Ok(());
        }

        let range = self.table.range(start..=end)?;
        let entries: Box<dyn Iterator<Item = _>> = match order {
            ScanOrder::Ascending => Box::new(range),
            ScanOrder::Descending => Box::new(range.rev()),
        };

        for entry in entries {
            let (k, v) = entry?;
            if visit(k.value(), v.value()).is_break() {
                break;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (RedbStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config = RedbStoreConfig {
            db_path: temp_dir.path().join("test.redb"),
            ..Default::default()
        };
        let store = RedbStore::open(config).unwrap();
        (store, temp_dir)
    }

    fn keys_in(snapshot: &RedbSnapshot, start: &str, end: &str, order: ScanOrder) -> Vec<String> {
        let mut keys = Vec::new();
        snapshot
            .scan(start.as_bytes(), end.as_bytes(), order, &mut |k, _| {
                keys.push(String::from_utf8(k.to_vec()).unwrap());
                ControlFlow::Continue(())
            })
            .unwrap();
        keys
    }

    #[test]
    fn test_put_get_delete() {
        let (store, _temp) = create_test_store();

        store.put(b"A:1", b"one").unwrap();
        assert_eq!(store.get(b"A:1").unwrap(), Some(b"one".to_vec()));

        store.delete(b"A:1").unwrap();
        assert!(store.get(b"A:1").unwrap().is_none());

        // Deleting again is fine
        store.delete(b"A:1").unwrap();
    }

    #[test]
    fn test_table_uses_gtid_order() {
        let (store, _temp) = create_test_store();
        for key in ["A:10", "B:1", "A:9", "A:100"] {
            store.put(key.as_bytes(), b"x").unwrap();
        }

        let snapshot = store.snapshot().unwrap();
        assert_eq!(
            keys_in(&snapshot, "A:0", "Z:0", ScanOrder::Ascending),
            vec!["A:9", "A:10", "A:100", "B:1"]
        );
        assert_eq!(
            keys_in(&snapshot, "A:0", &format!("A:{}", u64::MAX), ScanOrder::Descending),
            vec!["A:100", "A:10", "A:9"]
        );
    }

    #[test]
    fn test_seek_lands_at_or_after() {
        let (store, _temp) = create_test_store();
        for key in ["A:1", "A:3", "A:5"] {
            store.put(key.as_bytes(), key.as_bytes()).unwrap();
        }

        let snapshot = store.snapshot().unwrap();
        let (key, _) = snapshot.seek(b"A:2").unwrap().unwrap();
        assert_eq!(key, b"A:3");
        let (key, _) = snapshot.seek(b"A:3").unwrap().unwrap();
        assert_eq!(key, b"A:3");
        assert!(snapshot.seek(b"A:6").unwrap().is_none());
    }

    #[test]
    fn test_snapshot_isolation() {
        let (store, _temp) = create_test_store();
        store.put(b"A:1", b"before").unwrap();

        let snapshot = store.snapshot().unwrap();
        store.put(b"A:1", b"after").unwrap();
        store.put(b"A:2", b"new").unwrap();

        let (_, value) = snapshot.seek(b"A:1").unwrap().unwrap();
        assert_eq!(value, b"before");
        assert!(snapshot.seek(b"A:2").unwrap().is_none());
        drop(snapshot);

        assert_eq!(store.get(b"A:1").unwrap(), Some(b"after".to_vec()));
    }

    #[test]
    fn test_reversed_bounds_scan_nothing() {
        let (store, _temp) = create_test_store();
        store.put(b"A:1", b"x").unwrap();

        let snapshot = store.snapshot().unwrap();
        assert!(keys_in(&snapshot, "B:0", "A:0", ScanOrder::Ascending).is_empty());
    }

    #[test]
    fn test_open_failure_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        // A directory cannot be opened as a database file
        let config = RedbStoreConfig {
            db_path: temp_dir.path().to_path_buf(),
            ..Default::default()
        };
        let err = RedbStore::open(config).err().unwrap();
        assert!(matches!(err, IndexError::Open { .. }));
    }
}
