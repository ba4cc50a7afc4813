//! # Binlog Index
//!
//! GTID-keyed position index for a replicated binlog server.
//!
//! Maps a GTID (`origin:sequence`) to an opaque record describing where the
//! transaction lives in the binlog files, and answers "what has this index
//! recorded for origin U at or after position N?" without scanning the log.
//!
//! ## Features
//!
//! - **GtidOrdering**: key order by origin, then numeric sequence
//! - **EventIndex**: exact, lower-bound and latest-per-origin lookups, upsert,
//!   delete and existence checks
//! - **RedbStore**: durable backend; the ordering is installed as the table's
//!   key type
//! - **InMemoryStore**: in-memory backend for testing/simulation
//! - **RecordCodec**: encode/decode boundary, with a postcard default
//!
//! ## Example
//!
//! ```rust,ignore
//! use binlog_index::{EventDataInfo, EventIndex, PostcardCodec, RedbStoreConfig};
//!
//! let index = EventIndex::open(RedbStoreConfig::default(), PostcardCodec::<EventDataInfo>::new())?;
//!
//! index.upsert("3e11fa47-71ca-11e1-9e33-c80aa9429562:5", &EventDataInfo::new("binlog.000002", 4, 310))?;
//!
//! // Nearest entry at or after sequence 3 for the same origin
//! let found = index.get_lower_bound("3e11fa47-71ca-11e1-9e33-c80aa9429562:3")?;
//! assert!(found.is_some());
//! ```

pub mod codec;
pub mod error;
pub mod gtid;
pub mod index;
pub mod ordering;
pub mod record;
pub mod store;

// Re-exports
pub use codec::{PostcardCodec, RecordCodec};
pub use error::{CodecError, IndexError};
pub use gtid::Gtid;
pub use index::EventIndex;
pub use ordering::{GtidKey, GtidOrdering};
pub use record::EventDataInfo;
pub use store::{InMemoryStore, OrderedStore, RedbStore, RedbStoreConfig, StoreSnapshot};

/// Durable index of [`EventDataInfo`] records
pub type BinlogEventIndex = EventIndex<RedbStore, PostcardCodec<EventDataInfo>>;

impl BinlogEventIndex {
    /// Open a durable index with the default record codec
    pub fn open_default(config: RedbStoreConfig) -> Result<Self, IndexError> {
        Self::open(config, PostcardCodec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_default_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let config = RedbStoreConfig {
            db_path: temp_dir.path().join("index.redb"),
            ..Default::default()
        };
        let index = BinlogEventIndex::open_default(config).unwrap();

        let record = EventDataInfo::new("binlog.000002", 4, 310).with_checksum(7);
        index.upsert("u1:5", &record).unwrap();
        assert_eq!(index.get_lower_bound("u1:3").unwrap(), Some(record));
    }
}
