//! Event index facade
//!
//! Maps GTIDs to encoded records on top of an [`OrderedStore`] whose keys are
//! ordered by [`GtidOrdering`](crate::ordering::GtidOrdering).

use std::ops::ControlFlow;

use tracing::{debug, warn};

use crate::codec::RecordCodec;
use crate::error::IndexError;
use crate::gtid::Gtid;
use crate::store::{Entry, OrderedStore, RedbStore, RedbStoreConfig, ScanOrder, StoreSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lookup {
    Exact,
    LowerBound,
}

/// GTID-keyed index of transaction records
///
/// Each read runs against its own snapshot, released before the call
/// returns. Writes go straight to the store. There is no locking here and
/// no multi-operation transaction; retries are up to the caller.
pub struct EventIndex<S: OrderedStore, C: RecordCodec> {
    store: S,
    codec: C,
}

impl<C: RecordCodec> EventIndex<RedbStore, C> {
    /// Open (or create) a durable index
    ///
    /// On error no index exists; the caller must not continue without one.
    pub fn open(config: RedbStoreConfig, codec: C) -> Result<Self, IndexError> {
        let store = RedbStore::open(config)?;
        Ok(Self::with_store(store, codec))
    }
}

impl<S: OrderedStore, C: RecordCodec> EventIndex<S, C> {
    /// Build an index over an already open store
    pub fn with_store(store: S, codec: C) -> Self {
        Self { store, codec }
    }

    /// The underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Insert or replace the record for `gtid`
    ///
    /// Nothing is written if the record fails to encode.
    pub fn upsert(&self, gtid: &str, record: &C::Record) -> Result<(), IndexError> {
        Gtid::parse(gtid)?;
        let bytes = self
            .codec
            .encode(record)
            .map_err(|e| IndexError::Encoding(format!("{gtid}: {e}")))?;

        self.store.put(gtid.as_bytes(), &bytes)?;
        debug!(gtid, len = bytes.len(), "Stored index entry");
        Ok(())
    }

    /// Record stored under exactly `gtid`
    pub fn get_exact(&self, gtid: &str) -> Result<Option<C::Record>, IndexError> {
        Ok(self.lookup(gtid, Lookup::Exact)?.map(|(_, record)| record))
    }

    /// Like [`get_exact`](Self::get_exact), also returning the matched GTID
    pub fn get_exact_entry(&self, gtid: &str) -> Result<Option<(Gtid, C::Record)>, IndexError> {
        self.lookup(gtid, Lookup::Exact)
    }

    /// Record for `gtid`, or else the first one after it from the same origin
    ///
    /// This seeks forward: with entries `A:1`, `A:3`, `A:5`, asking for `A:2`
    /// yields `A:3`, not `A:1`. When the first key at or after `gtid` belongs
    /// to another origin (or there is none) the result is `None`.
    pub fn get_lower_bound(&self, gtid: &str) -> Result<Option<C::Record>, IndexError> {
        Ok(self.lookup(gtid, Lookup::LowerBound)?.map(|(_, record)| record))
    }

    /// Like [`get_lower_bound`](Self::get_lower_bound), also returning the
    /// GTID the seek landed on
    pub fn get_lower_bound_entry(
        &self,
        gtid: &str,
    ) -> Result<Option<(Gtid, C::Record)>, IndexError> {
        self.lookup(gtid, Lookup::LowerBound)
    }

    /// Whether any entry, tombstones included, is stored under `gtid`
    pub fn exists(&self, gtid: &str) -> Result<bool, IndexError> {
        Gtid::parse(gtid)?;
        Ok(self.store.get(gtid.as_bytes())?.is_some())
    }

    /// Remove the entry for `gtid`; removing an absent entry succeeds
    pub fn delete(&self, gtid: &str) -> Result<(), IndexError> {
        Gtid::parse(gtid)?;
        self.store.delete(gtid.as_bytes())?;
        debug!(gtid, "Deleted index entry");
        Ok(())
    }

    /// Entry with the highest sequence recorded for `origin`
    ///
    /// Tombstones are skipped.
    pub fn latest_for_origin(&self, origin: &str) -> Result<Option<(Gtid, C::Record)>, IndexError> {
        let (lower, upper) = origin_bounds(origin)?;

        let found = self.store.with_snapshot(|snapshot| {
            let mut found: Option<Entry> = None;
            snapshot.scan(&lower, &upper, ScanOrder::Descending, &mut |key, value| {
                if value.is_empty() {
                    return ControlFlow::Continue(());
                }
                found = Some((key.to_vec(), value.to_vec()));
                ControlFlow::Break(())
            })?;
            Ok(found)
        })?;

        found.map(|(key, value)| self.decode_entry(&key, &value)).transpose()
    }

    /// Entries of `origin` in sequence order, at most `limit` (0 = all)
    ///
    /// Tombstones are skipped.
    pub fn scan_origin(&self, origin: &str, limit: usize) -> Result<Vec<(Gtid, C::Record)>, IndexError> {
        let (lower, upper) = origin_bounds(origin)?;

        let raw = self.store.with_snapshot(|snapshot| {
            let mut raw: Vec<Entry> = Vec::new();
            snapshot.scan(&lower, &upper, ScanOrder::Ascending, &mut |key, value| {
                if !value.is_empty() {
                    raw.push((key.to_vec(), value.to_vec()));
                }
                if limit != 0 && raw.len() >= limit {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })?;
            Ok(raw)
        })?;

        raw.iter()
            .map(|(key, value)| self.decode_entry(key, value))
            .collect()
    }

    fn lookup(&self, gtid: &str, mode: Lookup) -> Result<Option<(Gtid, C::Record)>, IndexError> {
        let wanted = Gtid::parse(gtid)?;

        self.store.with_snapshot(|snapshot| {
            let Some((key, value)) = snapshot.seek(gtid.as_bytes())? else {
                debug!(gtid, "No entry at or after gtid");
                return Ok(None);
            };

            let landed = if key == gtid.as_bytes() {
                Some(wanted.clone())
            } else {
                std::str::from_utf8(&key)
                    .ok()
                    .and_then(|k| Gtid::parse(k).ok())
                    .filter(|g| mode == Lookup::LowerBound && g.origin == wanted.origin)
            };

            let Some(landed) = landed else {
                debug!(
                    gtid,
                    landed = %String::from_utf8_lossy(&key),
                    ?mode,
                    "Gtid not found"
                );
                return Ok(None);
            };

            if value.is_empty() {
                debug!(gtid, landed = %landed, "Entry is a tombstone");
                return Ok(None);
            }

            let record = self.decode(&landed.to_string(), &value)?;
            debug!(gtid, landed = %landed, "Resolved gtid");
            Ok(Some((landed, record)))
        })
    }

    fn decode_entry(&self, key: &[u8], value: &[u8]) -> Result<(Gtid, C::Record), IndexError> {
        let key = String::from_utf8_lossy(key);
        let gtid = Gtid::parse(&key).map_err(|e| IndexError::Decoding {
            gtid: key.to_string(),
            reason: e.to_string(),
        })?;
        let record = self.decode(&key, value)?;
        Ok((gtid, record))
    }

    fn decode(&self, gtid: &str, value: &[u8]) -> Result<C::Record, IndexError> {
        self.codec.decode(value).map_err(|e| {
            warn!(gtid, len = value.len(), error = %e, "Stored record failed to decode");
            IndexError::Decoding {
                gtid: gtid.to_string(),
                reason: e.to_string(),
            }
        })
    }
}

/// Inclusive key bounds covering every sequence of `origin`
fn origin_bounds(origin: &str) -> Result<(Vec<u8>, Vec<u8>), IndexError> {
    if origin.is_empty() {
        return Err(IndexError::invalid_gtid(origin));
    }
    Ok((
        Gtid::origin_lower(origin).to_string().into_bytes(),
        Gtid::origin_upper(origin).to_string().into_bytes(),
    ))
}
