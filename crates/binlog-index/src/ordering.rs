//! Key ordering policy
//!
//! Keys are ordered as GTIDs, not as raw bytes: first by origin id
//! (byte-lexicographic), then numerically by sequence. Every entry of one
//! origin is therefore contiguous and increasing, so `A:9` sorts before
//! `A:10` even though the raw bytes say otherwise.
//!
//! The store persists data laid out by this order. Changing the result of
//! [`GtidOrdering::compare`] for any pair of keys once data exists breaks
//! every index written before the change.

use std::cmp::Ordering;
use std::fmt;

use redb::{Key, TypeName, Value};

use crate::gtid::split_lenient;

/// Stable identity of the ordering, persisted by redb with the table
pub const ORDERING_NAME: &str = "binlog_index::GtidKey";

/// Comparator over GTID-shaped keys
///
/// Stateless; the single instance is shared by every store and thread.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GtidOrdering;

static GTID_ORDERING: GtidOrdering = GtidOrdering;

impl GtidOrdering {
    /// The process-wide ordering instance
    pub fn global() -> &'static GtidOrdering {
        &GTID_ORDERING
    }

    /// Name under which stores record this ordering
    pub fn name(&self) -> &'static str {
        ORDERING_NAME
    }

    /// Compare two raw keys
    pub fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        let (origin_a, seq_a) = split_lenient(a);
        let (origin_b, seq_b) = split_lenient(b);
        origin_a.cmp(origin_b).then(seq_a.cmp(&seq_b))
    }
}

/// redb key type that installs [`GtidOrdering`] on a table
///
/// Keys are the raw bytes of the GTID string.
#[derive(Debug)]
pub struct GtidKey;

impl Value for GtidKey {
    type SelfType<'a>
        = &'a [u8]
    where
        Self: 'a;
    type AsBytes<'a>
        = &'a [u8]
    where
        Self: 'a;

    fn fixed_width() -> Option<usize> {
        None
    }

    fn from_bytes<'a>(data: &'a [u8]) -> &'a [u8]
    where
        Self: 'a,
    {
        data
    }

    fn as_bytes<'a, 'b: 'a>(value: &'a &'b [u8]) -> &'a [u8]
    where
        Self: 'b,
    {
        value
    }

    fn type_name() -> TypeName {
        TypeName::new(ORDERING_NAME)
    }
}

impl Key for GtidKey {
    fn compare(data1: &[u8], data2: &[u8]) -> Ordering {
        GtidOrdering::global().compare(data1, data2)
    }
}

/// Owned key bytes ordered by [`GtidOrdering`], for std ordered collections
///
/// Equality follows the ordering, not the raw bytes.
#[derive(Clone)]
pub struct OrderedKey(pub Vec<u8>);

impl OrderedKey {
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self(key.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Ord for OrderedKey {
    fn cmp(&self, other: &Self) -> Ordering {
        GtidOrdering::global().compare(&self.0, &other.0)
    }
}

impl PartialEq for OrderedKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
    }
}

impl Eq for OrderedKey {}

impl PartialOrd for OrderedKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for OrderedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}
