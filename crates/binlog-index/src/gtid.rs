//! GTID parsing
//!
//! A GTID is written `origin:sequence`. The separator is the last `:` so
//! origin ids may contain colons themselves.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::IndexError;

/// Separator between origin id and sequence
pub const SEPARATOR: char = ':';

/// Global transaction identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Gtid {
    /// Replica that produced the transaction
    pub origin: String,
    /// Position within the origin's stream
    pub sequence: u64,
}

impl Gtid {
    /// Create a GTID from its parts
    pub fn new(origin: impl Into<String>, sequence: u64) -> Self {
        Self {
            origin: origin.into(),
            sequence,
        }
    }

    /// Parse the `origin:sequence` form
    pub fn parse(key: &str) -> Result<Self, IndexError> {
        let (origin, sequence) = split(key).ok_or_else(|| IndexError::invalid_gtid(key))?;
        Ok(Self::new(origin, sequence))
    }

    /// Key that sorts after every sequence of `origin`
    pub fn origin_upper(origin: &str) -> Self {
        Self::new(origin, u64::MAX)
    }

    /// Key that sorts before every sequence of `origin`
    pub fn origin_lower(origin: &str) -> Self {
        Self::new(origin, 0)
    }
}

impl fmt::Display for Gtid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.origin, SEPARATOR, self.sequence)
    }
}

impl FromStr for Gtid {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Origin id of a GTID string
pub fn origin_of(key: &str) -> Result<&str, IndexError> {
    split(key)
        .map(|(origin, _)| origin)
        .ok_or_else(|| IndexError::invalid_gtid(key))
}

// Only the canonical spelling is accepted: `A:01` would order equal to `A:1`
// while being a different key.
fn split(key: &str) -> Option<(&str, u64)> {
    let (origin, sequence) = key.rsplit_once(SEPARATOR)?;
    if origin.is_empty() || sequence.is_empty() || !sequence.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if sequence.len() > 1 && sequence.starts_with('0') {
        return None;
    }
    Some((origin, sequence.parse().ok()?))
}

/// Split raw key bytes into `(origin, sequence)` without failing.
///
/// Used by the ordering policy, which must stay total over any bytes the
/// store hands it. Without a separator the whole key is the origin; a
/// sequence that does not parse counts as `0`.
pub(crate) fn split_lenient(key: &[u8]) -> (&[u8], u64) {
    match key.iter().rposition(|&b| b == SEPARATOR as u8) {
        Some(pos) => {
            let digits = &key[pos + 1..];
            let mut sequence: u64 = 0;
            for &b in digits {
                if !b.is_ascii_digit() {
                    return (&key[..pos], 0);
                }
                sequence = match sequence
                    .checked_mul(10)
                    .and_then(|s| s.checked_add(u64::from(b - b'0')))
                {
                    Some(s) => s,
                    None => return (&key[..pos], 0),
                };
            }
            (&key[..pos], sequence)
        }
        None => (key, 0),
    }
}
