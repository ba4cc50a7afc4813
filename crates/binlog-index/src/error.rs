//! Error types for binlog-index
//!
//! `IndexError` is what every public operation returns. Absence is not an
//! error: lookups report it as `Ok(None)` and `exists` as `Ok(false)`.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in index operations
#[derive(Debug, Error)]
pub enum IndexError {
    /// The ordered store could not be opened
    ///
    /// The index is unusable after this; there is no half-open state.
    #[error("Failed to open index at {path}: {reason}")]
    Open { path: PathBuf, reason: String },

    /// The key is not a well-formed `origin:sequence` GTID
    #[error("Invalid GTID: {0}")]
    InvalidGtid(String),

    /// The record could not be encoded; nothing was written
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Stored bytes for a present key could not be decoded
    #[error("Decoding error for {gtid}: {reason}")]
    Decoding { gtid: String, reason: String },

    /// The underlying store failed
    #[error("Store error: {0}")]
    Store(String),
}

impl IndexError {
    /// Create a new InvalidGtid error
    pub fn invalid_gtid(key: impl Into<String>) -> Self {
        Self::InvalidGtid(key.into())
    }

    /// Create a new Store error
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store(message.into())
    }

    /// Whether this error indicates stored data is corrupt
    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::Decoding { .. })
    }
}

impl From<std::io::Error> for IndexError {
    fn from(err: std::io::Error) -> Self {
        IndexError::Store(err.to_string())
    }
}

macro_rules! impl_from_redb {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for IndexError {
                fn from(err: $ty) -> Self {
                    IndexError::Store(err.to_string())
                }
            }
        )*
    };
}

impl_from_redb!(
    redb::StorageError,
    redb::TransactionError,
    redb::TableError,
    redb::CommitError,
);

/// Errors raised by a [`RecordCodec`](crate::codec::RecordCodec)
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("encode failed: {0}")]
    Encode(String),

    #[error("decode failed: {0}")]
    Decode(String),
}

impl From<postcard::Error> for CodecError {
    fn from(err: postcard::Error) -> Self {
        CodecError::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_gtid_error() {
        let err = IndexError::invalid_gtid("no-separator");
        assert!(matches!(err, IndexError::InvalidGtid(_)));
        assert!(err.to_string().contains("no-separator"));
    }

    #[test]
    fn test_decoding_is_corruption() {
        let err = IndexError::Decoding {
            gtid: "A:1".into(),
            reason: "truncated".into(),
        };
        assert!(err.is_corruption());
        assert!(err.to_string().contains("A:1"));
        assert!(!IndexError::store("disk").is_corruption());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: IndexError = io_err.into();
        assert!(matches!(err, IndexError::Store(_)));
    }

    #[test]
    fn test_open_error_names_path() {
        let err = IndexError::Open {
            path: PathBuf::from("/tmp/idx.redb"),
            reason: "locked".into(),
        };
        assert!(err.to_string().contains("/tmp/idx.redb"));
    }
}
