//! Record codec boundary
//!
//! The index stores records as opaque bytes; a [`RecordCodec`] is the only
//! thing that knows their shape.

use std::fmt;
use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::CodecError;

/// Encodes and decodes the records held by an index
pub trait RecordCodec: Send + Sync {
    /// Record type handled by this codec
    type Record;

    /// Serialize a record to bytes
    fn encode(&self, record: &Self::Record) -> Result<Vec<u8>, CodecError>;

    /// Deserialize a record from stored bytes
    fn decode(&self, bytes: &[u8]) -> Result<Self::Record, CodecError>;
}

/// postcard codec for any serde record type
pub struct PostcardCodec<T> {
    _record: PhantomData<fn() -> T>,
}

impl<T> PostcardCodec<T> {
    pub fn new() -> Self {
        Self {
            _record: PhantomData,
        }
    }
}

impl<T> Default for PostcardCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for PostcardCodec<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for PostcardCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PostcardCodec")
    }
}

impl<T> RecordCodec for PostcardCodec<T>
where
    T: Serialize + DeserializeOwned,
{
    type Record = T;

    fn encode(&self, record: &T) -> Result<Vec<u8>, CodecError> {
        postcard::to_allocvec(record).map_err(|e| CodecError::Encode(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<T, CodecError> {
        Ok(postcard::from_bytes(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::EventDataInfo;

    #[test]
    fn test_postcard_roundtrip() {
        let codec = PostcardCodec::<EventDataInfo>::new();
        let record = EventDataInfo::new("binlog.000003", 4096, 312).with_checksum(0xdead_beef);

        let bytes = codec.encode(&record).unwrap();
        assert_eq!(codec.decode(&bytes).unwrap(), record);
    }

    #[test]
    fn test_decode_garbage_fails() {
        let codec = PostcardCodec::<EventDataInfo>::new();
        let err = codec.decode(&[0xff, 0xff, 0xff]).unwrap_err();
        assert!(matches!(err, CodecError::Decode(_)));
    }
}
