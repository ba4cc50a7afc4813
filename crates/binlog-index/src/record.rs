//! Default record type: where a transaction lives in the binlog files

use serde::{Deserialize, Serialize};

/// Physical location of one transaction's events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDataInfo {
    /// Binlog file holding the transaction
    pub file_name: String,
    /// Byte offset of the first event in the file
    pub offset: u64,
    /// Total length of the transaction's events in bytes
    pub length: u64,
    /// Checksum of the event bytes
    pub checksum: u32,
}

impl EventDataInfo {
    /// Create a new record with a zero checksum
    pub fn new(file_name: impl Into<String>, offset: u64, length: u64) -> Self {
        Self {
            file_name: file_name.into(),
            offset,
            length,
            checksum: 0,
        }
    }

    /// Set the checksum
    pub fn with_checksum(mut self, checksum: u32) -> Self {
        self.checksum = checksum;
        self
    }

    /// Offset one past the last byte of the transaction
    pub fn end_offset(&self) -> u64 {
        self.offset.saturating_add(self.length)
    }
}
