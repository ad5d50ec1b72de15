use std::time::Duration;

use crate::hex::hex_dump;

/// Errors that can occur during frame encoding/decoding.
///
/// Structural variants keep the offending bytes so a failed frame can be
/// dumped exactly as it arrived.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The payload (or raw frame) exceeds what the header can describe.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// Fewer bytes than a header were present.
    #[error("header too short (need 3 bytes) [{}]", hex_dump(.bytes))]
    HeaderTooShort { bytes: Vec<u8> },

    /// The header's length field disagrees with the bytes that follow it.
    #[error("length mismatch (header says {expected}, got {actual}) [{}]", hex_dump(.bytes))]
    LengthMismatch {
        expected: usize,
        actual: usize,
        bytes: Vec<u8>,
    },

    /// The header's checksum disagrees with the recomputed one.
    #[error(
        "checksum mismatch (header {expected:#04X}, computed {actual:#04X}) [{}]",
        hex_dump(.bytes)
    )]
    ChecksumMismatch {
        expected: u8,
        actual: u8,
        bytes: Vec<u8>,
    },

    /// The COBS body violates the stuffing rules.
    #[error("corrupt frame: {reason} [{}]", hex_dump(.bytes))]
    FrameCorrupt { reason: String, bytes: Vec<u8> },

    /// A blocking write did not complete in time.
    #[error("write timed out after {0:?}")]
    WriteTimeout(Duration),

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The channel reached EOF or accepted no bytes.
    #[error("connection closed")]
    ConnectionClosed,
}

impl FrameError {
    /// Returns true for errors raised by malformed bytes rather than I/O.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            FrameError::HeaderTooShort { .. }
                | FrameError::LengthMismatch { .. }
                | FrameError::ChecksumMismatch { .. }
                | FrameError::FrameCorrupt { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
