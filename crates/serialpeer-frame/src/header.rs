use bytes::{BufMut, Bytes, BytesMut};

use crate::codec::encode_frame;
use crate::error::{FrameError, Result};

/// Header: command id (1) + payload length (1) + checksum (1) = 3 bytes.
pub const HEADER_SIZE: usize = 3;

/// Largest payload the 1-byte length field can describe.
pub const MAX_PAYLOAD_LEN: usize = u8::MAX as usize;

/// A decoded message: command id plus payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Command (or reply type) identifier.
    pub command_id: u8,
    /// The message payload.
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(command_id: u8, payload: impl Into<Bytes>) -> Self {
        Self {
            command_id,
            payload: payload.into(),
        }
    }

    /// Header plus payload, before COBS stuffing.
    pub fn to_raw(&self) -> Result<Bytes> {
        build(self.command_id, &self.payload)
    }

    /// The complete, delimiter-terminated wire frame.
    pub fn to_wire(&self) -> Result<Bytes> {
        let mut dst = BytesMut::with_capacity(HEADER_SIZE + self.payload.len() + 2);
        let raw = self.to_raw()?;
        encode_frame(&raw, &mut dst)?;
        Ok(dst.freeze())
    }

    /// The payload rendered as text, with invalid UTF-8 replaced.
    ///
    /// The peer answers text and error replies in plain ASCII.
    pub fn payload_text(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}

/// Additive checksum: the payload bytes summed modulo 256.
///
/// The peer firmware calls this a CRC, but it is a plain sum; both sides
/// must agree, so it stays a plain sum.
pub fn checksum(payload: &[u8]) -> u8 {
    payload.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// Prefix `payload` with its header, appending the result to `dst`.
pub fn build_into(command_id: u8, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD_LEN,
        });
    }
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_u8(command_id);
    dst.put_u8(payload.len() as u8);
    dst.put_u8(checksum(payload));
    dst.put_slice(payload);
    Ok(())
}

/// Build `header ++ payload` for one command.
pub fn build(command_id: u8, payload: &[u8]) -> Result<Bytes> {
    let mut dst = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    build_into(command_id, payload, &mut dst)?;
    Ok(dst.freeze())
}

/// Validate a decoded `header ++ payload` and split it into a [`Frame`].
pub fn parse(bytes: &[u8]) -> Result<Frame> {
    if bytes.len() < HEADER_SIZE {
        return Err(FrameError::HeaderTooShort {
            bytes: bytes.to_vec(),
        });
    }

    let command_id = bytes[0];
    let stated_len = bytes[1] as usize;
    let stored = bytes[2];
    let payload = &bytes[HEADER_SIZE..];

    if payload.len() != stated_len {
        return Err(FrameError::LengthMismatch {
            expected: stated_len,
            actual: payload.len(),
            bytes: bytes.to_vec(),
        });
    }

    let computed = checksum(payload);
    if computed != stored {
        return Err(FrameError::ChecksumMismatch {
            expected: stored,
            actual: computed,
            bytes: bytes.to_vec(),
        });
    }

    Ok(Frame::new(command_id, Bytes::copy_from_slice(payload)))
}
