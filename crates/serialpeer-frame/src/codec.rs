use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Frame delimiter, and the one byte value COBS removes from the body.
pub const DELIMITER: u8 = 0x00;

/// Largest raw frame accepted by the encoder: a 3-byte header plus the
/// 255-byte payload the header's length field can describe.
pub const MAX_RAW_LEN: usize = 3 + 255;

/// Largest wire frame (body plus delimiter) a well-formed peer can send.
pub const MAX_WIRE_LEN: usize = max_encoded_len(MAX_RAW_LEN) + 1;

/// Longest run of non-zero bytes one overhead byte can cover.
const MAX_RUN: usize = 254;

/// Worst-case COBS body length for `raw_len` input bytes.
pub const fn max_encoded_len(raw_len: usize) -> usize {
    raw_len + raw_len / MAX_RUN + 1
}

/// Encode a raw frame into the wire format, appending it to `dst`.
///
/// Wire format:
/// ```text
/// ┌──────────┬─────────────┬──────────┬─────────────┬───────────┐
/// │ Overhead │ Run (n-1 B) │ Overhead │ Run         │ Delimiter │
/// │ n        │ no zeros    │ m        │ ...         │ 0x00      │
/// └──────────┴─────────────┴──────────┴─────────────┴───────────┘
/// ```
///
/// Each overhead byte gives the distance to the next one; a zero sat there
/// in the raw frame unless the run was a full 254 bytes (`0xFF`). The
/// output is byte-identical to the Python `cobs` package, including the
/// empty input encoding to `01 00`.
pub fn encode_frame(raw: &[u8], dst: &mut BytesMut) -> Result<()> {
    if raw.len() > MAX_RAW_LEN {
        return Err(FrameError::PayloadTooLarge {
            size: raw.len(),
            max: MAX_RAW_LEN,
        });
    }
    dst.reserve(max_encoded_len(raw.len()) + 1);

    let mut run_start = 0usize;
    let mut ends_with_zero = true;
    for (idx, &byte) in raw.iter().enumerate() {
        if byte == DELIMITER {
            ends_with_zero = true;
            dst.put_u8((idx - run_start + 1) as u8);
            dst.put_slice(&raw[run_start..idx]);
            run_start = idx + 1;
        } else if idx - run_start == MAX_RUN - 1 {
            ends_with_zero = false;
            dst.put_u8(0xFF);
            dst.put_slice(&raw[run_start..=idx]);
            run_start = idx + 1;
        }
    }
    if run_start != raw.len() || ends_with_zero {
        dst.put_u8((raw.len() - run_start + 1) as u8);
        dst.put_slice(&raw[run_start..]);
    }

    dst.put_u8(DELIMITER);
    Ok(())
}

/// Encode a raw frame into a fresh, delimiter-terminated buffer.
pub fn encode(raw: &[u8]) -> Result<Bytes> {
    let mut dst = BytesMut::new();
    encode_frame(raw, &mut dst)?;
    Ok(dst.freeze())
}

/// Decode a COBS body (without its trailing delimiter) back to raw bytes.
///
/// An empty body decodes to an empty frame.
pub fn decode_frame(body: &[u8]) -> Result<Bytes> {
    if let Some(pos) = find_delimiter(body) {
        return Err(FrameError::FrameCorrupt {
            reason: format!("delimiter inside frame body at offset {pos}"),
            bytes: body.to_vec(),
        });
    }

    let mut out = BytesMut::with_capacity(body.len());
    let mut idx = 0usize;
    while idx < body.len() {
        let code = body[idx] as usize;
        let end = idx + code;
        if end > body.len() {
            return Err(FrameError::FrameCorrupt {
                reason: format!(
                    "overhead byte {code:#04X} at offset {idx} overruns the {} remaining bytes",
                    body.len() - idx - 1
                ),
                bytes: body.to_vec(),
            });
        }
        out.put_slice(&body[idx + 1..end]);
        idx = end;
        if idx < body.len() && code <= MAX_RUN {
            out.put_u8(DELIMITER);
        }
    }

    Ok(out.freeze())
}

/// Position of the next frame delimiter in `buf`, if any.
pub fn find_delimiter(buf: &[u8]) -> Option<usize> {
    buf.iter().position(|&b| b == DELIMITER)
}

/// Configuration for frame reading and writing.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Bytes buffered without a delimiter before input is discarded as
    /// corrupt. Default: [`MAX_WIRE_LEN`].
    pub max_frame_size: usize,
    /// Bound for [`FrameReader::read_next`](crate::FrameReader::read_next),
    /// and the wait slice when a receive has no deadline. Default: 1 s.
    pub read_timeout: Duration,
    /// Bound for a blocking write. Default: 1 s.
    pub write_timeout: Duration,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_frame_size: MAX_WIRE_LEN,
            read_timeout: Duration::from_secs(1),
            write_timeout: Duration::from_secs(1),
        }
    }
}
