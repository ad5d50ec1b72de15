use std::io::{ErrorKind, Read};
use std::time::{Duration, Instant};

use bytes::{Buf, Bytes, BytesMut};
use serialpeer_transport::{is_timeout, ByteChannel, TransportError};
use tracing::{debug, trace};

use crate::codec::{find_delimiter, FrameConfig};
use crate::error::{FrameError, Result};
use crate::hex::hex_dump;

const INITIAL_BUFFER_CAPACITY: usize = 512;
const READ_CHUNK_SIZE: usize = 256;

/// Outcome of a single read attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStatus {
    /// This many bytes were appended to the buffer.
    Data(usize),
    /// The read timed out without data.
    TimedOut,
}

/// Splits a byte stream into delimited COBS bodies.
///
/// Handles partial reads internally. Bytes that arrive after a delimiter
/// stay buffered for the next frame.
#[derive(Debug)]
pub struct FrameReader {
    buf: BytesMut,
    config: FrameConfig,
}

impl FrameReader {
    /// Create a new frame reader with default configuration.
    pub fn new() -> Self {
        Self::with_config(FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(config: FrameConfig) -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Perform one read from `src` into the buffer.
    ///
    /// A timed-out read is not an error. EOF is `ConnectionClosed`.
    pub fn fill_from<R: Read + ?Sized>(&mut self, src: &mut R) -> Result<ReadStatus> {
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        loop {
            match src.read(&mut chunk) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => {
                    trace!(bytes = %hex_dump(&chunk[..n]), "read chunk");
                    self.buf.extend_from_slice(&chunk[..n]);
                    return Ok(ReadStatus::Data(n));
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if is_timeout(&err) => return Ok(ReadStatus::TimedOut),
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Split off the next complete body (without its delimiter), if buffered.
    ///
    /// A body longer than `max_frame_size`, or that many bytes with no
    /// delimiter at all, is discarded and reported as `FrameCorrupt`.
    pub fn next_body(&mut self) -> Result<Option<Bytes>> {
        let max = self.config.max_frame_size;
        match find_delimiter(&self.buf) {
            Some(pos) if pos >= max => {
                let bytes = self.buf.split_to(pos).to_vec();
                self.buf.advance(1);
                Err(FrameError::FrameCorrupt {
                    reason: format!("frame body of {pos} bytes exceeds {max}"),
                    bytes,
                })
            }
            Some(pos) => {
                let body = self.buf.split_to(pos).freeze();
                self.buf.advance(1);
                debug!(wire = %hex_dump(&body), "received frame body");
                Ok(Some(body))
            }
            None if self.buf.len() > max => {
                let bytes = self.buf.split().to_vec();
                Err(FrameError::FrameCorrupt {
                    reason: format!("no delimiter within {max} bytes"),
                    bytes,
                })
            }
            None => Ok(None),
        }
    }

    /// Block until a delimiter arrives on `channel` or `timeout` elapses.
    ///
    /// Returns `Ok(None)` on timeout; partial input stays buffered. The
    /// channel is polled at least once, so a zero timeout still picks up
    /// bytes that are already waiting. Each read waits at most
    /// `read_timeout`; a timeout too large to form a deadline waits
    /// indefinitely.
    pub fn read_body<C: ByteChannel + ?Sized>(
        &mut self,
        channel: &mut C,
        timeout: Duration,
    ) -> Result<Option<Bytes>> {
        let deadline = Instant::now().checked_add(timeout);
        let mut polled = false;
        loop {
            if let Some(body) = self.next_body()? {
                return Ok(Some(body));
            }

            let remaining = deadline.map(|d| d.saturating_duration_since(Instant::now()));
            if polled && remaining.is_some_and(|r| r.is_zero()) {
                if !self.buf.is_empty() {
                    debug!(pending = self.buf.len(), "receive timed out mid-frame");
                }
                return Ok(None);
            }

            let wait = remaining.map_or(self.config.read_timeout, |r| {
                r.min(self.config.read_timeout)
            });
            channel
                .set_receive_timeout(wait)
                .map_err(transport_to_frame_error)?;
            self.fill_from(channel)?;
            polled = true;
        }
    }

    /// [`FrameReader::read_body`] bounded by the configured `read_timeout`.
    pub fn read_next<C: ByteChannel + ?Sized>(&mut self, channel: &mut C) -> Result<Option<Bytes>> {
        let timeout = self.config.read_timeout;
        self.read_body(channel, timeout)
    }

    /// Number of buffered bytes not yet returned as a body.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Drop buffered partial input, returning how many bytes were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.buf.len();
        self.buf.clear();
        dropped
    }
}

impl Default for FrameReader {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn transport_to_frame_error(err: TransportError) -> FrameError {
    match err {
        TransportError::Io(io) => FrameError::Io(io),
        other => FrameError::Io(std::io::Error::other(other.to_string())),
    }
}
