use std::io::{ErrorKind, Write};
use std::time::Duration;

use bytes::BytesMut;
use serialpeer_transport::{is_timeout, ByteChannel};
use tracing::debug;

use crate::codec::{encode_frame, FrameConfig};
use crate::error::{FrameError, Result};
use crate::header::{build_into, Frame};
use crate::hex::hex_dump;
use crate::reader::transport_to_frame_error;

const INITIAL_BUFFER_CAPACITY: usize = 512;

/// Encodes frames and writes them whole to any `Write` sink.
#[derive(Debug)]
pub struct FrameWriter {
    raw: BytesMut,
    wire: BytesMut,
    config: FrameConfig,
}

impl FrameWriter {
    /// Create a new frame writer with default configuration.
    pub fn new() -> Self {
        Self::with_config(FrameConfig::default())
    }

    /// Create a new frame writer with explicit configuration.
    pub fn with_config(config: FrameConfig) -> Self {
        Self {
            raw: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            wire: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Write a complete frame (blocking).
    pub fn write_frame<W: Write + ?Sized>(&mut self, dst: &mut W, frame: &Frame) -> Result<usize> {
        self.send(dst, frame.command_id, frame.payload.as_ref())
    }

    /// Build, encode and send one command. Returns the wire length.
    pub fn send<W: Write + ?Sized>(
        &mut self,
        dst: &mut W,
        command_id: u8,
        payload: &[u8],
    ) -> Result<usize> {
        self.raw.clear();
        build_into(command_id, payload, &mut self.raw)?;

        self.wire.clear();
        encode_frame(&self.raw, &mut self.wire)?;

        debug!(
            command_id,
            raw = %hex_dump(&self.raw),
            wire = %hex_dump(&self.wire),
            "sending frame"
        );
        write_all(dst, &self.wire, self.config.write_timeout)?;
        Ok(self.wire.len())
    }

    /// Send a command on a channel, bounding the write by `write_timeout`.
    pub fn send_on<C: ByteChannel + ?Sized>(
        &mut self,
        channel: &mut C,
        command_id: u8,
        payload: &[u8],
    ) -> Result<usize> {
        channel
            .set_send_timeout(self.config.write_timeout)
            .map_err(transport_to_frame_error)?;
        self.send(channel, command_id, payload)
    }

    /// Write bytes that are already a wire frame (or a lone delimiter).
    pub fn write_wire<W: Write + ?Sized>(&mut self, dst: &mut W, wire: &[u8]) -> Result<()> {
        debug!(wire = %hex_dump(wire), "sending raw bytes");
        write_all(dst, wire, self.config.write_timeout)
    }
}

impl Default for FrameWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn write_all<W: Write + ?Sized>(dst: &mut W, bytes: &[u8], timeout: Duration) -> Result<()> {
    let mut offset = 0usize;
    while offset < bytes.len() {
        match dst.write(&bytes[offset..]) {
            Ok(0) => return Err(FrameError::ConnectionClosed),
            Ok(n) => offset += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) if is_timeout(&err) => return Err(FrameError::WriteTimeout(timeout)),
            Err(err) => return Err(FrameError::Io(err)),
        }
    }

    loop {
        match dst.flush() {
            Ok(()) => return Ok(()),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) if is_timeout(&err) => return Err(FrameError::WriteTimeout(timeout)),
            Err(err) => return Err(FrameError::Io(err)),
        }
    }
}
