//! Built-in command and report payloads.
//!
//! Command fields are big-endian on the wire. Input-state reports are
//! copied by the peer straight out of its own (little-endian) memory.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};
use crate::header::Frame;

/// Configure the trigger pulse train.
pub const SETUP: u8 = 1;

/// `pulse_hz` (1) + `pulse_limit` (4) + `delay_us` (4).
pub const SETUP_PAYLOAD_LEN: usize = 9;

/// Pulse-train configuration sent with [`SETUP`].
///
/// All-zero fields stop the pulse train.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetupCommand {
    /// Pulse frequency in Hz.
    pub pulse_hz: u8,
    /// Number of pulses before stopping; 0 means no limit.
    pub pulse_limit: u32,
    /// Delay before the first pulse, in microseconds.
    pub delay_us: u32,
}

impl SetupCommand {
    /// Encode the 9-byte payload.
    pub fn to_payload(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(SETUP_PAYLOAD_LEN);
        buf.put_u8(self.pulse_hz);
        buf.put_u32(self.pulse_limit);
        buf.put_u32(self.delay_us);
        buf.freeze()
    }

    /// Decode a payload produced by [`SetupCommand::to_payload`].
    pub fn from_payload(payload: &[u8]) -> Result<Self> {
        if payload.len() != SETUP_PAYLOAD_LEN {
            return Err(FrameError::LengthMismatch {
                expected: SETUP_PAYLOAD_LEN,
                actual: payload.len(),
                bytes: payload.to_vec(),
            });
        }
        let mut buf = payload;
        Ok(Self {
            pulse_hz: buf.get_u8(),
            pulse_limit: buf.get_u32(),
            delay_us: buf.get_u32(),
        })
    }

    /// The command as a frame ready to encode.
    pub fn to_frame(&self) -> Frame {
        Frame::new(SETUP, self.to_payload())
    }
}

/// `uptime_us` (4) + `pulse_id` (4) + `inputs_state` (1).
pub const INPUT_STATE_PAYLOAD_LEN: usize = 9;

/// Input-change report the peer sends unprompted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputState {
    /// Peer clock at the time of the change, in microseconds. Wraps.
    pub uptime_us: u32,
    /// Pulses emitted so far.
    pub pulse_id: u32,
    /// One bit per trigger input.
    pub inputs_state: u8,
}

impl InputState {
    /// Decode a 9-byte report payload.
    pub fn from_payload(payload: &[u8]) -> Result<Self> {
        if payload.len() != INPUT_STATE_PAYLOAD_LEN {
            return Err(FrameError::LengthMismatch {
                expected: INPUT_STATE_PAYLOAD_LEN,
                actual: payload.len(),
                bytes: payload.to_vec(),
            });
        }
        let mut buf = payload;
        Ok(Self {
            uptime_us: buf.get_u32_le(),
            pulse_id: buf.get_u32_le(),
            inputs_state: buf.get_u8(),
        })
    }

    /// Encode the report as the peer lays it out.
    pub fn to_payload(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(INPUT_STATE_PAYLOAD_LEN);
        buf.put_u32_le(self.uptime_us);
        buf.put_u32_le(self.pulse_id);
        buf.put_u8(self.inputs_state);
        buf.freeze()
    }

    /// Whether input `index` (0-7) is high.
    pub fn is_set(&self, index: u8) -> bool {
        index < 8 && self.inputs_state & (1 << index) != 0
    }
}
