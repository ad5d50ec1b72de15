use std::time::Duration;

use serialpeer_frame::{decode_frame, hex_dump, parse, Frame, FrameError};
use serialpeer_transport::ByteChannel;
use tracing::{debug, warn};

use crate::error::{Result, SessionError};
use crate::session::Session;

/// Bounds for one request/response exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeConfig {
    /// Receive attempts before giving up. Default: 10.
    pub max_attempts: usize,
    /// Bound for each receive attempt. Default: 1 s.
    pub per_attempt_timeout: Duration,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            per_attempt_timeout: Duration::from_secs(1),
        }
    }
}

/// Send one command and return the first valid frame the peer answers with.
///
/// Input left over from earlier traffic is dropped before sending, so a
/// late extra reply to a previous command is never taken for this one.
/// Timeouts and empty bodies count as "nothing yet". A corrupt or
/// checksum-failing reply is logged and the next attempt proceeds. After
/// `max_attempts` receives without a valid frame the call fails with
/// [`SessionError::NoResponse`]; with `max_attempts == 0` that happens right
/// after sending. I/O failures abort immediately.
pub fn exchange<C: ByteChannel>(
    session: &mut Session<C>,
    command_id: u8,
    payload: &[u8],
    max_attempts: usize,
    per_attempt_timeout: Duration,
) -> Result<Frame> {
    session.discard_pending()?;
    session.send_frame(command_id, payload)?;

    let mut last_error: Option<FrameError> = None;
    for attempt in 1..=max_attempts {
        let body = match session.receive_until_delimiter(per_attempt_timeout) {
            Ok(Some(body)) if !body.is_empty() => body,
            Ok(_) => {
                debug!(attempt, max_attempts, "no response yet");
                continue;
            }
            Err(SessionError::Frame(err)) if err.is_structural() => {
                warn!(attempt, error = %err, "discarding invalid response frame");
                last_error = Some(err);
                continue;
            }
            Err(err) => return Err(err),
        };

        match decode_frame(&body).and_then(|raw| parse(&raw)) {
            Ok(frame) => {
                debug!(
                    attempt,
                    command_id = frame.command_id,
                    payload = %hex_dump(&frame.payload),
                    text = %frame.payload_text(),
                    "received response"
                );
                return Ok(frame);
            }
            Err(err) => {
                warn!(attempt, error = %err, "discarding invalid response frame");
                last_error = Some(err);
            }
        }
    }

    Err(SessionError::NoResponse {
        attempts: max_attempts,
        last_error: last_error.map(Box::new),
    })
}
