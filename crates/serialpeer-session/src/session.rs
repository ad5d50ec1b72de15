use std::time::Duration;

use bytes::Bytes;
use serialpeer_frame::{Frame, FrameConfig, FrameReader, FrameWriter, DELIMITER};
use serialpeer_transport::{ByteChannel, SerialChannel, DEFAULT_BAUD_RATE};
use tracing::{debug, info, warn};

use crate::error::{Result, SessionError};
use crate::exchange::{exchange, ExchangeConfig};

/// Lifecycle of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    Closed,
}

/// Configuration for opening a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Serial baud rate. Default: 115200.
    pub baud_rate: u32,
    /// Pause after opening before the first write. Opening the port resets
    /// most Arduino-class peers. Default: 2 s.
    pub settle_delay: Duration,
    /// Send a lone delimiter after settling so the peer drops any partial
    /// frame. Default: true.
    pub resync_on_open: bool,
    /// Frame size limit and I/O timeouts.
    pub frame: FrameConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            settle_delay: Duration::from_secs(2),
            resync_on_open: true,
            frame: FrameConfig::default(),
        }
    }
}

/// An open link to one serial peer.
///
/// The session is the only owner of its channel. The channel is released by
/// [`Session::close`] or, failing that, when the session is dropped.
/// Sessions are not meant to be shared between threads without external
/// locking.
pub struct Session<C: ByteChannel = SerialChannel> {
    channel: Option<C>,
    reader: FrameReader,
    writer: FrameWriter,
    config: SessionConfig,
}

impl Session<SerialChannel> {
    /// Open the serial device at `path`.
    ///
    /// `read_timeout` bounds [`Session::receive`]. Fails with a `PortUnavailable` transport error if the device cannot
    /// be acquired.
    pub fn open(path: &str, baud_rate: u32, read_timeout: Duration) -> Result<Self> {
        let config = SessionConfig {
            baud_rate,
            frame: FrameConfig {
                read_timeout,
                ..FrameConfig::default()
            },
            ..SessionConfig::default()
        };
        Self::open_with_config(path, config)
    }

    /// Open the serial device at `path` with explicit configuration.
    pub fn open_with_config(path: &str, config: SessionConfig) -> Result<Self> {
        let channel = SerialChannel::open(path, config.baud_rate, config.frame.read_timeout)?;
        Self::open_channel(channel, config)
    }
}

impl<C: ByteChannel> Session<C> {
    /// Wrap an already-connected channel without settling or resyncing.
    pub fn from_channel(channel: C, config: SessionConfig) -> Self {
        Self {
            channel: Some(channel),
            reader: FrameReader::with_config(config.frame.clone()),
            writer: FrameWriter::with_config(config.frame.clone()),
            config,
        }
    }

    /// Wrap a channel, then wait out `settle_delay` and resync if configured.
    pub fn open_channel(channel: C, config: SessionConfig) -> Result<Self> {
        let mut session = Self::from_channel(channel, config);

        if !session.config.settle_delay.is_zero() {
            debug!(delay = ?session.config.settle_delay, "waiting for peer to settle");
            std::thread::sleep(session.config.settle_delay);
        }
        if session.config.resync_on_open {
            session.resync()?;
        }

        info!(channel = %session.describe(), "session open");
        Ok(session)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        if self.channel.is_some() {
            SessionState::Open
        } else {
            SessionState::Closed
        }
    }

    /// Returns true until the session is closed.
    pub fn is_open(&self) -> bool {
        self.channel.is_some()
    }

    /// The configuration the session was opened with.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Channel name for diagnostics, or `closed`.
    pub fn describe(&self) -> String {
        self.channel
            .as_ref()
            .map(ByteChannel::describe)
            .unwrap_or_else(|| "closed".to_string())
    }

    /// Write a complete wire frame, blocking up to the write timeout.
    pub fn send(&mut self, wire_frame: &[u8]) -> Result<()> {
        let channel = self.channel.as_mut().ok_or(SessionError::Closed)?;
        channel.set_send_timeout(self.config.frame.write_timeout)?;
        self.writer.write_wire(channel, wire_frame)?;
        Ok(())
    }

    /// Build, encode and send one command. Returns the wire length.
    pub fn send_frame(&mut self, command_id: u8, payload: &[u8]) -> Result<usize> {
        let channel = self.channel.as_mut().ok_or(SessionError::Closed)?;
        Ok(self.writer.send_on(channel, command_id, payload)?)
    }

    /// Block until a delimiter is seen or `timeout` elapses.
    ///
    /// Returns the frame body without its delimiter, or `None` if nothing
    /// complete arrived in time. A lone delimiter yields an empty body.
    pub fn receive_until_delimiter(&mut self, timeout: Duration) -> Result<Option<Bytes>> {
        let channel = self.channel.as_mut().ok_or(SessionError::Closed)?;
        Ok(self.reader.read_body(channel, timeout)?)
    }

    /// Receive bounded by the configured `read_timeout`.
    pub fn receive(&mut self) -> Result<Option<Bytes>> {
        let channel = self.channel.as_mut().ok_or(SessionError::Closed)?;
        Ok(self.reader.read_next(channel)?)
    }

    /// Send a lone delimiter so the peer discards any partial frame.
    pub fn resync(&mut self) -> Result<()> {
        self.send(&[DELIMITER])
    }

    /// Drop partially received input, both buffered here and waiting in
    /// the channel. Returns the number of bytes dropped.
    pub fn discard_pending(&mut self) -> Result<usize> {
        let channel = self.channel.as_mut().ok_or(SessionError::Closed)?;
        let dropped = self.reader.clear() + channel.discard_input()?;
        if dropped > 0 {
            debug!(dropped, "discarded pending input");
        }
        Ok(dropped)
    }

    /// Send `command_id` with `payload` and wait for the first valid reply.
    pub fn exchange(
        &mut self,
        command_id: u8,
        payload: &[u8],
        config: &ExchangeConfig,
    ) -> Result<Frame> {
        exchange(
            self,
            command_id,
            payload,
            config.max_attempts,
            config.per_attempt_timeout,
        )
    }

    /// Release the channel. Calling this on a closed session does nothing.
    pub fn close(&mut self) {
        let Some(mut channel) = self.channel.take() else {
            return;
        };
        if let Err(err) = channel.flush() {
            warn!(error = %err, "flush on close failed");
        }
        self.reader.clear();
        info!(channel = %channel.describe(), "session closed");
    }
}

impl<C: ByteChannel> Drop for Session<C> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<C: ByteChannel> std::fmt::Debug for Session<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("channel", &self.describe())
            .field("state", &self.state())
            .field("pending", &self.reader.pending())
            .finish()
    }
}
