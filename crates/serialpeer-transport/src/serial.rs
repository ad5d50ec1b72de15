use std::io::{Read, Write};
use std::time::Duration;

use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::{clamp_timeout, ByteChannel};

/// Baud rate the peer firmware listens on.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// A serial port opened 8N1 without flow control.
///
/// The port is released when the channel is dropped.
pub struct SerialChannel {
    port: Box<dyn SerialPort>,
    path: String,
}

impl SerialChannel {
    /// Open `path` at `baud_rate`, bounding blocking calls by `timeout`.
    pub fn open(path: &str, baud_rate: u32, timeout: Duration) -> Result<Self> {
        let port = serialport::new(path, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(clamp_timeout(timeout))
            .open()
            .map_err(|source| TransportError::PortUnavailable {
                path: path.to_string(),
                source,
            })?;

        info!(path, baud_rate, "opened serial port");

        Ok(Self {
            port,
            path: path.to_string(),
        })
    }

    /// The device path this channel was opened on.
    pub fn path(&self) -> &str {
        &self.path
    }

    // serialport keeps a single timeout for both directions.
    fn set_timeout(&mut self, timeout: Duration) -> Result<()> {
        let timeout = clamp_timeout(timeout);
        if self.port.timeout() == timeout {
            return Ok(());
        }
        debug!(path = %self.path, ?timeout, "updating port timeout");
        self.port
            .set_timeout(timeout)
            .map_err(|source| TransportError::Configure {
                path: self.path.clone(),
                source,
            })
    }
}

impl Read for SerialChannel {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.port.read(buf)
    }
}

impl Write for SerialChannel {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.port.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.port.flush()
    }
}

impl ByteChannel for SerialChannel {
    fn set_receive_timeout(&mut self, timeout: Duration) -> Result<()> {
        self.set_timeout(timeout)
    }

    fn set_send_timeout(&mut self, timeout: Duration) -> Result<()> {
        self.set_timeout(timeout)
    }

    fn discard_input(&mut self) -> Result<usize> {
        let configure = |source| TransportError::Configure {
            path: self.path.clone(),
            source,
        };
        let waiting = self.port.bytes_to_read().map_err(configure)?;
        self.port.clear(ClearBuffer::Input).map_err(configure)?;
        Ok(waiting as usize)
    }

    fn describe(&self) -> String {
        self.path.clone()
    }
}

impl std::fmt::Debug for SerialChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialChannel")
            .field("path", &self.path)
            .finish()
    }
}
