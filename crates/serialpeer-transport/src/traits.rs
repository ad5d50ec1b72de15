use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use crate::error::Result;

/// Smallest timeout handed to the OS; some stream types reject zero.
const MIN_TIMEOUT: Duration = Duration::from_millis(1);

/// A connected duplex byte stream whose blocking calls can be bounded.
///
/// A timed-out read must surface as an `io::Error` of kind `TimedOut` or
/// `WouldBlock` (see [`is_timeout`]), never as `Ok(0)`, which means EOF.
pub trait ByteChannel: Read + Write {
    /// Bound subsequent blocking reads by `timeout`.
    fn set_receive_timeout(&mut self, timeout: Duration) -> Result<()>;

    /// Bound subsequent blocking writes by `timeout`.
    fn set_send_timeout(&mut self, timeout: Duration) -> Result<()>;

    /// Drop input already received by the OS but not yet read.
    ///
    /// Returns the number of bytes dropped, when the channel can tell.
    fn discard_input(&mut self) -> Result<usize> {
        Ok(0)
    }

    /// Channel name for diagnostics.
    fn describe(&self) -> String {
        "channel".to_string()
    }
}

/// Returns true if `err` is how a bounded read or write reports expiry.
pub fn is_timeout(err: &std::io::Error) -> bool {
    matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock)
}

pub(crate) fn clamp_timeout(timeout: Duration) -> Duration {
    timeout.max(MIN_TIMEOUT)
}

impl<T: ByteChannel + ?Sized> ByteChannel for Box<T> {
    fn set_receive_timeout(&mut self, timeout: Duration) -> Result<()> {
        (**self).set_receive_timeout(timeout)
    }

    fn set_send_timeout(&mut self, timeout: Duration) -> Result<()> {
        (**self).set_send_timeout(timeout)
    }

    fn discard_input(&mut self) -> Result<usize> {
        (**self).discard_input()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

#[cfg(unix)]
impl ByteChannel for std::os::unix::net::UnixStream {
    fn set_receive_timeout(&mut self, timeout: Duration) -> Result<()> {
        self.set_read_timeout(Some(clamp_timeout(timeout)))
            .map_err(Into::into)
    }

    fn set_send_timeout(&mut self, timeout: Duration) -> Result<()> {
        self.set_write_timeout(Some(clamp_timeout(timeout)))
            .map_err(Into::into)
    }

    fn discard_input(&mut self) -> Result<usize> {
        self.set_nonblocking(true)?;
        let mut dropped = 0;
        let mut chunk = [0u8; 256];
        let drained = loop {
            match self.read(&mut chunk) {
                Ok(0) => break Ok(()),
                Ok(n) => dropped += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => break Ok(()),
                Err(err) => break Err(err),
            }
        };
        self.set_nonblocking(false)?;
        drained?;
        Ok(dropped)
    }

    fn describe(&self) -> String {
        "unix-socket".to_string()
    }
}
