//! Duplex byte channel abstraction for serial peers.
//!
//! This is the lowest layer of serialpeer. It knows nothing about frames:
//! it opens a device, moves bytes in both directions and lets the layers
//! above bound each blocking read with a timeout.
//!
//! - [`SerialChannel`] wraps a serial port opened through `serialport`.
//! - [`ByteChannel`] is the seam the session layer is generic over, so any
//!   other duplex stream (a socket pair in tests, a pty) can stand in.

pub mod error;
pub mod serial;
pub mod traits;

pub use error::{Result, TransportError};
pub use serial::{SerialChannel, DEFAULT_BAUD_RATE};
pub use traits::{is_timeout, ByteChannel};
