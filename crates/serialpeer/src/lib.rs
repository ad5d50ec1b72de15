//! COBS-framed command exchanges with serial peer devices.
//!
//! # Crate Structure
//!
//! - [`transport`] - Duplex byte channels (serial ports)
//! - [`frame`] - COBS framing, command header and checksum
//! - [`session`] - Session lifecycle and request/response exchange (behind `session` feature)
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use serialpeer::frame::{SetupCommand, SETUP};
//! use serialpeer::session::{ExchangeConfig, Session};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = Session::open("/dev/ttyUSB0", 115_200, Duration::from_millis(100))?;
//! let setup = SetupCommand { pulse_hz: 30, pulse_limit: 0, delay_us: 0 };
//! let reply = session.exchange(SETUP, &setup.to_payload(), &ExchangeConfig::default())?;
//! println!("reply {:#04X}: {}", reply.command_id, reply.payload_text());
//! session.close();
//! # Ok(())
//! # }
//! ```

/// Re-export transport types.
pub mod transport {
    pub use serialpeer_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use serialpeer_frame::*;
}

/// Re-export session types (requires `session` feature).
#[cfg(feature = "session")]
pub mod session {
    pub use serialpeer_session::*;
}
