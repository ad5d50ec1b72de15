//! Serial peer sessions.
//!
//! This is the layer applications talk to. A [`Session`] owns one open
//! channel for its whole lifetime and closes it on every exit path; an
//! [`exchange`] sends one command and waits, a bounded number of times, for
//! the first valid reply.

pub mod error;
pub mod exchange;
pub mod session;

pub use error::{Result, SessionError};
pub use exchange::{exchange, ExchangeConfig};
pub use session::{Session, SessionConfig, SessionState};
