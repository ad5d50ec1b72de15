use serialpeer_frame::FrameError;

/// Errors that can occur in session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Transport-level error, including an unavailable port.
    #[error("transport error: {0}")]
    Transport(#[from] serialpeer_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// The session was already closed.
    #[error("session closed")]
    Closed,

    /// Every attempt ended without a structurally valid, checksum-valid frame.
    #[error("no valid response after {attempts} attempts{}", last_error_suffix(.last_error))]
    NoResponse {
        attempts: usize,
        last_error: Option<Box<FrameError>>,
    },
}

fn last_error_suffix(last_error: &Option<Box<FrameError>>) -> String {
    match last_error {
        Some(err) => format!(" (last: {err})"),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_response_without_last_error() {
        let err = SessionError::NoResponse {
            attempts: 10,
            last_error: None,
        };
        assert_eq!(err.to_string(), "no valid response after 10 attempts");
    }

    #[test]
    fn no_response_mentions_last_error() {
        let err = SessionError::NoResponse {
            attempts: 3,
            last_error: Some(Box::new(FrameError::HeaderTooShort {
                bytes: vec![0x01],
            })),
        };
        assert_eq!(
            err.to_string(),
            "no valid response after 3 attempts (last: header too short (need 3 bytes) [01])"
        );
    }
}
