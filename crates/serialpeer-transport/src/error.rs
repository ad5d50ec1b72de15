/// Errors that can occur in transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The device could not be acquired (missing, busy, permission denied).
    #[error("port {path} unavailable: {source}")]
    PortUnavailable {
        path: String,
        source: serialport::Error,
    },

    /// Reconfiguring an open port failed.
    #[error("failed to configure port {path}: {source}")]
    Configure {
        path: String,
        source: serialport::Error,
    },

    /// An I/O error occurred on the channel.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
