use thiserror::Error;

/// Unrecoverable connection conditions. Both kinds are shown to the user and
/// leave the channel disconnected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("Could not start worker: {0}")]
    ConnectionEstablishment(String),

    #[error("Disconnected due to an error: {0}")]
    AbnormalDisconnect(String),
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("frame of {len} bytes exceeds limit of {max} bytes")]
    TooLarge { len: usize, max: usize },

    #[error("stream ended in the middle of a frame")]
    Truncated,
}
