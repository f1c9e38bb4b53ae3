use thiserror::Error;

/// Errors that can occur while writing to a [`Sink`](crate::Sink).
#[derive(Debug, Error)]
pub enum WriteError {
    /// IO errors from the underlying file.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The record could not be serialized.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}
