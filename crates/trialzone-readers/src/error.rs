use thiserror::Error;
use trialzone_core::BufferError;

/// Reader-level failures. `Retryable` is retried with backoff by the
/// [`crate::Router`]; `Permanent` exhausts the reader.
#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("transient read failure on '{source_name}': {message}")]
    Retryable { source_name: String, message: String },

    #[error("permanent read failure on '{source_name}': {message}")]
    Permanent { source_name: String, message: String },
}

impl ReaderError {
    pub fn source_name(&self) -> &str {
        match self {
            ReaderError::Retryable { source_name, .. } => source_name,
            ReaderError::Permanent { source_name, .. } => source_name,
        }
    }
}

/// A piece could not be routed into its target buffer: the Router logs and
/// discards the piece, the run continues.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error(transparent)]
    Buffer(#[from] BufferError),

    #[error("piece for buffer '{buffer}' does not match its variety")]
    KindMismatch { buffer: String },
}
