use std::path::PathBuf;

use thiserror::Error;

/// Sink failure taxonomy. A single write failure is retried once by the
/// sink itself; callers only ever observe [`Fatal`] after that retry is
/// exhausted.
///
/// [`Fatal`]: SinkError::Fatal
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to open trial file '{path}'")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("write to trial file failed after one retry, draining to '{secondary_path}'")]
    Fatal {
        secondary_path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "hdf5")]
    #[error("hdf5 operation failed: {message}")]
    Hdf5 { message: String },

    #[error("'{format}' trial file support was not compiled into this binary")]
    Unsupported { format: &'static str },
}
