use thiserror::Error;

/// Errors raised by the Neutral Zone buffer primitives.
#[derive(Debug, Error, PartialEq)]
pub enum BufferError {
    #[error("arity mismatch in buffer '{name}': expected {expected}, got {got}")]
    ArityMismatch {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error(
        "out-of-order append to buffer '{name}': new data starts at {new_t}, \
         buffer already holds data up to {last_t} (slack {slack})"
    )]
    OutOfOrder {
        name: String,
        new_t: f64,
        last_t: f64,
        slack: f64,
    },

    #[error("signal chunk in buffer '{name}' has non-positive sample frequency {frequency}")]
    InvalidFrequency { name: String, frequency: f64 },

    #[error(
        "signal chunk in buffer '{name}' has {got} channel ids, expected {expected}"
    )]
    ChannelMismatch {
        name: String,
        expected: usize,
        got: usize,
    },
}
