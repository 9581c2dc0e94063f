use thiserror::Error;

/// Driver-level failures: the driver translates a config or sink failure
/// into a non-zero exit. Everything else (retryable source I/O,
/// enhancer/collecter exceptions, out-of-order data) is handled inside the
/// crates that own it and never reaches here.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("trial extraction failed")]
    Extract(#[from] trialzone_extract::ExtractError),

    #[error("sink failed")]
    Sink(#[from] trialzone_sink::SinkError),
}
