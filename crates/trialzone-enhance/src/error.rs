use thiserror::Error;

/// An enhancer/collecter failure. Always caught by the pipeline runner: the
/// trial is still emitted, with enhancements populated up to the failing
/// step.
#[derive(Debug, Error)]
pub enum EnhanceError {
    #[error("enhancer '{name}' failed: {message}")]
    Enhancer { name: String, message: String },

    #[error("collecter '{name}' failed: {message}")]
    Collecter { name: String, message: String },
}
