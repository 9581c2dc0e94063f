use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum TransformError {
    #[error("transformer '{name}' does not support {kind} input")]
    UnsupportedInput { name: &'static str, kind: &'static str },

    #[error("transformer '{name}' references column {col}, but rows have arity {arity}")]
    ColumnOutOfRange {
        name: &'static str,
        col: usize,
        arity: usize,
    },
}
