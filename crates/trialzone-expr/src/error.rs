use thiserror::Error;

/// Expression problems surface as config errors: parsing happens once, at
/// config load, so a malformed expression never surprises a running trial
/// extraction.
#[derive(Debug, Error, PartialEq)]
pub enum ExprError {
    #[error("unexpected character '{0}' at position {1}")]
    UnexpectedChar(char, usize),

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("expected {expected}, found '{found}'")]
    Expected { expected: &'static str, found: String },

    #[error("unknown accessor '.{0}()'")]
    UnknownAccessor(String),

    #[error("trailing input after expression: '{0}'")]
    TrailingInput(String),
}
