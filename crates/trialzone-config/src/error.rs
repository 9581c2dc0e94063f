use thiserror::Error;
use trialzone_expr::ExprError;

/// Config-time failures. Every variant here is surfaced before the driver
/// starts: a bad document, override, or class never reaches a reader.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read '{path}'")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config")]
    Parse(#[from] toml::de::Error),

    #[error("unknown {kind} class '{class}'")]
    UnknownClass { kind: &'static str, class: String },

    #[error("{class}: unknown argument '{key}'")]
    UnknownField { class: String, key: String },

    #[error("{class}: missing required argument '{key}'")]
    MissingField { class: String, key: String },

    #[error("{class}: argument '{key}' has the wrong type, expected {expected}")]
    WrongFieldType {
        class: String,
        key: String,
        expected: &'static str,
    },

    #[error("invalid expression in {location}")]
    Expr {
        location: String,
        #[source]
        source: ExprError,
    },

    #[error("reader '{0}' failed to open")]
    ReaderOpen(String, #[source] trialzone_readers::ReaderError),

    #[error("sync descriptor for reader '{reader}' must set exactly one of buffer_name or reader_name")]
    AmbiguousSync { reader: String },

    #[error("sync registry is malformed")]
    Sync(#[from] trialzone_sync::SyncError),

    #[error("trials config references unknown buffer '{name}'")]
    UnknownBuffer { name: String },

    #[error("malformed override '{raw}', expected key=value")]
    MalformedOverride { raw: String },

    #[error("override references unknown reader '{reader}'")]
    UnknownReaderOverride { reader: String },
}
