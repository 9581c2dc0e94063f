use thiserror::Error;

/// Sync Registry construction/lookup failures. These surface as config
/// errors: a malformed sync topology is fatal at load time, not discovered
/// mid-run.
#[derive(Debug, Error, PartialEq)]
pub enum SyncError {
    #[error("sync registry has no reader declared as `is_reference`")]
    NoReferenceReader,

    #[error("sync registry has more than one reader declared as `is_reference`: {0:?}")]
    MultipleReferenceReaders(Vec<String>),

    #[error("reader '{0}' is not registered in the sync registry")]
    UnknownReader(String),

    #[error("reader '{reader}' inherits sync from '{inherits_from}', which has no own descriptor")]
    DanglingInheritance { reader: String, inherits_from: String },
}
