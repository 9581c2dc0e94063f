use thiserror::Error;
use trialzone_core::BufferId;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("buffer '{0:?}' referenced by the extractor configuration does not exist")]
    UnknownBuffer(BufferId),

    #[error("start buffer '{0:?}' is not a numeric event buffer")]
    StartBufferNotNumeric(BufferId),
}
