use trialzone_core::Trial;

use crate::error::SinkError;

/// Destination for emitted trials. Trials are handed by move from the
/// driver; `rewrite` lets a collecter's enhancement-only rewrite reach an
/// already-written trial without re-deriving its raw data.
pub trait TrialSink {
    fn write(&mut self, trial: &Trial) -> Result<(), SinkError>;
    fn rewrite(&mut self, index: usize, trial: &Trial) -> Result<(), SinkError>;
    fn close(&mut self) -> Result<(), SinkError>;
}
