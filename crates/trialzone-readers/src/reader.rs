use std::collections::HashMap;

use trialzone_transform::RawPiece;

use crate::error::ReaderError;

/// Result of one `read_next` pull cycle.
#[derive(Debug)]
pub enum ReadOutcome {
    /// New data for one or more named pieces (reader-result names, not yet
    /// routed to buffers).
    Data(HashMap<String, RawPiece>),
    /// No new data is available this cycle, but the source is still live
    /// (e.g. a soft pull timeout).
    Idle,
    EndOfStream,
}

/// One external data source. Implementations own their own I/O state;
/// the [`crate::Router`] drives them one cycle at a time.
pub trait Reader: Send {
    fn read_next(&mut self) -> Result<ReadOutcome, ReaderError>;

    /// Human-readable name used in error messages and log lines.
    fn name(&self) -> &str;
}
