use std::collections::HashMap;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};
use trialzone_transform::RawPiece;

use crate::error::ReaderError;
use crate::reader::{ReadOutcome, Reader};

/// Demonstrates the background-I/O handoff point for a live source: a
/// producer task (not modeled here; tests feed the sender directly) hands
/// new pieces to the main loop through a bounded channel. `read_next` is the
/// suspension boundary; it blocks for at most `poll_timeout` before
/// reporting "no data this cycle" rather than marking the reader exhausted.
pub struct SimulatedLiveReader {
    name: String,
    rx: Receiver<HashMap<String, RawPiece>>,
    poll_timeout: Duration,
    /// When set, `gui` mode paces extraction to wall-clock time instead of
    /// draining the channel as fast as possible.
    pub simulate_delay: bool,
}

impl SimulatedLiveReader {
    pub fn new(name: impl Into<String>, rx: Receiver<HashMap<String, RawPiece>>) -> Self {
        Self {
            name: name.into(),
            rx,
            poll_timeout: Duration::from_secs(1),
            simulate_delay: false,
        }
    }

    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    pub fn with_simulate_delay(mut self, on: bool) -> Self {
        self.simulate_delay = on;
        self
    }
}

impl Reader for SimulatedLiveReader {
    fn read_next(&mut self) -> Result<ReadOutcome, ReaderError> {
        match self.rx.recv_timeout(self.poll_timeout) {
            Ok(pieces) => Ok(ReadOutcome::Data(pieces)),
            Err(RecvTimeoutError::Timeout) => Ok(ReadOutcome::Idle),
            Err(RecvTimeoutError::Disconnected) => Ok(ReadOutcome::EndOfStream),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trialzone_core::NumericRow;

    #[test]
    fn timeout_reports_idle_without_exhausting() {
        let (_tx, rx) = crossbeam_channel::bounded(1);
        let mut reader =
            SimulatedLiveReader::new("live", rx).with_poll_timeout(Duration::from_millis(5));
        assert!(matches!(reader.read_next().unwrap(), ReadOutcome::Idle));
    }

    #[test]
    fn disconnect_reports_end_of_stream() {
        let (tx, rx) = crossbeam_channel::bounded::<HashMap<String, RawPiece>>(1);
        drop(tx);
        let mut reader = SimulatedLiveReader::new("live", rx);
        assert!(matches!(reader.read_next().unwrap(), ReadOutcome::EndOfStream));
    }

    #[test]
    fn delivers_data_pushed_from_producer() {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let mut pieces = HashMap::new();
        pieces.insert("bar".to_string(), RawPiece::Numeric(vec![NumericRow::new(0.0, vec![1.0])]));
        tx.send(pieces).unwrap();
        let mut reader = SimulatedLiveReader::new("live", rx);
        assert!(matches!(reader.read_next().unwrap(), ReadOutcome::Data(_)));
    }
}
