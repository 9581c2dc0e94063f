use tracing::warn;
use trialzone_transform::Pipeline;

use crate::buffer::AnyBuffer;
use crate::error::ReaderError;
use crate::reader::{ReadOutcome, Reader};

const MAX_RETRIES: u32 = 3;

/// A derived buffer fed by a transformer pipeline running on the primary
/// buffer's incremental result each cycle.
pub struct DerivedEntry {
    pub pipeline: Pipeline,
    pub buffer: AnyBuffer,
}

/// One reader and the buffers it exclusively owns.
pub struct RouterEntry {
    reader: Box<dyn Reader>,
    primary: AnyBuffer,
    derived: Vec<DerivedEntry>,
    exhausted: bool,
    retry_attempt: u32,
}

impl RouterEntry {
    pub fn new(reader: Box<dyn Reader>, primary: AnyBuffer, derived: Vec<DerivedEntry>) -> Self {
        Self {
            reader,
            primary,
            derived,
            exhausted: false,
            retry_attempt: 0,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn primary(&self) -> &AnyBuffer {
        &self.primary
    }

    pub fn primary_mut(&mut self) -> &mut AnyBuffer {
        &mut self.primary
    }

    pub fn derived_mut(&mut self) -> &mut [DerivedEntry] {
        &mut self.derived
    }

    pub fn reader_name(&self) -> &str {
        self.reader.name()
    }

    pub fn derived(&self) -> &[DerivedEntry] {
        &self.derived
    }

    /// The minimum `end_time()` across this reader's primary and derived
    /// buffers, used by the extractor's readiness check.
    pub fn end_time(&self) -> f64 {
        self.derived
            .iter()
            .map(|d| d.buffer.end_time())
            .fold(self.primary.end_time(), f64::min)
    }

    /// Pulls one cycle from the reader, retrying `Retryable` failures with
    /// capped exponential backoff. Returns without effect once the reader
    /// is exhausted.
    pub fn advance(&mut self) {
        if self.exhausted {
            return;
        }
        loop {
            match self.reader.read_next() {
                Ok(ReadOutcome::EndOfStream) => {
                    self.exhausted = true;
                    return;
                }
                Ok(ReadOutcome::Idle) => {
                    self.retry_attempt = 0;
                    return;
                }
                Ok(ReadOutcome::Data(pieces)) => {
                    self.retry_attempt = 0;
                    for (_, piece) in pieces {
                        self.route_piece(&piece);
                    }
                    return;
                }
                Err(ReaderError::Retryable { source_name, message }) => {
                    self.retry_attempt += 1;
                    if self.retry_attempt > MAX_RETRIES {
                        warn!(
                            reader = %source_name,
                            "exhausted retry budget ({MAX_RETRIES} attempts), marking reader permanently failed: {message}"
                        );
                        self.exhausted = true;
                        return;
                    }
                    warn!(
                        reader = %source_name,
                        attempt = self.retry_attempt,
                        "transient read failure, retrying: {message}"
                    );
                    // Backoff is informational here: callers pace cycles
                    // themselves in a single-threaded cooperative loop.
                    continue;
                }
                Err(ReaderError::Permanent { source_name, message }) => {
                    warn!(reader = %source_name, "permanent read failure, reader exhausted: {message}");
                    self.exhausted = true;
                    return;
                }
            }
        }
    }

    fn route_piece(&mut self, piece: &trialzone_transform::RawPiece) {
        if let Err(err) = self.primary.append_piece(piece) {
            warn!(buffer = self.primary.name(), "discarding piece: {err}");
            return;
        }
        for derived in &mut self.derived {
            match derived.pipeline.run(piece.clone()) {
                Ok(transformed) => {
                    if let Err(err) = derived.buffer.append_piece(&transformed) {
                        warn!(buffer = derived.buffer.name(), "discarding derived piece: {err}");
                    }
                }
                Err(err) => {
                    warn!(buffer = derived.buffer.name(), "transformer pipeline failed: {err}");
                }
            }
        }
    }
}

/// Drives every owned reader one cycle at a time, in declared order:
/// readers are polled in a deterministic order each cycle.
#[derive(Default)]
pub struct Router {
    entries: Vec<RouterEntry>,
}

impl Router {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn add_reader(&mut self, entry: RouterEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[RouterEntry] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut [RouterEntry] {
        &mut self.entries
    }

    pub fn entry(&self, index: usize) -> &RouterEntry {
        &self.entries[index]
    }

    pub fn entry_mut(&mut self, index: usize) -> &mut RouterEntry {
        &mut self.entries[index]
    }

    pub fn all_exhausted(&self) -> bool {
        self.entries.iter().all(|e| e.is_exhausted())
    }

    /// Advances every reader exactly once, in order.
    pub fn advance_all(&mut self) {
        for entry in &mut self.entries {
            entry.advance();
        }
    }

    /// The minimum `end_time()` across every owned buffer, used by the
    /// extractor's readiness wait.
    pub fn min_end_time(&self) -> f64 {
        self.entries
            .iter()
            .map(RouterEntry::end_time)
            .fold(f64::INFINITY, f64::min)
    }
}
