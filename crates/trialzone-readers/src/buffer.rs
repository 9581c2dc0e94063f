use trialzone_core::{
    shift_numeric_times, shift_signal_times, shift_text_times, BufferKind, NumericEventBuffer,
    NumericRow, SignalBuffer, SignalChunk, TextEventBuffer, TextRow,
};
use trialzone_transform::RawPiece;

use crate::error::RouteError;

/// An independent, time-shifted copy of one buffer's query result, tagged
/// by the variety it came from.
#[derive(Debug, Clone, PartialEq)]
pub enum AnySnapshot {
    Numeric(Vec<NumericRow>),
    Text(Vec<TextRow>),
    Signal(Vec<SignalChunk>),
}

/// A buffer of unknown-until-runtime variety, owned by exactly one
/// [`crate::RouterEntry`].
#[derive(Debug)]
pub enum AnyBuffer {
    Numeric(NumericEventBuffer),
    Text(TextEventBuffer),
    Signal(SignalBuffer),
}

impl AnyBuffer {
    pub fn name(&self) -> &str {
        match self {
            AnyBuffer::Numeric(b) => b.name(),
            AnyBuffer::Text(b) => b.name(),
            AnyBuffer::Signal(b) => b.name(),
        }
    }

    pub fn end_time(&self) -> f64 {
        match self {
            AnyBuffer::Numeric(b) => b.end_time(),
            AnyBuffer::Text(b) => b.end_time(),
            AnyBuffer::Signal(b) => b.end_time(),
        }
    }

    pub fn kind(&self) -> BufferKind {
        match self {
            AnyBuffer::Numeric(_) => BufferKind::NumericEvent,
            AnyBuffer::Text(_) => BufferKind::TextEvent,
            AnyBuffer::Signal(_) => BufferKind::Signal,
        }
    }

    /// `(sample_frequency, channel_ids)` for a signal buffer, used to
    /// populate a trial's `TrialSignal` metadata alongside its shifted
    /// chunks. `None` for non-signal buffers or an empty signal buffer.
    pub fn signal_metadata(&self) -> Option<(f64, &[String])> {
        match self {
            AnyBuffer::Signal(b) => b.frequency().map(|f| (f, b.channel_ids())),
            _ => None,
        }
    }

    pub fn discard_before(&mut self, t: f64) {
        match self {
            AnyBuffer::Numeric(b) => b.discard_before(t),
            AnyBuffer::Text(b) => b.discard_before(t),
            AnyBuffer::Signal(b) => b.discard_before(t),
        }
    }

    /// Queries `[a, b)` in this buffer's own clock and subtracts `shift`
    /// from every resulting timestamp in one pass. Callers pass `wrt_time
    /// minus offset` to land results at local zero in a single combined
    /// step.
    pub fn query_and_shift(&self, a: f64, b: f64, shift: f64) -> AnySnapshot {
        match self {
            AnyBuffer::Numeric(buf) => {
                let mut rows = buf.query(a, b);
                shift_numeric_times(&mut rows, shift);
                AnySnapshot::Numeric(rows)
            }
            AnyBuffer::Text(buf) => {
                let mut rows = buf.query(a, b);
                shift_text_times(&mut rows, shift);
                AnySnapshot::Text(rows)
            }
            AnyBuffer::Signal(buf) => {
                let mut chunks = buf.query(a, b);
                shift_signal_times(&mut chunks, shift);
                AnySnapshot::Signal(chunks)
            }
        }
    }

    /// Appends one reader-result piece. A piece whose shape does not match
    /// this buffer's variety is reported the same way an out-of-order
    /// append is: the caller logs and discards.
    pub fn append_piece(&mut self, piece: &RawPiece) -> Result<(), RouteError> {
        match (self, piece) {
            (AnyBuffer::Numeric(buf), RawPiece::Numeric(rows)) => {
                Ok(buf.append(rows.clone())?)
            }
            (AnyBuffer::Text(buf), RawPiece::Text(rows)) => Ok(buf.append(rows.clone())?),
            (
                AnyBuffer::Signal(buf),
                RawPiece::Signal {
                    t0,
                    frequency,
                    channel_ids,
                    samples,
                },
            ) => Ok(buf.append(*t0, *frequency, channel_ids, samples.clone())?),
            (other, _) => Err(RouteError::KindMismatch {
                buffer: other.name().to_string(),
            }),
        }
    }
}
