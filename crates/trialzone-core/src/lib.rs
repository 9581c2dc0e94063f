#![forbid(unsafe_code)]

//! The Neutral Zone: typed, time-ordered buffers and the `Trial` record they
//! are sliced into. Every other crate in the workspace builds on these
//! types; none of them reach back into reader/sink/config concerns.

mod error;
mod id;
mod numeric;
mod signal;
mod text;
mod trial;

pub use error::BufferError;
pub use id::{BufferId, BufferKind};
pub use numeric::{shift_times as shift_numeric_times, NumericEventBuffer, NumericRow};
pub use signal::{shift_times as shift_signal_times, SignalBuffer, SignalChunk};
pub use text::{shift_times as shift_text_times, TextEventBuffer, TextRow};
pub use trial::{Trial, TrialSignal};
