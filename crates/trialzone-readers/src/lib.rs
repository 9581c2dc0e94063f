#![forbid(unsafe_code)]

//! The reader router: per-source pull loop, fan-out into primary and
//! derived buffers, and the reference readers needed to exercise it
//! end-to-end.

mod buffer;
mod csv_reader;
mod error;
mod in_memory;
mod live;
mod reader;
mod router;

pub use buffer::{AnyBuffer, AnySnapshot};
pub use csv_reader::{CsvNumericEventReader, CsvTextEventReader};
pub use error::{ReaderError, RouteError};
pub use in_memory::InMemoryReader;
pub use live::SimulatedLiveReader;
pub use reader::{ReadOutcome, Reader};
pub use router::{DerivedEntry, Router, RouterEntry};
