#![forbid(unsafe_code)]

//! The top-level run loop: drives the reader router, trial extractor, and
//! sink to completion (or graceful cancellation), then runs collecters over
//! the full emitted sequence.

mod driver;
mod error;
mod summary;

pub use driver::{Driver, RunMode};
pub use error::DriverError;
pub use summary::RunSummary;
