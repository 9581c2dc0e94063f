#![forbid(unsafe_code)]

mod error;
mod factory;
mod format;
mod hdf5_sink;
mod json_lines;
mod sink;

pub use error::SinkError;
pub use factory::open_sink;
pub use format::trial_to_json;
pub use hdf5_sink::HierarchicalBinarySink;
pub use json_lines::JsonLinesSink;
pub use sink::TrialSink;
