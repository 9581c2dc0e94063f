#![forbid(unsafe_code)]

//! Standard transformers: pure `Buffer piece -> Buffer piece` functions that
//! the Reader Router runs on derived-buffer pipelines.

mod error;
mod piece;
mod standard;
mod transformer;

pub use error::TransformError;
pub use piece::RawPiece;
pub use standard::{FillMode, FilterRange, OffsetThenGain, RangePredicate, SparseSignal};
pub use transformer::{Pipeline, Transformer};
