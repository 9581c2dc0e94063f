#![forbid(unsafe_code)]

//! The Enhancer/Collecter pipeline: per-trial augmentation callbacks plus
//! deferred end-of-run callbacks with an all-trials view.

mod collecter;
mod context;
mod enhancer;
mod error;
mod standard;

pub use collecter::{run_collecters, Collecter, EnhancementUpdate};
pub use context::trial_context;
pub use enhancer::{Enhancer, EnhancerPipeline};
pub use error::EnhanceError;
pub use standard::{Duration, Expression, SignalNormalizer, SignalSmoother};
