#![forbid(unsafe_code)]

//! The Sync Registry and offset estimator: per-reader sync-event
//! collection, reference/follower pairing, and lazy per-trial offset
//! resolution.

mod descriptor;
mod error;
mod event;
mod pairing;
mod registry;

pub use descriptor::SyncDescriptor;
pub use error::SyncError;
pub use event::{SyncEvent, SyncKey};
pub use pairing::{ClosestInTime, Keyed, PairingStrategy};
pub use registry::SyncRegistry;
