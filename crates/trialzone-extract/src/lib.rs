#![forbid(unsafe_code)]

mod delimiter;
mod error;
mod extractor;
mod lookup;
mod sync_collect;
mod wrt;

pub use delimiter::{Delimiter, TrialWindow};
pub use error::ExtractError;
pub use extractor::{Extractor, ExtractorConfig};
pub use lookup::{all_buffers, discard_all_before, find_buffer};
pub use sync_collect::SyncCollector;
pub use wrt::{resolve_wrt, WrtConfig};
