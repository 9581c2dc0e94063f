use std::path::Path;

use crate::error::SinkError;
use crate::hdf5_sink::HierarchicalBinarySink;
use crate::json_lines::JsonLinesSink;
use crate::sink::TrialSink;

/// Picks a sink implementation by the output path's extension.
pub fn open_sink(path: impl AsRef<Path>) -> Result<Box<dyn TrialSink>, SinkError> {
    let path = path.as_ref();
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") | Some("jsonl") => Ok(Box::new(JsonLinesSink::create(path)?)),
        Some("h5") | Some("hdf5") | Some("hdf") | Some("he5") => {
            Ok(Box::new(HierarchicalBinarySink::create(path)?))
        }
        other => Err(SinkError::Unsupported {
            format: match other {
                None => "<none>",
                Some(_) => "unknown",
            },
        }),
    }
}
