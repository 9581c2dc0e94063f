use std::collections::HashMap;

use trialzone_transform::RawPiece;

use crate::error::ReaderError;
use crate::reader::{ReadOutcome, Reader};

/// Replays a pre-built sequence of pull results, one per `read_next` call.
/// Used by tests and by anything that already has its data in memory.
pub struct InMemoryReader {
    name: String,
    batches: std::vec::IntoIter<HashMap<String, RawPiece>>,
}

impl InMemoryReader {
    pub fn new(name: impl Into<String>, batches: Vec<HashMap<String, RawPiece>>) -> Self {
        Self {
            name: name.into(),
            batches: batches.into_iter(),
        }
    }
}

impl Reader for InMemoryReader {
    fn read_next(&mut self) -> Result<ReadOutcome, ReaderError> {
        match self.batches.next() {
            Some(pieces) => Ok(ReadOutcome::Data(pieces)),
            None => Ok(ReadOutcome::EndOfStream),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trialzone_core::NumericRow;

    #[test]
    fn replays_batches_then_ends_stream() {
        let mut batch = HashMap::new();
        batch.insert(
            "bar".to_string(),
            RawPiece::Numeric(vec![NumericRow::new(0.1, vec![1.0])]),
        );
        let mut reader = InMemoryReader::new("bar_reader", vec![batch]);
        assert!(matches!(reader.read_next().unwrap(), ReadOutcome::Data(_)));
        assert!(matches!(reader.read_next().unwrap(), ReadOutcome::EndOfStream));
    }
}
