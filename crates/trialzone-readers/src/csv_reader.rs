use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use trialzone_core::{NumericRow, TextRow};
use trialzone_transform::RawPiece;

use crate::error::ReaderError;
use crate::reader::{ReadOutcome, Reader};

/// Reads a CSV of `t, v0, v1, ...` rows and emits them as one numeric event
/// piece per call, arity fixed by the header's column count minus one. The
/// whole file is read eagerly; pulls replay it one row-batch at a time so
/// the router's per-cycle model still applies to file-backed sources.
pub struct CsvNumericEventReader {
    name: String,
    piece_name: String,
    rows: std::vec::IntoIter<NumericRow>,
    batch_size: usize,
}

impl CsvNumericEventReader {
    pub fn open(name: impl Into<String>, piece_name: impl Into<String>, path: impl AsRef<Path>) -> Result<Self, ReaderError> {
        let name = name.into();
        let path: PathBuf = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| ReaderError::Permanent {
            source_name: name.clone(),
            message: format!("opening {}: {e}", path.display()),
        })?;
        let mut reader = csv::ReaderBuilder::new().has_headers(false).from_reader(file);
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| ReaderError::Permanent {
                source_name: name.clone(),
                message: format!("reading csv row: {e}"),
            })?;
            let mut fields = record.iter();
            let t: f64 = fields
                .next()
                .ok_or_else(|| ReaderError::Permanent {
                    source_name: name.clone(),
                    message: "empty row".to_string(),
                })?
                .parse()
                .map_err(|e| ReaderError::Permanent {
                    source_name: name.clone(),
                    message: format!("parsing timestamp: {e}"),
                })?;
            let values: Result<Vec<f64>, _> = fields.map(|v| v.parse::<f64>()).collect();
            let values = values.map_err(|e| ReaderError::Permanent {
                source_name: name.clone(),
                message: format!("parsing value column: {e}"),
            })?;
            rows.push(NumericRow::new(t, values));
        }
        Ok(Self {
            name,
            piece_name: piece_name.into(),
            rows: rows.into_iter(),
            batch_size: 1,
        })
    }

    pub fn with_batch_size(mut self, n: usize) -> Self {
        self.batch_size = n.max(1);
        self
    }
}

impl Reader for CsvNumericEventReader {
    fn read_next(&mut self) -> Result<ReadOutcome, ReaderError> {
        let batch: Vec<NumericRow> = (&mut self.rows).take(self.batch_size).collect();
        if batch.is_empty() {
            return Ok(ReadOutcome::EndOfStream);
        }
        let mut pieces = HashMap::new();
        pieces.insert(self.piece_name.clone(), RawPiece::Numeric(batch));
        Ok(ReadOutcome::Data(pieces))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Reads a CSV of `t, text` rows and emits them as one text event piece per
/// call.
pub struct CsvTextEventReader {
    name: String,
    piece_name: String,
    rows: std::vec::IntoIter<TextRow>,
    batch_size: usize,
}

impl CsvTextEventReader {
    pub fn open(name: impl Into<String>, piece_name: impl Into<String>, path: impl AsRef<Path>) -> Result<Self, ReaderError> {
        let name = name.into();
        let path: PathBuf = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| ReaderError::Permanent {
            source_name: name.clone(),
            message: format!("opening {}: {e}", path.display()),
        })?;
        let mut reader = csv::ReaderBuilder::new().has_headers(false).from_reader(file);
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| ReaderError::Permanent {
                source_name: name.clone(),
                message: format!("reading csv row: {e}"),
            })?;
            let t: f64 = record
                .get(0)
                .ok_or_else(|| ReaderError::Permanent {
                    source_name: name.clone(),
                    message: "empty row".to_string(),
                })?
                .parse()
                .map_err(|e| ReaderError::Permanent {
                    source_name: name.clone(),
                    message: format!("parsing timestamp: {e}"),
                })?;
            let text = record
                .get(1)
                .ok_or_else(|| ReaderError::Permanent {
                    source_name: name.clone(),
                    message: "missing text column".to_string(),
                })?
                .to_string();
            rows.push(TextRow::new(t, text));
        }
        Ok(Self {
            name,
            piece_name: piece_name.into(),
            rows: rows.into_iter(),
            batch_size: 1,
        })
    }

    pub fn with_batch_size(mut self, n: usize) -> Self {
        self.batch_size = n.max(1);
        self
    }
}

impl Reader for CsvTextEventReader {
    fn read_next(&mut self) -> Result<ReadOutcome, ReaderError> {
        let batch: Vec<TextRow> = (&mut self.rows).take(self.batch_size).collect();
        if batch.is_empty() {
            return Ok(ReadOutcome::EndOfStream);
        }
        let mut pieces = HashMap::new();
        pieces.insert(self.piece_name.clone(), RawPiece::Text(batch));
        Ok(ReadOutcome::Data(pieces))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn numeric_reader_replays_rows_in_batches() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "0.1,1").unwrap();
        writeln!(file, "3.1,0").unwrap();
        let mut reader = CsvNumericEventReader::open("bar", "bar", file.path()).unwrap();
        let outcome = reader.read_next().unwrap();
        match outcome {
            ReadOutcome::Data(pieces) => {
                let piece = &pieces["bar"];
                assert_eq!(piece, &RawPiece::Numeric(vec![NumericRow::new(0.1, vec![1.0])]));
            }
            _ => panic!("expected data"),
        }
        assert!(matches!(reader.read_next().unwrap(), ReadOutcome::Data(_)));
        assert!(matches!(reader.read_next().unwrap(), ReadOutcome::EndOfStream));
    }

    #[test]
    fn text_reader_parses_timestamp_and_text_columns() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "0.2,red").unwrap();
        let mut reader = CsvTextEventReader::open("foo", "foo", file.path()).unwrap();
        match reader.read_next().unwrap() {
            ReadOutcome::Data(pieces) => {
                assert_eq!(pieces["foo"], RawPiece::Text(vec![TextRow::new(0.2, "red")]));
            }
            _ => panic!("expected data"),
        }
    }
}
