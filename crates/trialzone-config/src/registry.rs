use std::path::Path;

use trialzone_enhance::{Collecter, Duration, Enhancer, Expression, SignalNormalizer, SignalSmoother};
use trialzone_expr::parse as parse_expr;
use trialzone_readers::{AnyBuffer, CsvNumericEventReader, CsvTextEventReader, Reader};
use trialzone_sync::SyncDescriptor;
use trialzone_transform::{FillMode, FilterRange, OffsetThenGain, RangePredicate, SparseSignal, Transformer};

use crate::args::{
    optional_f64, optional_str, optional_usize, reject_unknown_args, require_f64, require_str,
    require_str_list, require_usize, require_usize_list,
};
use crate::doc::{ComponentDoc, ReaderDoc, SyncDoc, TransformerDoc};
use crate::error::ConfigError;

/// Builds a reference reader and its primary buffer by class name.
///
/// Each reader owns exactly one primary buffer fed from the single piece
/// it emits per pull; derived buffers (`extra_buffers`) are built
/// separately and wired onto the same piece, matching the router's actual
/// routing behavior rather than a hypothetical multi-piece reader.
pub fn build_reader(name: &str, doc: &ReaderDoc, search_path: Option<&Path>) -> Result<(Box<dyn Reader>, AnyBuffer), ConfigError> {
    match doc.class.as_str() {
        "csv_numeric" => {
            reject_unknown_args(&doc.args, &doc.class, &["path", "piece_name", "batch_size"])?;
            let path = resolve_path(require_str(&doc.args, &doc.class, "path")?, search_path);
            let piece_name = optional_str(&doc.args, &doc.class, "piece_name")?.unwrap_or(name).to_string();
            let batch_size = optional_usize(&doc.args, &doc.class, "batch_size", 1)?;
            let reader = CsvNumericEventReader::open(name, piece_name, &path)
                .map_err(|e| ConfigError::ReaderOpen(name.to_string(), e))?
                .with_batch_size(batch_size);
            let buffer = AnyBuffer::Numeric(trialzone_core::NumericEventBuffer::new(name));
            Ok((Box::new(reader), buffer))
        }
        "csv_text" => {
            reject_unknown_args(&doc.args, &doc.class, &["path", "piece_name", "batch_size"])?;
            let path = resolve_path(require_str(&doc.args, &doc.class, "path")?, search_path);
            let piece_name = optional_str(&doc.args, &doc.class, "piece_name")?.unwrap_or(name).to_string();
            let batch_size = optional_usize(&doc.args, &doc.class, "batch_size", 1)?;
            let reader = CsvTextEventReader::open(name, piece_name, &path)
                .map_err(|e| ConfigError::ReaderOpen(name.to_string(), e))?
                .with_batch_size(batch_size);
            let buffer = AnyBuffer::Text(trialzone_core::TextEventBuffer::new(name));
            Ok((Box::new(reader), buffer))
        }
        other => Err(ConfigError::UnknownClass {
            kind: "reader",
            class: other.to_string(),
        }),
    }
}

/// Builds the buffer a derived `extra_buffers` entry writes into. Its
/// variety follows the last transformer's output shape; `sparse_signal` is
/// the only transformer that produces a signal, so it alone yields a
/// `Signal` buffer.
pub fn build_derived_buffer(name: &str, transformers: &[TransformerDoc]) -> AnyBuffer {
    if transformers.last().map(|t| t.class == "sparse_signal").unwrap_or(false) {
        AnyBuffer::Signal(trialzone_core::SignalBuffer::new(name))
    } else {
        AnyBuffer::Numeric(trialzone_core::NumericEventBuffer::new(name))
    }
}

pub fn build_transformer(doc: &TransformerDoc) -> Result<Box<dyn Transformer + Send + Sync>, ConfigError> {
    match doc.class.as_str() {
        "offset_then_gain" => {
            reject_unknown_args(&doc.args, &doc.class, &["offset", "gain", "columns"])?;
            let offset = optional_f64(&doc.args, &doc.class, "offset", 0.0)?;
            let gain = optional_f64(&doc.args, &doc.class, "gain", 1.0)?;
            let mut xf = OffsetThenGain::new(offset, gain);
            if doc.args.contains_key("columns") {
                xf = xf.on_columns(require_usize_list(&doc.args, &doc.class, "columns")?);
            }
            Ok(Box::new(xf))
        }
        "filter_range" => {
            reject_unknown_args(&doc.args, &doc.class, &["column", "equals", "min", "max"])?;
            let column = require_usize(&doc.args, &doc.class, "column")?;
            let predicate = if doc.args.contains_key("equals") {
                RangePredicate::Equals(require_f64(&doc.args, &doc.class, "equals")?)
            } else {
                RangePredicate::Between {
                    min: require_f64(&doc.args, &doc.class, "min")?,
                    max: require_f64(&doc.args, &doc.class, "max")?,
                }
            };
            Ok(Box::new(FilterRange::new(column, predicate)))
        }
        "sparse_signal" => {
            reject_unknown_args(&doc.args, &doc.class, &["sample_frequency", "channel_ids", "fill", "constant_value"])?;
            let sample_frequency = require_f64(&doc.args, &doc.class, "sample_frequency")?;
            let channel_ids = require_str_list(&doc.args, &doc.class, "channel_ids")?;
            let fill = match optional_str(&doc.args, &doc.class, "fill")?.unwrap_or("linear") {
                "linear" => FillMode::Linear,
                "constant" => FillMode::Constant(require_f64(&doc.args, &doc.class, "constant_value")?),
                _ => {
                    return Err(ConfigError::WrongFieldType {
                        class: doc.class.clone(),
                        key: "fill".to_string(),
                        expected: "\"linear\" or \"constant\"",
                    })
                }
            };
            Ok(Box::new(SparseSignal::new(sample_frequency, channel_ids, fill)))
        }
        other => Err(ConfigError::UnknownClass {
            kind: "transformer",
            class: other.to_string(),
        }),
    }
}

pub fn build_enhancer(doc: &ComponentDoc) -> Result<Box<dyn Enhancer>, ConfigError> {
    match doc.class.as_str() {
        "duration" => {
            reject_unknown_args(&doc.args, &doc.class, &[])?;
            Ok(Box::new(Duration))
        }
        "signal_smoother" => {
            reject_unknown_args(&doc.args, &doc.class, &["signal_name", "window"])?;
            Ok(Box::new(SignalSmoother {
                signal_name: require_str(&doc.args, &doc.class, "signal_name")?.to_string(),
                window: require_usize(&doc.args, &doc.class, "window")?,
            }))
        }
        "expression" => {
            reject_unknown_args(&doc.args, &doc.class, &["output_name", "expr"])?;
            let output_name = require_str(&doc.args, &doc.class, "output_name")?.to_string();
            let expr_src = require_str(&doc.args, &doc.class, "expr")?;
            let expr = parse_expr(expr_src).map_err(|e| ConfigError::Expr {
                location: format!("enhancer '{}' expr", doc.class),
                source: e,
            })?;
            let when = match &doc.when {
                Some(src) => Some(parse_expr(src).map_err(|e| ConfigError::Expr {
                    location: format!("enhancer '{}' when", doc.class),
                    source: e,
                })?),
                None => None,
            };
            Ok(Box::new(Expression { output_name, expr, when }))
        }
        other => Err(ConfigError::UnknownClass {
            kind: "enhancer",
            class: other.to_string(),
        }),
    }
}

pub fn build_collecter(doc: &ComponentDoc) -> Result<Box<dyn Collecter>, ConfigError> {
    match doc.class.as_str() {
        "signal_normalizer" => {
            reject_unknown_args(&doc.args, &doc.class, &["signal_name"])?;
            Ok(Box::new(SignalNormalizer {
                signal_name: require_str(&doc.args, &doc.class, "signal_name")?.to_string(),
            }))
        }
        other => Err(ConfigError::UnknownClass {
            kind: "collecter",
            class: other.to_string(),
        }),
    }
}

/// Builds the sync descriptor for one reader, resolving its `filter`
/// expression, or an inheritance link when `reader_name` is set instead of
/// `buffer_name`.
pub fn build_sync(reader_name: &str, doc: &SyncDoc) -> Result<SyncDescriptor, ConfigError> {
    match (&doc.buffer_name, &doc.reader_name) {
        (Some(_), Some(_)) | (None, None) => Err(ConfigError::AmbiguousSync {
            reader: reader_name.to_string(),
        }),
        (None, Some(other)) => Ok(SyncDescriptor::inheriting(other.clone())),
        (Some(buffer_name), None) => {
            let predicate = match &doc.filter {
                Some(src) => parse_expr(src).map_err(|e| ConfigError::Expr {
                    location: format!("sync for reader '{reader_name}'"),
                    source: e,
                })?,
                None => trialzone_expr::Expr::Bool(true),
            };
            Ok(if doc.is_reference {
                SyncDescriptor::reference(buffer_name.clone(), predicate)
            } else {
                SyncDescriptor::owning(buffer_name.clone(), predicate)
            })
        }
    }
}

fn resolve_path(path: &str, search_path: Option<&Path>) -> std::path::PathBuf {
    let p = Path::new(path);
    if p.is_absolute() {
        return p.to_path_buf();
    }
    match search_path {
        Some(base) => base.join(p),
        None => p.to_path_buf(),
    }
}
