use std::path::Path;

use crate::doc::ExperimentDoc;
use crate::error::ConfigError;

/// Merges CLI-supplied overrides into a parsed document before any reader
/// opens, so a bad override fails the same way malformed TOML does instead
/// of surfacing later at reader construction.
pub fn apply_overrides(
    doc: &mut ExperimentDoc,
    subject: Option<&Path>,
    reader_overrides: &[String],
) -> Result<(), ConfigError> {
    if let Some(subject_path) = subject {
        merge_subject(doc, subject_path)?;
    }
    for raw in reader_overrides {
        apply_one_override(doc, raw)?;
    }
    Ok(())
}

fn merge_subject(doc: &mut ExperimentDoc, subject_path: &Path) -> Result<(), ConfigError> {
    let text = std::fs::read_to_string(subject_path).map_err(|e| ConfigError::Read {
        path: subject_path.display().to_string(),
        source: e,
    })?;
    let subject: toml::value::Table = toml::from_str(&text)?;
    for (key, value) in subject {
        doc.experiment.insert(key, value);
    }
    Ok(())
}

/// Parses `reader_name.arg_name=value` and writes the value into that
/// reader's `args` table, replacing whatever the config document set.
fn apply_one_override(doc: &mut ExperimentDoc, raw: &str) -> Result<(), ConfigError> {
    let (key_path, value) = raw.split_once('=').ok_or_else(|| ConfigError::MalformedOverride { raw: raw.to_string() })?;
    let (reader_name, arg_name) = key_path.split_once('.').ok_or_else(|| ConfigError::MalformedOverride { raw: raw.to_string() })?;

    let reader = doc.readers.get_mut(reader_name).ok_or_else(|| ConfigError::UnknownReaderOverride {
        reader: reader_name.to_string(),
    })?;
    reader.args.insert(arg_name.to_string(), parse_override_value(value));
    Ok(())
}

/// Overrides arrive as bare strings; interpret them the way a TOML scalar
/// would read, falling back to a string if they don't parse as anything
/// else.
fn parse_override_value(raw: &str) -> toml::Value {
    if let Ok(b) = raw.parse::<bool>() {
        return toml::Value::Boolean(b);
    }
    if let Ok(i) = raw.parse::<i64>() {
        return toml::Value::Integer(i);
    }
    if let Ok(f) = raw.parse::<f64>() {
        return toml::Value::Float(f);
    }
    toml::Value::String(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc::{ReaderDoc, TrialsDoc};

    fn empty_doc() -> ExperimentDoc {
        ExperimentDoc {
            experiment: toml::value::Table::new(),
            readers: {
                let mut m = std::collections::BTreeMap::new();
                m.insert(
                    "bar".to_string(),
                    ReaderDoc {
                        class: "csv_numeric".to_string(),
                        package_path: None,
                        args: toml::value::Table::new(),
                        extra_buffers: Vec::new(),
                        sync: None,
                        simulate_delay: false,
                    },
                );
                m
            },
            trials: TrialsDoc {
                start_buffer: "bar".to_string(),
                start_value: 1010.0,
                wrt_buffer: None,
                wrt_value: None,
                enhancers: Vec::new(),
                collecters: Vec::new(),
            },
            plotters: Vec::new(),
        }
    }

    #[test]
    fn overrides_numeric_arg_by_dotted_path() {
        let mut doc = empty_doc();
        apply_overrides(&mut doc, None, &["bar.batch_size=4".to_string()]).unwrap();
        assert_eq!(doc.readers["bar"].args["batch_size"], toml::Value::Integer(4));
    }

    #[test]
    fn rejects_override_for_unknown_reader() {
        let mut doc = empty_doc();
        let err = apply_overrides(&mut doc, None, &["nope.path=foo".to_string()]).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownReaderOverride { .. }));
    }

    #[test]
    fn rejects_malformed_override() {
        let mut doc = empty_doc();
        let err = apply_overrides(&mut doc, None, &["bar_no_dot_or_equals".to_string()]).unwrap_err();
        assert!(matches!(err, ConfigError::MalformedOverride { .. }));
    }
}
