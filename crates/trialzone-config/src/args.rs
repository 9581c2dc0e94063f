use toml::Value;

use crate::error::ConfigError;

/// Small helpers for pulling typed fields out of a component's permissive
/// `args` bag, turning the bag's looseness into the structured errors the
/// registry needs to report.

pub fn require_str<'a>(args: &'a toml::value::Table, class: &str, key: &str) -> Result<&'a str, ConfigError> {
    args.get(key)
        .ok_or_else(|| ConfigError::MissingField {
            class: class.to_string(),
            key: key.to_string(),
        })?
        .as_str()
        .ok_or_else(|| ConfigError::WrongFieldType {
            class: class.to_string(),
            key: key.to_string(),
            expected: "string",
        })
}

pub fn optional_str<'a>(args: &'a toml::value::Table, class: &str, key: &str) -> Result<Option<&'a str>, ConfigError> {
    match args.get(key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(ConfigError::WrongFieldType {
            class: class.to_string(),
            key: key.to_string(),
            expected: "string",
        }),
    }
}

pub fn require_f64(args: &toml::value::Table, class: &str, key: &str) -> Result<f64, ConfigError> {
    let value = args.get(key).ok_or_else(|| ConfigError::MissingField {
        class: class.to_string(),
        key: key.to_string(),
    })?;
    as_f64(value).ok_or_else(|| ConfigError::WrongFieldType {
        class: class.to_string(),
        key: key.to_string(),
        expected: "number",
    })
}

pub fn optional_f64(args: &toml::value::Table, class: &str, key: &str, default: f64) -> Result<f64, ConfigError> {
    match args.get(key) {
        None => Ok(default),
        Some(value) => as_f64(value).ok_or_else(|| ConfigError::WrongFieldType {
            class: class.to_string(),
            key: key.to_string(),
            expected: "number",
        }),
    }
}

pub fn require_usize(args: &toml::value::Table, class: &str, key: &str) -> Result<usize, ConfigError> {
    let value = args.get(key).ok_or_else(|| ConfigError::MissingField {
        class: class.to_string(),
        key: key.to_string(),
    })?;
    value
        .as_integer()
        .and_then(|i| usize::try_from(i).ok())
        .ok_or_else(|| ConfigError::WrongFieldType {
            class: class.to_string(),
            key: key.to_string(),
            expected: "non-negative integer",
        })
}

pub fn optional_usize(args: &toml::value::Table, class: &str, key: &str, default: usize) -> Result<usize, ConfigError> {
    match args.get(key) {
        None => Ok(default),
        Some(value) => value
            .as_integer()
            .and_then(|i| usize::try_from(i).ok())
            .ok_or_else(|| ConfigError::WrongFieldType {
                class: class.to_string(),
                key: key.to_string(),
                expected: "non-negative integer",
            }),
    }
}

pub fn require_usize_list(args: &toml::value::Table, class: &str, key: &str) -> Result<Vec<usize>, ConfigError> {
    let value = args.get(key).ok_or_else(|| ConfigError::MissingField {
        class: class.to_string(),
        key: key.to_string(),
    })?;
    let arr = value.as_array().ok_or_else(|| ConfigError::WrongFieldType {
        class: class.to_string(),
        key: key.to_string(),
        expected: "array of integers",
    })?;
    arr.iter()
        .map(|v| {
            v.as_integer()
                .and_then(|i| usize::try_from(i).ok())
                .ok_or_else(|| ConfigError::WrongFieldType {
                    class: class.to_string(),
                    key: key.to_string(),
                    expected: "array of integers",
                })
        })
        .collect()
}

pub fn require_str_list(args: &toml::value::Table, class: &str, key: &str) -> Result<Vec<String>, ConfigError> {
    let value = args.get(key).ok_or_else(|| ConfigError::MissingField {
        class: class.to_string(),
        key: key.to_string(),
    })?;
    let arr = value.as_array().ok_or_else(|| ConfigError::WrongFieldType {
        class: class.to_string(),
        key: key.to_string(),
        expected: "array of strings",
    })?;
    arr.iter()
        .map(|v| {
            v.as_str().map(str::to_string).ok_or_else(|| ConfigError::WrongFieldType {
                class: class.to_string(),
                key: key.to_string(),
                expected: "array of strings",
            })
        })
        .collect()
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Float(f) => Some(*f),
        Value::Integer(i) => Some(*i as f64),
        _ => None,
    }
}

/// Rejects any key in `args` not named in `known`, matching the fixed
/// schema each component class declares.
pub fn reject_unknown_args(args: &toml::value::Table, class: &str, known: &[&str]) -> Result<(), ConfigError> {
    for key in args.keys() {
        if !known.contains(&key.as_str()) {
            return Err(ConfigError::UnknownField {
                class: class.to_string(),
                key: key.clone(),
            });
        }
    }
    Ok(())
}
