use std::path::{Path, PathBuf};

use trialzone_core::Trial;

use crate::error::SinkError;
use crate::sink::TrialSink;

/// One HDF5 group per trial, named by zero-padded index.
#[cfg(feature = "hdf5")]
pub struct HierarchicalBinarySink {
    file: hdf5::File,
    count: usize,
}

#[cfg(feature = "hdf5")]
impl HierarchicalBinarySink {
    pub fn create(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let file = hdf5::File::create(path.as_ref()).map_err(|e| SinkError::Hdf5 { message: e.to_string() })?;
        Ok(Self { file, count: 0 })
    }

    fn group_name(index: usize) -> String {
        format!("{index:06}")
    }

    fn write_group(&self, name: &str, trial: &Trial) -> Result<(), SinkError> {
        let group = self
            .file
            .create_group(name)
            .map_err(|e| SinkError::Hdf5 { message: e.to_string() })?;

        write_attr(&group, "start_time", trial.start_time)?;
        write_attr(&group, "end_time", trial.end_time.unwrap_or(f64::NAN))?;
        write_attr(&group, "wrt_time", trial.wrt_time)?;
        write_json_attr(&group, "enhancements", &serde_json::Value::Object(trial.enhancements.clone()))?;
        write_json_attr(&group, "enhancement_categories", &serde_json::json!(trial.enhancement_categories))?;

        let numeric = group
            .create_group("numeric_events")
            .map_err(|e| SinkError::Hdf5 { message: e.to_string() })?;
        for (name, rows) in &trial.numeric_events {
            if rows.is_empty() {
                continue;
            }
            let arity = rows[0].values.len();
            let mut flat = Vec::with_capacity(rows.len() * (arity + 1));
            for row in rows {
                flat.push(row.t);
                flat.extend(&row.values);
            }
            numeric
                .new_dataset::<f64>()
                .shape((rows.len(), arity + 1))
                .create(name.as_str())
                .and_then(|ds| ds.write_raw(&flat))
                .map_err(|e| SinkError::Hdf5 { message: e.to_string() })?;
        }

        let text = group
            .create_group("text_events")
            .map_err(|e| SinkError::Hdf5 { message: e.to_string() })?;
        for (name, rows) in &trial.text_events {
            let sub = text
                .create_group(name)
                .map_err(|e| SinkError::Hdf5 { message: e.to_string() })?;
            let timestamps: Vec<f64> = rows.iter().map(|r| r.t).collect();
            sub.new_dataset::<f64>()
                .shape(timestamps.len())
                .create("timestamp_data")
                .and_then(|ds| ds.write_raw(&timestamps))
                .map_err(|e| SinkError::Hdf5 { message: e.to_string() })?;
            let texts: Vec<hdf5::types::VarLenUnicode> = rows
                .iter()
                .map(|r| r.text.parse().unwrap_or_default())
                .collect();
            sub.new_dataset::<hdf5::types::VarLenUnicode>()
                .shape(texts.len())
                .create("text_data")
                .and_then(|ds| ds.write_raw(&texts))
                .map_err(|e| SinkError::Hdf5 { message: e.to_string() })?;
        }

        let signals = group
            .create_group("signals")
            .map_err(|e| SinkError::Hdf5 { message: e.to_string() })?;
        for (name, signal) in &trial.signals {
            let channels = signal.channel_ids.len().max(1);
            let mut samples = Vec::new();
            let mut n_samples = 0usize;
            let first_sample_time = signal.chunks.first().map(|c| c.t0).unwrap_or(0.0);
            for chunk in &signal.chunks {
                samples.extend(&chunk.samples);
                n_samples += chunk.n();
            }
            let ds = signals
                .new_dataset::<f64>()
                .shape((n_samples, channels))
                .create(name.as_str())
                .map_err(|e| SinkError::Hdf5 { message: e.to_string() })?;
            ds.write_raw(&samples).map_err(|e| SinkError::Hdf5 { message: e.to_string() })?;
            write_attr(&ds, "sample_frequency", signal.sample_frequency)?;
            write_attr(&ds, "first_sample_time", first_sample_time)?;
            write_json_attr(&ds, "channel_ids", &serde_json::json!(signal.channel_ids))?;
        }

        Ok(())
    }
}

#[cfg(feature = "hdf5")]
fn write_attr<T: hdf5::Location>(location: &T, name: &str, value: f64) -> Result<(), SinkError> {
    location
        .new_attr::<f64>()
        .create(name)
        .and_then(|attr| attr.write_scalar(&value))
        .map_err(|e| SinkError::Hdf5 { message: e.to_string() })
}

#[cfg(feature = "hdf5")]
fn write_json_attr<T: hdf5::Location>(location: &T, name: &str, value: &serde_json::Value) -> Result<(), SinkError> {
    let encoded: hdf5::types::VarLenUnicode = value.to_string().parse().unwrap_or_default();
    location
        .new_attr::<hdf5::types::VarLenUnicode>()
        .create(name)
        .and_then(|attr| attr.write_scalar(&encoded))
        .map_err(|e| SinkError::Hdf5 { message: e.to_string() })
}

#[cfg(feature = "hdf5")]
impl TrialSink for HierarchicalBinarySink {
    fn write(&mut self, trial: &Trial) -> Result<(), SinkError> {
        let name = Self::group_name(self.count);
        let result = self.write_group(&name, trial);
        if result.is_err() {
            tracing::warn!("trial group write failed, retrying once");
            self.write_group(&name, trial)
                .map_err(|e| SinkError::Fatal {
                    secondary_path: PathBuf::from(format!("{name}.recovery.json")),
                    source: std::io::Error::new(std::io::ErrorKind::Other, e.to_string()),
                })?;
        }
        self.count += 1;
        Ok(())
    }

    fn rewrite(&mut self, index: usize, trial: &Trial) -> Result<(), SinkError> {
        let name = Self::group_name(index);
        if self.file.group(&name).is_ok() {
            self.file
                .unlink(&name)
                .map_err(|e| SinkError::Hdf5 { message: e.to_string() })?;
        }
        self.write_group(&name, trial)
    }

    fn close(&mut self) -> Result<(), SinkError> {
        self.file.flush().map_err(|e| SinkError::Hdf5 { message: e.to_string() })
    }
}

/// Stand-in when the crate is built without the `hdf5` feature: the
/// constructor fails at runtime instead of the crate failing to compile.
#[cfg(not(feature = "hdf5"))]
pub struct HierarchicalBinarySink;

#[cfg(not(feature = "hdf5"))]
impl HierarchicalBinarySink {
    pub fn create(_path: impl AsRef<Path>) -> Result<Self, SinkError> {
        Err(SinkError::Unsupported { format: "hdf5" })
    }
}

#[cfg(not(feature = "hdf5"))]
impl TrialSink for HierarchicalBinarySink {
    fn write(&mut self, _trial: &Trial) -> Result<(), SinkError> {
        Err(SinkError::Unsupported { format: "hdf5" })
    }

    fn rewrite(&mut self, _index: usize, _trial: &Trial) -> Result<(), SinkError> {
        Err(SinkError::Unsupported { format: "hdf5" })
    }

    fn close(&mut self) -> Result<(), SinkError> {
        Err(SinkError::Unsupported { format: "hdf5" })
    }
}
