use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::warn;
use trialzone_core::Trial;

use crate::error::SinkError;
use crate::format::trial_to_json;
use crate::sink::TrialSink;

fn secondary_log_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".recovery.jsonl");
    path.with_file_name(name)
}

/// One JSON object per line, trailing-newline-delimited. A truncated final
/// line (no trailing newline) is how a reader detects a crash mid-write;
/// this sink always writes the newline last and flushes before returning,
/// so a successful `write` call is durable.
///
/// `rewrite` keeps every emitted trial's JSON in memory and replaces the
/// whole file via write-temp-then-rename, since a collecter's enhancement
/// update can change a line's byte length and an append-only file offers no
/// safe in-place patch.
pub struct JsonLinesSink {
    path: PathBuf,
    writer: BufWriter<File>,
    emitted: Vec<serde_json::Value>,
}

impl JsonLinesSink {
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, SinkError> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .map_err(|source| SinkError::Open { path: path.clone(), source })?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            emitted: Vec::new(),
        })
    }

    fn append_line(&mut self, json: &serde_json::Value) -> std::io::Result<()> {
        serde_json::to_writer(&mut self.writer, json)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }

    fn drain_to_secondary(&self, json: &serde_json::Value) -> Result<PathBuf, SinkError> {
        let secondary = secondary_log_path(&self.path);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&secondary)
            .map_err(|source| SinkError::Open { path: secondary.clone(), source })?;
        let mut line = serde_json::to_vec(json).map_err(|e| SinkError::Fatal {
            secondary_path: secondary.clone(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })?;
        line.push(b'\n');
        file.write_all(&line)
            .map_err(|source| SinkError::Fatal { secondary_path: secondary.clone(), source })?;
        Ok(secondary)
    }

    fn rewrite_whole_file(&mut self) -> Result<(), SinkError> {
        let tmp_path = self.path.with_extension("jsonl.tmp");
        {
            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp_path)
                .map_err(|source| SinkError::Open { path: tmp_path.clone(), source })?;
            let mut tmp = BufWriter::new(file);
            for json in &self.emitted {
                serde_json::to_writer(&mut tmp, json).map_err(|e| SinkError::Fatal {
                    secondary_path: secondary_log_path(&self.path),
                    source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
                })?;
                tmp.write_all(b"\n")
                    .map_err(|source| SinkError::Fatal { secondary_path: secondary_log_path(&self.path), source })?;
            }
            tmp.flush()
                .map_err(|source| SinkError::Fatal { secondary_path: secondary_log_path(&self.path), source })?;
        }
        std::fs::rename(&tmp_path, &self.path)
            .map_err(|source| SinkError::Fatal { secondary_path: secondary_log_path(&self.path), source })?;
        let file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|source| SinkError::Open { path: self.path.clone(), source })?;
        self.writer = BufWriter::new(file);
        Ok(())
    }
}

impl TrialSink for JsonLinesSink {
    fn write(&mut self, trial: &Trial) -> Result<(), SinkError> {
        let json = trial_to_json(trial);
        if self.append_line(&json).is_err() {
            warn!("trial write failed, retrying once");
            if let Err(source) = self.append_line(&json) {
                let secondary_path = self.drain_to_secondary(&json)?;
                return Err(SinkError::Fatal { secondary_path, source });
            }
        }
        self.emitted.push(json);
        Ok(())
    }

    fn rewrite(&mut self, index: usize, trial: &Trial) -> Result<(), SinkError> {
        let json = trial_to_json(trial);
        if let Some(slot) = self.emitted.get_mut(index) {
            *slot = json;
        }
        self.rewrite_whole_file()
    }

    fn close(&mut self) -> Result<(), SinkError> {
        self.writer
            .flush()
            .map_err(|source| SinkError::Fatal { secondary_path: secondary_log_path(&self.path), source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufRead;

    #[test]
    fn writes_one_json_object_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trials.jsonl");
        let mut sink = JsonLinesSink::create(&path).unwrap();
        sink.write(&Trial::new(0.0, Some(1.0), 0.0)).unwrap();
        sink.write(&Trial::new(1.0, None, 1.0)).unwrap();
        sink.close().unwrap();

        let file = File::open(&path).unwrap();
        let lines: Vec<_> = std::io::BufReader::new(file).lines().map(|l| l.unwrap()).collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(first["start_time"], serde_json::json!(0.0));
    }

    #[test]
    fn rewrite_updates_the_line_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trials.jsonl");
        let mut sink = JsonLinesSink::create(&path).unwrap();
        sink.write(&Trial::new(0.0, Some(1.0), 0.0)).unwrap();
        let mut updated = Trial::new(0.0, Some(1.0), 0.0);
        updated.set_enhancement("duration", serde_json::json!(1.0));
        sink.rewrite(0, &updated).unwrap();
        sink.close().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let line: serde_json::Value = serde_json::from_str(contents.trim()).unwrap();
        assert_eq!(line["enhancements"]["duration"], serde_json::json!(1.0));
    }
}
