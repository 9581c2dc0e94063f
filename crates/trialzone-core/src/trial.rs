use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::numeric::NumericRow;
use crate::signal::SignalChunk;
use crate::text::TextRow;

/// A signal's shifted chunk sequence plus the fixed metadata a sink needs to
/// write it out (`sample_frequency`, `channel_ids`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialSignal {
    pub sample_frequency: f64,
    pub channel_ids: Vec<String>,
    pub chunks: Vec<SignalChunk>,
}

/// One trial record. Timestamps in every field are already shifted to
/// `wrt_time` by the extractor; `wrt_time` itself is recorded in the
/// reference clock for traceability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    /// Absolute time of the delimiting start event, `-inf` for the implicit
    /// trial covering everything before the first delimiter fires.
    pub start_time: f64,
    /// Absolute time of the next delimiting event; `None` for the final
    /// trial, emitted at end-of-stream.
    pub end_time: Option<f64>,
    /// Absolute time chosen as local zero for this trial.
    pub wrt_time: f64,
    pub numeric_events: BTreeMap<String, Vec<NumericRow>>,
    pub text_events: BTreeMap<String, Vec<TextRow>>,
    pub signals: BTreeMap<String, TrialSignal>,
    pub enhancements: serde_json::Map<String, serde_json::Value>,
    pub enhancement_categories: BTreeMap<String, Vec<String>>,
}

impl Trial {
    pub fn new(start_time: f64, end_time: Option<f64>, wrt_time: f64) -> Self {
        Self {
            start_time,
            end_time,
            wrt_time,
            numeric_events: BTreeMap::new(),
            text_events: BTreeMap::new(),
            signals: BTreeMap::new(),
            enhancements: serde_json::Map::new(),
            enhancement_categories: BTreeMap::new(),
        }
    }

    /// Duration in seconds, or `None` if this is the open-ended final trial.
    pub fn duration(&self) -> Option<f64> {
        self.end_time.map(|end| end - self.start_time)
    }

    pub fn set_enhancement(&mut self, name: impl Into<String>, value: serde_json::Value) {
        self.enhancements.insert(name.into(), value);
    }

    pub fn add_to_category(&mut self, category: impl Into<String>, name: impl Into<String>) {
        self.enhancement_categories
            .entry(category.into())
            .or_default()
            .push(name.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_is_none_for_open_ended_trial() {
        let trial = Trial::new(1.0, None, 1.0);
        assert_eq!(trial.duration(), None);
    }

    #[test]
    fn duration_is_end_minus_start() {
        let trial = Trial::new(1.0, Some(3.5), 1.0);
        assert_eq!(trial.duration(), Some(2.5));
    }
}
