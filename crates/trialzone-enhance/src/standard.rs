use std::collections::BTreeMap;

use trialzone_core::Trial;
use trialzone_expr::{eval, Expr, Value};

use crate::collecter::{Collecter, EnhancementUpdate};
use crate::context::trial_context;
use crate::enhancer::Enhancer;
use crate::error::EnhanceError;

/// Writes `duration = end_time - start_time`, or `null` for the open-ended
/// final trial.
#[derive(Debug)]
pub struct Duration;

impl Enhancer for Duration {
    fn name(&self) -> &str {
        "duration"
    }

    fn apply(&self, trial: &mut Trial) -> Result<(), EnhanceError> {
        let value = match trial.duration() {
            Some(d) => serde_json::json!(d),
            None => serde_json::Value::Null,
        };
        trial.set_enhancement("duration", value);
        Ok(())
    }
}

/// Replaces a named signal's samples with a boxcar-filtered (centered
/// moving average) copy, operating on the trial's own copy only.
#[derive(Debug)]
pub struct SignalSmoother {
    pub signal_name: String,
    pub window: usize,
}

impl Enhancer for SignalSmoother {
    fn name(&self) -> &str {
        "signal_smoother"
    }

    fn apply(&self, trial: &mut Trial) -> Result<(), EnhanceError> {
        let window = self.window.max(1);
        let Some(signal) = trial.signals.get_mut(&self.signal_name) else {
            return Ok(());
        };
        let channels = signal.channel_ids.len().max(1);
        for chunk in &mut signal.chunks {
            chunk.samples = boxcar(&chunk.samples, channels, window);
        }
        Ok(())
    }
}

fn boxcar(samples: &[f64], channels: usize, window: usize) -> Vec<f64> {
    let n = samples.len() / channels;
    let half = window / 2;
    let mut out = vec![0.0; samples.len()];
    for ch in 0..channels {
        for i in 0..n {
            let lo = i.saturating_sub(half);
            let hi = (i + half).min(n.saturating_sub(1));
            let count = (hi - lo + 1) as f64;
            let sum: f64 = (lo..=hi).map(|j| samples[j * channels + ch]).sum();
            out[i * channels + ch] = sum / count;
        }
    }
    out
}

/// Evaluates a configured expression against the trial and stores the
/// result under `output_name`.
#[derive(Debug)]
pub struct Expression {
    pub output_name: String,
    pub expr: Expr,
    pub when: Option<Expr>,
}

impl Enhancer for Expression {
    fn name(&self) -> &str {
        "expression"
    }

    fn when(&self) -> Option<&Expr> {
        self.when.as_ref()
    }

    fn apply(&self, trial: &mut Trial) -> Result<(), EnhanceError> {
        let ctx = trial_context(trial);
        let result = eval(&self.expr, &ctx);
        trial.set_enhancement(self.output_name.clone(), value_to_json(&result));
        Ok(())
    }
}

fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Number(n) => serde_json::json!(n),
        Value::Text(s) => serde_json::json!(s),
        Value::Bool(b) => serde_json::json!(b),
        Value::List(items) => serde_json::Value::Array(items.iter().map(value_to_json).collect()),
        Value::Missing => serde_json::Value::Null,
    }
}

/// Normalizes a named signal by the global max sample magnitude across all
/// trials. Collecters may not rewrite raw samples, so the rescale is
/// recorded as a per-trial enhancement factor rather than applied in place.
#[derive(Debug)]
pub struct SignalNormalizer {
    pub signal_name: String,
}

impl Collecter for SignalNormalizer {
    fn name(&self) -> &str {
        "signal_normalizer"
    }

    fn run(&self, trials: &[Trial]) -> Result<Vec<EnhancementUpdate>, EnhanceError> {
        let global_max = trials
            .iter()
            .filter_map(|t| t.signals.get(&self.signal_name))
            .flat_map(|s| s.chunks.iter())
            .flat_map(|c| c.samples.iter())
            .fold(0.0_f64, |acc, &v| acc.max(v.abs()));
        if global_max == 0.0 {
            return Ok(Vec::new());
        }
        let factor = 1.0 / global_max;
        let updates = trials
            .iter()
            .enumerate()
            .filter(|(_, t)| t.signals.contains_key(&self.signal_name))
            .map(|(i, _)| {
                let mut enhancements = serde_json::Map::new();
                enhancements.insert(format!("{}_normalization_factor", self.signal_name), serde_json::json!(factor));
                EnhancementUpdate {
                    trial_index: i,
                    enhancements,
                    enhancement_categories: BTreeMap::new(),
                }
            })
            .collect();
        Ok(updates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trialzone_core::{SignalChunk, TrialSignal};

    #[test]
    fn duration_enhancer_writes_span() {
        let mut trial = Trial::new(1.0, Some(3.5), 1.0);
        Duration.apply(&mut trial).unwrap();
        assert_eq!(trial.enhancements["duration"], serde_json::json!(2.5));
    }

    #[test]
    fn duration_is_null_for_open_trial() {
        let mut trial = Trial::new(1.0, None, 1.0);
        Duration.apply(&mut trial).unwrap();
        assert_eq!(trial.enhancements["duration"], serde_json::Value::Null);
    }

    #[test]
    fn signal_normalizer_emits_global_scale_factor() {
        let mut t0 = Trial::new(0.0, Some(1.0), 0.0);
        t0.signals.insert(
            "sig".to_string(),
            TrialSignal {
                sample_frequency: 10.0,
                channel_ids: vec!["ch0".to_string()],
                chunks: vec![SignalChunk::new(0.0, 2, 1, vec![1.0, 2.0])],
            },
        );
        let mut t1 = Trial::new(1.0, Some(2.0), 1.0);
        t1.signals.insert(
            "sig".to_string(),
            TrialSignal {
                sample_frequency: 10.0,
                channel_ids: vec!["ch0".to_string()],
                chunks: vec![SignalChunk::new(0.0, 2, 1, vec![4.0, 8.0])],
            },
        );
        let trials = vec![t0, t1];
        let updates = SignalNormalizer { signal_name: "sig".to_string() }.run(&trials).unwrap();
        assert_eq!(updates.len(), 2);
        for update in &updates {
            let factor = update.enhancements["sig_normalization_factor"].as_f64().unwrap();
            assert!((factor - 0.125).abs() < 1e-9);
        }
    }
}
