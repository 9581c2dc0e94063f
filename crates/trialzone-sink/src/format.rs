use serde_json::{json, Map, Value};
use trialzone_core::{NumericRow, TextRow, Trial, TrialSignal};

/// NaN and infinite values round-trip as JSON `null`.
pub fn num_to_json(v: f64) -> Value {
    if v.is_finite() {
        json!(v)
    } else {
        Value::Null
    }
}

fn numeric_rows_to_json(rows: &[NumericRow]) -> Value {
    Value::Array(
        rows.iter()
            .map(|row| {
                let mut entry = Vec::with_capacity(row.values.len() + 1);
                entry.push(num_to_json(row.t));
                entry.extend(row.values.iter().map(|v| num_to_json(*v)));
                Value::Array(entry)
            })
            .collect(),
    )
}

fn text_rows_to_json(rows: &[TextRow]) -> Value {
    json!({
        "timestamp_data": rows.iter().map(|r| num_to_json(r.t)).collect::<Vec<_>>(),
        "text_data": rows.iter().map(|r| Value::String(r.text.clone())).collect::<Vec<_>>(),
    })
}

fn signal_to_json(signal: &TrialSignal) -> Value {
    let channels = signal.channel_ids.len().max(1);
    let first_sample_time = signal.chunks.first().map(|c| c.t0).unwrap_or(0.0);
    let mut rows = Vec::new();
    for chunk in &signal.chunks {
        for i in 0..chunk.n() {
            let row: Vec<Value> = (0..channels)
                .map(|ch| num_to_json(chunk.samples[i * channels + ch]))
                .collect();
            rows.push(Value::Array(row));
        }
    }
    json!({
        "signal_data": rows,
        "sample_frequency": signal.sample_frequency,
        "first_sample_time": num_to_json(first_sample_time),
        "channel_ids": signal.channel_ids,
    })
}

/// Builds the per-trial JSON object, used by both the line-delimited JSON
/// sink and (via re-encoding) the HDF5 sink's attribute payloads.
pub fn trial_to_json(trial: &Trial) -> Value {
    let mut numeric_events = Map::new();
    for (name, rows) in &trial.numeric_events {
        numeric_events.insert(name.clone(), numeric_rows_to_json(rows));
    }
    let mut text_events = Map::new();
    for (name, rows) in &trial.text_events {
        text_events.insert(name.clone(), text_rows_to_json(rows));
    }
    let mut signals = Map::new();
    for (name, signal) in &trial.signals {
        signals.insert(name.clone(), signal_to_json(signal));
    }
    let mut enhancement_categories = Map::new();
    for (category, names) in &trial.enhancement_categories {
        enhancement_categories.insert(category.clone(), json!(names));
    }

    json!({
        "start_time": num_to_json(trial.start_time),
        "end_time": trial.end_time.map(num_to_json).unwrap_or(Value::Null),
        "wrt_time": num_to_json(trial.wrt_time),
        "numeric_events": numeric_events,
        "text_events": text_events,
        "signals": signals,
        "enhancements": Value::Object(trial.enhancements.clone()),
        "enhancement_categories": enhancement_categories,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_finite_timestamps_become_null() {
        let mut trial = Trial::new(f64::NEG_INFINITY, None, 0.0);
        trial
            .numeric_events
            .insert("bar".into(), vec![NumericRow::new(0.1, vec![f64::NAN])]);
        let json = trial_to_json(&trial);
        assert_eq!(json["start_time"], Value::Null);
        assert_eq!(json["end_time"], Value::Null);
        assert_eq!(json["numeric_events"]["bar"][0][1], Value::Null);
    }

    #[test]
    fn numeric_rows_become_flat_tuples() {
        let mut trial = Trial::new(0.0, Some(1.0), 0.0);
        trial
            .numeric_events
            .insert("bar".into(), vec![NumericRow::new(0.1, vec![1.0, 2.0])]);
        let json = trial_to_json(&trial);
        assert_eq!(json["numeric_events"]["bar"][0], json!([0.1, 1.0, 2.0]));
    }
}
