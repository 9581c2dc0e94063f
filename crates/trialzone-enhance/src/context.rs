use std::collections::HashMap;

use trialzone_core::Trial;
use trialzone_expr::Value;

/// Builds the evaluation context a `when` expression or an `Expression`
/// enhancer sees for a trial: timing fields, every event/signal buffer
/// exposed as a list (so `.first()`/`.last()`/`[i]` work against it), and
/// enhancements computed by earlier enhancers in this same pass.
pub fn trial_context(trial: &Trial) -> HashMap<String, Value> {
    let mut ctx = HashMap::new();
    ctx.insert("start_time".to_string(), Value::Number(trial.start_time));
    if let Some(end) = trial.end_time {
        ctx.insert("end_time".to_string(), Value::Number(end));
    }
    ctx.insert("wrt_time".to_string(), Value::Number(trial.wrt_time));

    for (name, rows) in &trial.numeric_events {
        let values = rows
            .iter()
            .map(|r| Value::List(r.values.iter().map(|v| Value::Number(*v)).collect()))
            .collect();
        ctx.insert(name.clone(), Value::List(values));
    }
    for (name, rows) in &trial.text_events {
        let values = rows.iter().map(|r| Value::Text(r.text.clone())).collect();
        ctx.insert(name.clone(), Value::List(values));
    }
    for (name, value) in &trial.enhancements {
        ctx.insert(name.clone(), json_to_value(value));
    }
    ctx
}

fn json_to_value(value: &serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Missing,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => Value::Text(s.clone()),
        serde_json::Value::Array(items) => Value::List(items.iter().map(json_to_value).collect()),
        serde_json::Value::Object(_) => Value::Missing,
    }
}
