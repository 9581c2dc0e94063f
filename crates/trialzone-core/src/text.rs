use serde::{Deserialize, Serialize};

use crate::error::BufferError;

/// One row of a text event buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRow {
    pub t: f64,
    pub text: String,
}

impl TextRow {
    pub fn new(t: f64, text: impl Into<String>) -> Self {
        Self {
            t,
            text: text.into(),
        }
    }
}

/// Two parallel arrays (`timestamps`, `texts`) kept ordered by non-decreasing
/// timestamp. Modeled as a single row vector internally; the parallel-array
/// shape only shows up when a sink writes it out.
#[derive(Debug, Clone, Default)]
pub struct TextEventBuffer {
    name: String,
    rows: Vec<TextRow>,
    slack: f64,
}

impl TextEventBuffer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
            slack: 0.0,
        }
    }

    pub fn with_slack(mut self, slack: f64) -> Self {
        self.slack = slack;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn end_time(&self) -> f64 {
        self.rows.last().map(|r| r.t).unwrap_or(f64::NEG_INFINITY)
    }

    pub fn append(&mut self, rows: Vec<TextRow>) -> Result<(), BufferError> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut prev = self.rows.last().map(|r| r.t);
        for row in &rows {
            if let Some(p) = prev {
                if row.t < p - self.slack {
                    return Err(BufferError::OutOfOrder {
                        name: self.name.clone(),
                        new_t: row.t,
                        last_t: p,
                        slack: self.slack,
                    });
                }
            }
            prev = Some(row.t);
        }
        self.rows.extend(rows);
        Ok(())
    }

    pub fn query(&self, a: f64, b: f64) -> Vec<TextRow> {
        let start = self.rows.partition_point(|r| r.t < a);
        self.rows[start..]
            .iter()
            .take_while(|r| r.t < b)
            .cloned()
            .collect()
    }

    pub fn discard_before(&mut self, t: f64) {
        let cut = self.rows.partition_point(|r| r.t < t);
        self.rows.drain(0..cut);
    }
}

pub fn shift_times(rows: &mut [TextRow], delta: f64) {
    for row in rows {
        row.t -= delta;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_preserves_order_and_bounds() {
        let mut buf = TextEventBuffer::new("foo");
        buf.append(vec![
            TextRow::new(0.2, "red"),
            TextRow::new(1.2, "red"),
            TextRow::new(1.3, "green"),
        ])
        .unwrap();
        let got = buf.query(1.0, 2.0);
        assert_eq!(
            got.into_iter().map(|r| r.text).collect::<Vec<_>>(),
            vec!["red", "green"]
        );
    }

    #[test]
    fn rejects_out_of_order_without_slack() {
        let mut buf = TextEventBuffer::new("foo");
        buf.append(vec![TextRow::new(1.0, "a")]).unwrap();
        assert!(buf.append(vec![TextRow::new(0.5, "b")]).is_err());
    }
}
