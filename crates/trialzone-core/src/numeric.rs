use serde::{Deserialize, Serialize};

use crate::error::BufferError;

/// One row of a numeric event buffer: a timestamp plus a fixed-arity tuple
/// of values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericRow {
    pub t: f64,
    pub values: Vec<f64>,
}

impl NumericRow {
    pub fn new(t: f64, values: impl Into<Vec<f64>>) -> Self {
        Self {
            t,
            values: values.into(),
        }
    }
}

/// Ordered sequence of `(t, v0..vk-1)` rows with fixed arity, non-decreasing
/// `t`. Append-only at the tail, discard-only at the head.
#[derive(Debug, Clone, Default)]
pub struct NumericEventBuffer {
    name: String,
    arity: Option<usize>,
    rows: Vec<NumericRow>,
    /// Out-of-order tolerance: a new batch may start up to `slack` seconds
    /// before the buffer's current last timestamp.
    slack: f64,
}

impl NumericEventBuffer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arity: None,
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

    pub fn arity(&self) -> Option<usize> {
        self.arity
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Timestamp of the last appended row, or `-inf` if empty.
    pub fn end_time(&self) -> f64 {
        self.rows.last().map(|r| r.t).unwrap_or(f64::NEG_INFINITY)
    }

    /// Appends rows already sorted by non-decreasing `t`. Fixes the arity on
    /// the first populated append. All-or-nothing: on error, nothing is
    /// appended.
    pub fn append(&mut self, rows: Vec<NumericRow>) -> Result<(), BufferError> {
        if rows.is_empty() {
            return Ok(());
        }
        let arity = self.arity.unwrap_or(rows[0].values.len());
        for row in &rows {
            if row.values.len() != arity {
                return Err(BufferError::ArityMismatch {
                    name: self.name.clone(),
                    expected: arity,
                    got: row.values.len(),
                });
            }
        }
        let mut prev = self.rows.last().map(|r| r.t);
        if let Some(last_t) = prev {
            if rows[0].t < last_t - self.slack {
                return Err(BufferError::OutOfOrder {
                    name: self.name.clone(),
                    new_t: rows[0].t,
                    last_t,
                    slack: self.slack,
                });
            }
        }
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
        self.arity = Some(arity);
        self.rows.extend(rows);
        Ok(())
    }

    /// Returns an independent copy of rows with `a <= t < b`. Side-effect-free.
    pub fn query(&self, a: f64, b: f64) -> Vec<NumericRow> {
        let start = self.rows.partition_point(|r| r.t < a);
        self.rows[start..]
            .iter()
            .take_while(|r| r.t < b)
            .cloned()
            .collect()
    }

    /// Drops rows strictly earlier than `t`.
    pub fn discard_before(&mut self, t: f64) {
        let cut = self.rows.partition_point(|r| r.t < t);
        self.rows.drain(0..cut);
    }
}

/// Subtracts `delta` from every timestamp in a query result, in place. Used
/// to rewrite a reader's timestamps into a reference clock before they're
/// attached to a trial.
pub fn shift_times(rows: &mut [NumericRow], delta: f64) {
    for row in rows {
        row.t -= delta;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(t: f64, v: f64) -> NumericRow {
        NumericRow::new(t, vec![v])
    }

    #[test]
    fn append_fixes_arity_on_first_append() {
        let mut buf = NumericEventBuffer::new("foo");
        buf.append(vec![row(0.0, 1.0), row(1.0, 2.0)]).unwrap();
        assert_eq!(buf.arity(), Some(1));
        let err = buf.append(vec![NumericRow::new(2.0, vec![1.0, 2.0])]);
        assert!(matches!(err, Err(BufferError::ArityMismatch { .. })));
    }

    #[test]
    fn append_rejects_out_of_order_batches() {
        let mut buf = NumericEventBuffer::new("foo");
        buf.append(vec![row(1.0, 1.0)]).unwrap();
        let err = buf.append(vec![row(0.5, 2.0)]);
        assert!(matches!(err, Err(BufferError::OutOfOrder { .. })));
        // buffer state unaffected by the rejected append
        assert_eq!(buf.len(), 1);
    }

    #[test]
    fn append_tolerates_slack() {
        let mut buf = NumericEventBuffer::new("foo").with_slack(0.2);
        buf.append(vec![row(1.0, 1.0)]).unwrap();
        buf.append(vec![row(0.9, 2.0)]).unwrap();
        assert_eq!(buf.len(), 2);
    }

    #[test]
    fn query_returns_half_open_interval() {
        let mut buf = NumericEventBuffer::new("foo");
        buf.append(vec![row(0.0, 0.0), row(1.0, 1.0), row(2.0, 2.0)])
            .unwrap();
        let got = buf.query(1.0, 2.0);
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].t, 1.0);
    }

    #[test]
    fn query_is_side_effect_free() {
        let mut buf = NumericEventBuffer::new("foo");
        buf.append(vec![row(0.0, 0.0), row(1.0, 1.0)]).unwrap();
        let _ = buf.query(0.0, 1.0);
        assert_eq!(buf.len(), 2);
    }

    #[test]
    fn discard_before_drops_head_only() {
        let mut buf = NumericEventBuffer::new("foo");
        buf.append(vec![row(0.0, 0.0), row(1.0, 1.0), row(2.0, 2.0)])
            .unwrap();
        buf.discard_before(1.0);
        assert_eq!(buf.rows.iter().map(|r| r.t).collect::<Vec<_>>(), vec![1.0, 2.0]);
    }

    #[test]
    fn end_time_is_neg_infinity_when_empty() {
        let buf = NumericEventBuffer::new("foo");
        assert_eq!(buf.end_time(), f64::NEG_INFINITY);
    }

    #[test]
    fn shift_times_subtracts_delta() {
        let mut rows = vec![row(1.0, 1.0), row(2.0, 2.0)];
        shift_times(&mut rows, 0.5);
        assert_eq!(rows[0].t, 0.5);
        assert_eq!(rows[1].t, 1.5);
    }
}
