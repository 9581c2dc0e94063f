use trialzone_core::{NumericRow, TextRow};

use crate::error::TransformError;
use crate::piece::RawPiece;
use crate::transformer::Transformer;

/// Adds `offset` then multiplies by `gain`, column-wise, on numeric event
/// values or signal samples.
#[derive(Debug, Clone)]
pub struct OffsetThenGain {
    pub offset: f64,
    pub gain: f64,
    /// Value columns to transform; `None` means all columns.
    pub columns: Option<Vec<usize>>,
}

impl OffsetThenGain {
    pub fn new(offset: f64, gain: f64) -> Self {
        Self {
            offset,
            gain,
            columns: None,
        }
    }

    pub fn on_columns(mut self, columns: Vec<usize>) -> Self {
        self.columns = Some(columns);
        self
    }

    fn transform(&self, v: f64) -> f64 {
        (v + self.offset) * self.gain
    }

    fn selected(&self, arity: usize) -> Vec<usize> {
        self.columns
            .clone()
            .unwrap_or_else(|| (0..arity).collect())
    }
}

impl Transformer for OffsetThenGain {
    fn apply(&self, input: &RawPiece) -> Result<RawPiece, TransformError> {
        match input {
            RawPiece::Numeric(rows) => {
                let arity = rows.first().map(|r| r.values.len()).unwrap_or(0);
                let cols = self.selected(arity);
                for &c in &cols {
                    if c >= arity {
                        return Err(TransformError::ColumnOutOfRange {
                            name: "OffsetThenGain",
                            col: c,
                            arity,
                        });
                    }
                }
                let out = rows
                    .iter()
                    .map(|row| {
                        let mut values = row.values.clone();
                        for &c in &cols {
                            values[c] = self.transform(values[c]);
                        }
                        NumericRow { t: row.t, values }
                    })
                    .collect();
                Ok(RawPiece::Numeric(out))
            }
            RawPiece::Signal {
                t0,
                frequency,
                channel_ids,
                samples,
            } => {
                let channels = channel_ids.len().max(1);
                let cols = self.selected(channels);
                for &c in &cols {
                    if c >= channels {
                        return Err(TransformError::ColumnOutOfRange {
                            name: "OffsetThenGain",
                            col: c,
                            arity: channels,
                        });
                    }
                }
                let mut out = samples.clone();
                for chunk in out.chunks_mut(channels) {
                    for &c in &cols {
                        chunk[c] = self.transform(chunk[c]);
                    }
                }
                Ok(RawPiece::Signal {
                    t0: *t0,
                    frequency: *frequency,
                    channel_ids: channel_ids.clone(),
                    samples: out,
                })
            }
            RawPiece::Text(_) => Err(TransformError::UnsupportedInput {
                name: "OffsetThenGain",
                kind: "text",
            }),
        }
    }
}

/// Drops event rows whose selected column fails a predicate.
#[derive(Debug, Clone, Copy)]
pub enum RangePredicate {
    Equals(f64),
    Between { min: f64, max: f64 },
}

impl RangePredicate {
    fn test(&self, v: f64) -> bool {
        match *self {
            RangePredicate::Equals(x) => v == x,
            RangePredicate::Between { min, max } => v >= min && v <= max,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FilterRange {
    pub column: usize,
    pub predicate: RangePredicate,
}

impl FilterRange {
    pub fn new(column: usize, predicate: RangePredicate) -> Self {
        Self { column, predicate }
    }
}

impl Transformer for FilterRange {
    fn apply(&self, input: &RawPiece) -> Result<RawPiece, TransformError> {
        match input {
            RawPiece::Numeric(rows) => {
                let mut out = Vec::new();
                for row in rows {
                    if self.column >= row.values.len() {
                        return Err(TransformError::ColumnOutOfRange {
                            name: "FilterRange",
                            col: self.column,
                            arity: row.values.len(),
                        });
                    }
                    if self.predicate.test(row.values[self.column]) {
                        out.push(row.clone());
                    }
                }
                Ok(RawPiece::Numeric(out))
            }
            RawPiece::Text(_) => Err(TransformError::UnsupportedInput {
                name: "FilterRange",
                kind: "text",
            }),
            RawPiece::Signal { .. } => Err(TransformError::UnsupportedInput {
                name: "FilterRange",
                kind: "signal",
            }),
        }
    }
}

/// Fill strategy for gaps between input samples.
#[derive(Debug, Clone, Copy)]
pub enum FillMode {
    Linear,
    Constant(f64),
}

/// Converts numeric-event rows `(t, x, y, ...)` into a regularly-sampled
/// signal at `sample_frequency`, interpolating (or constant-filling) gaps.
#[derive(Debug, Clone)]
pub struct SparseSignal {
    pub sample_frequency: f64,
    pub channel_ids: Vec<String>,
    pub fill: FillMode,
}

impl SparseSignal {
    pub fn new(sample_frequency: f64, channel_ids: Vec<String>, fill: FillMode) -> Self {
        Self {
            sample_frequency,
            channel_ids,
            fill,
        }
    }
}

impl Transformer for SparseSignal {
    fn apply(&self, input: &RawPiece) -> Result<RawPiece, TransformError> {
        let RawPiece::Numeric(rows) = input else {
            return Err(TransformError::UnsupportedInput {
                name: "SparseSignal",
                kind: "non-numeric",
            });
        };
        let channels = self.channel_ids.len();
        if rows.is_empty() {
            return Ok(RawPiece::Signal {
                t0: 0.0,
                frequency: self.sample_frequency,
                channel_ids: self.channel_ids.clone(),
                samples: Vec::new(),
            });
        }
        for row in rows {
            if row.values.len() != channels {
                return Err(TransformError::ColumnOutOfRange {
                    name: "SparseSignal",
                    col: channels,
                    arity: row.values.len(),
                });
            }
        }
        let t0 = rows[0].t;
        let t_end = rows[rows.len() - 1].t;
        let period = 1.0 / self.sample_frequency;
        let n = (((t_end - t0) / period).floor() as usize) + 1;
        let mut samples = vec![0.0; n * channels];

        let mut left = 0usize;
        for i in 0..n {
            let t = t0 + i as f64 * period;
            while left + 1 < rows.len() && rows[left + 1].t <= t {
                left += 1;
            }
            let row_values = if t <= rows[left].t || left + 1 >= rows.len() {
                rows[left].values.clone()
            } else {
                let (t1, t2) = (rows[left].t, rows[left + 1].t);
                let frac = if t2 > t1 { (t - t1) / (t2 - t1) } else { 0.0 };
                (0..channels)
                    .map(|c| match self.fill {
                        FillMode::Linear => {
                            rows[left].values[c]
                                + frac * (rows[left + 1].values[c] - rows[left].values[c])
                        }
                        FillMode::Constant(v) => {
                            if t < rows[left].t || t > rows[left + 1].t {
                                v
                            } else {
                                rows[left].values[c]
                            }
                        }
                    })
                    .collect()
            };
            samples[i * channels..(i + 1) * channels].copy_from_slice(&row_values);
        }

        Ok(RawPiece::Signal {
            t0,
            frequency: self.sample_frequency,
            channel_ids: self.channel_ids.clone(),
            samples,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trialzone_core::NumericRow;

    #[test]
    fn offset_then_gain_transforms_numeric_rows() {
        let xf = OffsetThenGain::new(10.0, -2.0);
        let input = RawPiece::Numeric(vec![NumericRow::new(0.1, vec![1.0])]);
        let out = xf.apply(&input).unwrap();
        match out {
            RawPiece::Numeric(rows) => assert_eq!(rows[0].values, vec![-22.0]),
            _ => panic!("expected numeric"),
        }
    }

    #[test]
    fn filter_range_drops_non_matching_rows() {
        let f = FilterRange::new(0, RangePredicate::Equals(1010.0));
        let input = RawPiece::Numeric(vec![
            NumericRow::new(1.0, vec![1010.0]),
            NumericRow::new(1.5, vec![42.0]),
        ]);
        let out = f.apply(&input).unwrap();
        match out {
            RawPiece::Numeric(rows) => assert_eq!(rows.len(), 1),
            _ => panic!("expected numeric"),
        }
    }

    #[test]
    fn sparse_signal_interpolates_linearly() {
        let xf = SparseSignal::new(1.0, vec!["x".into()], FillMode::Linear);
        let input = RawPiece::Numeric(vec![
            NumericRow::new(0.0, vec![0.0]),
            NumericRow::new(2.0, vec![2.0]),
        ]);
        let out = xf.apply(&input).unwrap();
        match out {
            RawPiece::Signal { samples, .. } => {
                assert_eq!(samples, vec![0.0, 1.0, 2.0]);
            }
            _ => panic!("expected signal"),
        }
    }
}
