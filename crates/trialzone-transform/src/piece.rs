use trialzone_core::{NumericRow, TextRow};

/// One reader result or one derived-pipeline intermediate: an incremental
/// slice of new data for exactly one buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum RawPiece {
    Numeric(Vec<NumericRow>),
    Text(Vec<TextRow>),
    Signal {
        t0: f64,
        frequency: f64,
        channel_ids: Vec<String>,
        samples: Vec<f64>,
    },
}

impl RawPiece {
    pub fn is_empty(&self) -> bool {
        match self {
            RawPiece::Numeric(rows) => rows.is_empty(),
            RawPiece::Text(rows) => rows.is_empty(),
            RawPiece::Signal { samples, .. } => samples.is_empty(),
        }
    }
}
