use crate::error::TransformError;
use crate::piece::RawPiece;

/// A pure function `Buffer piece -> Buffer piece`. Transformers never see
/// the whole buffer, only the incremental slice the router just received,
/// which is what lets the router run them per-cycle instead of replaying
/// history.
pub trait Transformer: std::fmt::Debug {
    fn apply(&self, input: &RawPiece) -> Result<RawPiece, TransformError>;
}

/// An ordered pipeline of transformers applied top-first.
#[derive(Debug, Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn Transformer + Send + Sync>>,
}

impl Pipeline {
    pub fn new(stages: Vec<Box<dyn Transformer + Send + Sync>>) -> Self {
        Self { stages }
    }

    pub fn push(&mut self, stage: Box<dyn Transformer + Send + Sync>) {
        self.stages.push(stage);
    }

    pub fn run(&self, input: RawPiece) -> Result<RawPiece, TransformError> {
        let mut piece = input;
        for stage in &self.stages {
            piece = stage.apply(&piece)?;
        }
        Ok(piece)
    }
}
