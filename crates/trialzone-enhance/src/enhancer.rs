use tracing::warn;
use trialzone_core::Trial;
use trialzone_expr::{eval, Expr};

use crate::context::trial_context;
use crate::error::EnhanceError;

/// A per-trial augmentation step. Runs once per trial, in declared order,
/// skipped when `when()` evaluates falsy against the trial as augmented so
/// far.
pub trait Enhancer: std::fmt::Debug {
    fn name(&self) -> &str;
    fn when(&self) -> Option<&Expr> {
        None
    }
    fn apply(&self, trial: &mut Trial) -> Result<(), EnhanceError>;
}

/// Runs every enhancer against one trial, in order. A failing enhancer is
/// logged with the trial index and enhancer name; the trial keeps whatever
/// enhancements were written before the failure and the run continues.
#[derive(Default)]
pub struct EnhancerPipeline {
    stages: Vec<Box<dyn Enhancer>>,
}

impl EnhancerPipeline {
    pub fn new(stages: Vec<Box<dyn Enhancer>>) -> Self {
        Self { stages }
    }

    pub fn push(&mut self, stage: Box<dyn Enhancer>) {
        self.stages.push(stage);
    }

    pub fn run(&self, trial_index: usize, trial: &mut Trial) {
        for stage in &self.stages {
            if let Some(when) = stage.when() {
                let ctx = trial_context(trial);
                if !eval(when, &ctx).as_bool() {
                    continue;
                }
            }
            if let Err(err) = stage.apply(trial) {
                warn!(trial = trial_index, enhancer = stage.name(), "enhancer failed: {err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct AlwaysFails;
    impl Enhancer for AlwaysFails {
        fn name(&self) -> &str {
            "always_fails"
        }
        fn apply(&self, _trial: &mut Trial) -> Result<(), EnhanceError> {
            Err(EnhanceError::Enhancer {
                name: "always_fails".to_string(),
                message: "boom".to_string(),
            })
        }
    }

    #[derive(Debug)]
    struct SetsFlag;
    impl Enhancer for SetsFlag {
        fn name(&self) -> &str {
            "sets_flag"
        }
        fn apply(&self, trial: &mut Trial) -> Result<(), EnhanceError> {
            trial.set_enhancement("flag", serde_json::json!(true));
            Ok(())
        }
    }

    #[test]
    fn failing_enhancer_does_not_stop_the_pipeline() {
        let mut trial = Trial::new(0.0, Some(1.0), 0.0);
        let pipeline = EnhancerPipeline::new(vec![Box::new(AlwaysFails), Box::new(SetsFlag)]);
        pipeline.run(0, &mut trial);
        assert_eq!(trial.enhancements.get("flag"), Some(&serde_json::json!(true)));
    }
}
