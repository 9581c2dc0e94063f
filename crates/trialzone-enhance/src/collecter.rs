use std::collections::BTreeMap;

use tracing::warn;
use trialzone_core::Trial;

use crate::error::EnhanceError;

/// The enhancement-only delta a collecter contributes for one trial. Scoped
/// to exactly the two fields collecters are allowed to touch: collecters
/// modify enhancements and enhancement categories only, never timing or
/// raw data.
#[derive(Debug, Clone, Default)]
pub struct EnhancementUpdate {
    pub trial_index: usize,
    pub enhancements: serde_json::Map<String, serde_json::Value>,
    pub enhancement_categories: BTreeMap<String, Vec<String>>,
}

/// Runs after the driver signals end-of-run, over the full already-emitted
/// trial sequence.
pub trait Collecter: std::fmt::Debug {
    fn name(&self) -> &str;
    fn run(&self, trials: &[Trial]) -> Result<Vec<EnhancementUpdate>, EnhanceError>;
}

/// Runs every collecter over the full trial sequence and applies each
/// resulting update in place. Returns the sorted, deduplicated set of trial
/// indices touched, so the caller can tell the sink which trials to
/// rewrite.
pub fn run_collecters(collecters: &[Box<dyn Collecter>], trials: &mut [Trial]) -> Vec<usize> {
    let mut rewritten = Vec::new();
    for collecter in collecters {
        match collecter.run(trials) {
            Ok(updates) => {
                for update in updates {
                    if let Some(trial) = trials.get_mut(update.trial_index) {
                        trial.enhancements.extend(update.enhancements);
                        for (category, names) in update.enhancement_categories {
                            trial
                                .enhancement_categories
                                .entry(category)
                                .or_default()
                                .extend(names);
                        }
                        rewritten.push(update.trial_index);
                    }
                }
            }
            Err(err) => {
                warn!(collecter = collecter.name(), "collecter failed: {err}");
            }
        }
    }
    rewritten.sort_unstable();
    rewritten.dedup();
    rewritten
}
