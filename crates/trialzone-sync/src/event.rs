use trialzone_expr::Value;

/// One observed sync event: `t_observed` plus a pairing key, defaulting to
/// the event's index in its reader's list when `pairing_key` is unset.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncEvent {
    pub t: f64,
    pub key: SyncKey,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncKey {
    Index(usize),
    Value(Value),
}
