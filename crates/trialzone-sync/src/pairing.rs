use crate::event::{SyncEvent, SyncKey};

/// Pairs a reference reader's sync events with a follower's. Pluggable so
/// the default greedy policy can be swapped per sync descriptor without
/// touching the registry.
pub trait PairingStrategy: std::fmt::Debug + Send + Sync {
    /// Returns `(t_reference, t_follower)` pairs sorted by `t_reference`.
    fn pair(&self, reference: &[SyncEvent], follower: &[SyncEvent]) -> Vec<(f64, f64)>;
}

/// Default strategy: sort both lists, greedily match each unmatched
/// reference event with the closest unmatched follower event. Assumes both
/// clocks start near zero with small monotonic drift.
#[derive(Debug, Default)]
pub struct ClosestInTime;

impl PairingStrategy for ClosestInTime {
    fn pair(&self, reference: &[SyncEvent], follower: &[SyncEvent]) -> Vec<(f64, f64)> {
        let mut used = vec![false; follower.len()];
        let mut pairs = Vec::new();
        for r in reference {
            let mut best: Option<(usize, f64)> = None;
            for (i, f) in follower.iter().enumerate() {
                if used[i] {
                    continue;
                }
                let diff = (r.t - f.t).abs();
                if best.map(|(_, d)| diff < d).unwrap_or(true) {
                    best = Some((i, diff));
                }
            }
            if let Some((i, _)) = best {
                used[i] = true;
                pairs.push((r.t, follower[i].t));
            }
        }
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
        pairs
    }
}

/// Join reference and follower events on equal `pairing_key`.
#[derive(Debug, Default)]
pub struct Keyed;

impl PairingStrategy for Keyed {
    fn pair(&self, reference: &[SyncEvent], follower: &[SyncEvent]) -> Vec<(f64, f64)> {
        let mut pairs = Vec::new();
        for r in reference {
            if let Some(f) = follower.iter().find(|f| keys_equal(&r.key, &f.key)) {
                pairs.push((r.t, f.t));
            }
        }
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
        pairs
    }
}

fn keys_equal(a: &SyncKey, b: &SyncKey) -> bool {
    a == b
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(t: f64) -> SyncEvent {
        SyncEvent {
            t,
            key: SyncKey::Index(0),
        }
    }

    #[test]
    fn closest_in_time_matches_by_minimal_difference() {
        let reference = vec![ev(1.0), ev(11.0), ev(21.0)];
        let follower = vec![ev(1.05), ev(11.55), ev(22.05)];
        let pairs = ClosestInTime.pair(&reference, &follower);
        assert_eq!(pairs, vec![(1.0, 1.05), (11.0, 11.55), (21.0, 22.05)]);
    }

    #[test]
    fn keyed_joins_on_matching_key() {
        let reference = vec![SyncEvent {
            t: 1.0,
            key: SyncKey::Value(trialzone_expr::Value::Number(7.0)),
        }];
        let follower = vec![SyncEvent {
            t: 1.2,
            key: SyncKey::Value(trialzone_expr::Value::Number(7.0)),
        }];
        let pairs = Keyed.pair(&reference, &follower);
        assert_eq!(pairs, vec![(1.0, 1.2)]);
    }
}
