use std::collections::HashMap;

use trialzone_expr::{eval, Value};

use crate::descriptor::SyncDescriptor;
use crate::error::SyncError;
use crate::event::{SyncEvent, SyncKey};
use crate::pairing::{ClosestInTime, PairingStrategy};

/// Collects sync events per reader and estimates per-reader clock offsets
/// against the declared reference. Read-only to the extractor.
pub struct SyncRegistry {
    reference: String,
    descriptors: HashMap<String, SyncDescriptor>,
    events: HashMap<String, Vec<SyncEvent>>,
    pairing: Box<dyn PairingStrategy>,
}

impl SyncRegistry {
    pub fn new(descriptors: HashMap<String, SyncDescriptor>) -> Result<Self, SyncError> {
        Self::with_pairing(descriptors, Box::new(ClosestInTime))
    }

    pub fn with_pairing(
        descriptors: HashMap<String, SyncDescriptor>,
        pairing: Box<dyn PairingStrategy>,
    ) -> Result<Self, SyncError> {
        let references: Vec<String> = descriptors
            .iter()
            .filter(|(_, d)| d.is_reference)
            .map(|(name, _)| name.clone())
            .collect();
        let reference = match references.as_slice() {
            [] => return Err(SyncError::NoReferenceReader),
            [one] => one.clone(),
            many => return Err(SyncError::MultipleReferenceReaders(many.to_vec())),
        };
        for (name, d) in &descriptors {
            if let Some(inherits) = &d.reader_name {
                let owner = descriptors.get(inherits).ok_or_else(|| SyncError::UnknownReader(inherits.clone()))?;
                if owner.reader_name.is_some() {
                    return Err(SyncError::DanglingInheritance {
                        reader: name.clone(),
                        inherits_from: inherits.clone(),
                    });
                }
            }
        }
        Ok(Self {
            reference,
            descriptors,
            events: HashMap::new(),
            pairing,
        })
    }

    /// Records one row from the designated buffer against a reader's own
    /// descriptor, if its predicate matches. `ctx` exposes the row's fields
    /// (`t`, `value`/`values`, `text`, …) to the predicate and pairing-key
    /// expressions.
    pub fn observe(&mut self, reader_name: &str, t: f64, ctx: &HashMap<String, Value>) {
        let Some(descriptor) = self.descriptors.get(reader_name) else {
            return;
        };
        if descriptor.reader_name.is_some() {
            return;
        }
        if !eval(&descriptor.predicate, ctx).as_bool() {
            return;
        }
        let list = self.events.entry(reader_name.to_string()).or_default();
        let key = match &descriptor.pairing_key {
            Some(expr) => SyncKey::Value(eval(expr, ctx)),
            None => SyncKey::Index(list.len()),
        };
        list.push(SyncEvent { t, key });
    }

    /// The reader name whose sync list actually backs `reader_name`'s
    /// offset estimate: itself, unless it inherits another's.
    fn effective_source<'a>(&'a self, reader_name: &'a str) -> &'a str {
        match self.descriptors.get(reader_name).and_then(|d| d.reader_name.as_deref()) {
            Some(source) => source,
            None => reader_name,
        }
    }

    /// Follower-to-reference offset at query time `t`: `t_ref(pair) minus
    /// t_follower(pair)` for the most recent pair with `t_ref <= t`, or
    /// `0.0` if no pair exists yet.
    pub fn offset_at(&self, reader_name: &str, t: f64) -> f64 {
        if reader_name == self.reference {
            return 0.0;
        }
        let source = self.effective_source(reader_name);
        let empty = Vec::new();
        let reference_events = self.events.get(&self.reference).unwrap_or(&empty);
        let follower_events = self.events.get(source).unwrap_or(&empty);
        let pairs = self.pairing.pair(reference_events, follower_events);
        pairs
            .iter()
            .rev()
            .find(|(t_ref, _)| *t_ref <= t)
            .map(|(t_ref, t_foll)| t_ref - t_foll)
            .unwrap_or(0.0)
    }

    pub fn reference_reader(&self) -> &str {
        &self.reference
    }

    /// Every reader's sync descriptor, for a caller that needs to scan the
    /// designated buffers itself (this crate has no router dependency of
    /// its own).
    pub fn descriptors(&self) -> impl Iterator<Item = (&str, &SyncDescriptor)> {
        self.descriptors.iter().map(|(name, d)| (name.as_str(), d))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trialzone_expr::parse;

    fn ctx(t: f64) -> HashMap<String, Value> {
        let mut c = HashMap::new();
        c.insert("t".to_string(), Value::Number(t));
        c
    }

    #[test]
    fn offset_is_zero_before_any_pair() {
        let mut descriptors = HashMap::new();
        descriptors.insert("ref".to_string(), SyncDescriptor::reference("sync", parse("true").unwrap()));
        descriptors.insert("follower".to_string(), SyncDescriptor::owning("sync", parse("true").unwrap()));
        let registry = SyncRegistry::new(descriptors).unwrap();
        assert_eq!(registry.offset_at("follower", 5.0), 0.0);
    }

    #[test]
    fn offset_tracks_clock_drift_between_paired_sync_events() {
        let mut descriptors = HashMap::new();
        descriptors.insert("ref".to_string(), SyncDescriptor::reference("sync", parse("true").unwrap()));
        descriptors.insert("follower".to_string(), SyncDescriptor::owning("sync", parse("true").unwrap()));
        let mut registry = SyncRegistry::new(descriptors).unwrap();
        for t in [1.0, 11.0, 21.0] {
            registry.observe("ref", t, &ctx(t));
        }
        for t in [1.05, 11.55, 22.05] {
            registry.observe("follower", t, &ctx(t));
        }
        // query at reference time 10: most recent pair with t_ref <= 10 is (1, 1.05)
        let delta = registry.offset_at("follower", 10.0);
        assert!((delta - (-0.05)).abs() < 1e-9);
    }

    #[test]
    fn inherited_reader_borrows_source_list() {
        let mut descriptors = HashMap::new();
        descriptors.insert("ref".to_string(), SyncDescriptor::reference("sync", parse("true").unwrap()));
        descriptors.insert("follower".to_string(), SyncDescriptor::owning("sync", parse("true").unwrap()));
        descriptors.insert("borrower".to_string(), SyncDescriptor::inheriting("follower"));
        let mut registry = SyncRegistry::new(descriptors).unwrap();
        registry.observe("ref", 1.0, &ctx(1.0));
        registry.observe("follower", 1.05, &ctx(1.05));
        let delta = registry.offset_at("borrower", 10.0);
        assert!((delta - (-0.05)).abs() < 1e-9);
    }

    #[test]
    fn rejects_missing_reference() {
        let mut descriptors = HashMap::new();
        descriptors.insert("a".to_string(), SyncDescriptor::owning("sync", parse("true").unwrap()));
        assert_eq!(SyncRegistry::new(descriptors).unwrap_err(), SyncError::NoReferenceReader);
    }
}
