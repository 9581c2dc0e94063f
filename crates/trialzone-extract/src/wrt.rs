use trialzone_core::BufferId;
use trialzone_readers::AnyBuffer;
use trialzone_sync::SyncRegistry;

use crate::lookup::find_buffer;

/// Configuration for the "with respect to" alignment event. `None` means
/// the trial stays anchored at `start_time`.
#[derive(Debug, Clone)]
pub struct WrtConfig {
    pub buffer: BufferId,
    pub column: usize,
    pub value: f64,
}

/// Resolves the absolute, reference-clock `wrt_time` for a window, or
/// `None` if no WRT is configured or no match falls in range (the caller
/// falls back to `wrt_time = start_time`).
pub fn resolve_wrt(
    router: &trialzone_readers::Router,
    sync: &SyncRegistry,
    config: Option<&WrtConfig>,
    start: f64,
    end: Option<f64>,
) -> Option<f64> {
    let config = config?;
    let (reader_name, buffer) = find_buffer(router, &config.buffer)?;
    let AnyBuffer::Numeric(numeric) = buffer else {
        return None;
    };
    let delta = sync.offset_at(reader_name, start);
    let end_bound = end.map(|e| e - delta).unwrap_or(f64::INFINITY);
    let rows = numeric.query(start - delta, end_bound);
    let matched = rows
        .iter()
        .find(|row| row.values.get(config.column) == Some(&config.value))?;
    Some(matched.t + delta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use trialzone_core::{BufferKind, NumericRow};
    use trialzone_readers::{AnyBuffer, InMemoryReader, Router, RouterEntry};
    use trialzone_sync::SyncDescriptor;

    fn reference_only_sync(reader_name: &str) -> SyncRegistry {
        let mut descriptors = HashMap::new();
        descriptors.insert(
            reader_name.to_string(),
            SyncDescriptor::reference("sync", trialzone_expr::parse("true").unwrap()),
        );
        SyncRegistry::new(descriptors).unwrap()
    }

    #[test]
    fn resolves_first_matching_event_in_window() {
        let mut numeric = trialzone_core::NumericEventBuffer::new("delim");
        numeric
            .append(vec![NumericRow::new(1.5, vec![42.0]), NumericRow::new(2.0, vec![1.0])])
            .unwrap();
        let mut router = Router::new();
        router.add_reader(RouterEntry::new(
            Box::new(InMemoryReader::new("r", Vec::new())),
            AnyBuffer::Numeric(numeric),
            Vec::new(),
        ));
        let sync = reference_only_sync("r");
        let config = WrtConfig {
            buffer: BufferId::new(BufferKind::NumericEvent, "delim"),
            column: 0,
            value: 42.0,
        };
        let wrt = resolve_wrt(&router, &sync, Some(&config), 1.0, Some(3.0));
        assert_eq!(wrt, Some(1.5));
    }

    #[test]
    fn returns_none_when_no_config() {
        let router = Router::new();
        let sync = reference_only_sync("r");
        assert_eq!(resolve_wrt(&router, &sync, None, 0.0, None), None);
    }
}
