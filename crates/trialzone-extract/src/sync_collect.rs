use std::collections::HashMap;

use trialzone_expr::Value;
use trialzone_readers::{AnyBuffer, Router};
use trialzone_sync::SyncRegistry;

/// Feeds newly appended rows of each reader's designated sync buffer into
/// the [`SyncRegistry`]. Tracks one scan cursor per reader the same way
/// [`crate::Extractor::scan`] tracks one for the start buffer, so a row is
/// only ever offered to `observe` once.
#[derive(Debug, Default)]
pub struct SyncCollector {
    scanned_until: HashMap<String, f64>,
}

impl SyncCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call once per driver cycle, after the router has advanced.
    pub fn collect(&mut self, router: &Router, sync: &mut SyncRegistry) {
        let reader_names: Vec<String> = sync
            .descriptors()
            .filter(|(_, d)| d.reader_name.is_none())
            .map(|(name, _)| name.to_string())
            .collect();

        for reader_name in reader_names {
            let buffer_name = sync
                .descriptors()
                .find(|(name, _)| *name == reader_name)
                .map(|(_, d)| d.buffer_name.clone());
            let Some(buffer_name) = buffer_name else { continue };

            let Some(buffer) = find_reader_buffer(router, &reader_name, &buffer_name) else {
                continue;
            };
            let AnyBuffer::Numeric(numeric) = buffer else {
                continue;
            };

            let cursor = self.scanned_until.entry(reader_name.clone()).or_insert(f64::NEG_INFINITY);
            let rows = numeric.query(*cursor, f64::INFINITY);
            for row in &rows {
                let mut ctx = HashMap::new();
                ctx.insert("t".to_string(), Value::Number(row.t));
                if let Some(&first) = row.values.first() {
                    ctx.insert("value".to_string(), Value::Number(first));
                }
                ctx.insert(
                    "values".to_string(),
                    Value::List(row.values.iter().map(|v| Value::Number(*v)).collect()),
                );
                sync.observe(&reader_name, row.t, &ctx);
                *cursor = next_after(row.t);
            }
        }
    }
}

fn find_reader_buffer<'a>(router: &'a Router, reader_name: &str, buffer_name: &str) -> Option<&'a AnyBuffer> {
    for entry in router.entries() {
        if entry.reader_name() != reader_name {
            continue;
        }
        if entry.primary().name() == buffer_name {
            return Some(entry.primary());
        }
        for derived in entry.derived() {
            if derived.buffer.name() == buffer_name {
                return Some(&derived.buffer);
            }
        }
    }
    None
}

fn next_after(t: f64) -> f64 {
    if !t.is_finite() {
        return t;
    }
    f64::from_bits(t.to_bits() + 1)
}
