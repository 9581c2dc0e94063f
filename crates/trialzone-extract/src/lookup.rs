use trialzone_core::BufferId;
use trialzone_readers::{AnyBuffer, Router};

/// Finds a buffer by `(variety, name)` across every reader the router owns,
/// returning the owning reader's name alongside it (needed to resolve its
/// sync offset).
pub fn find_buffer<'a>(router: &'a Router, id: &BufferId) -> Option<(&'a str, &'a AnyBuffer)> {
    for entry in router.entries() {
        if entry.primary().kind() == id.kind && entry.primary().name() == id.name {
            return Some((entry.reader_name(), entry.primary()));
        }
        for derived in entry.derived() {
            if derived.buffer.kind() == id.kind && derived.buffer.name() == id.name {
                return Some((entry.reader_name(), &derived.buffer));
            }
        }
    }
    None
}

/// All `(reader_name, buffer)` pairs the router currently owns, used for the
/// full-trial snapshot and for the garbage-collection pass.
pub fn all_buffers<'a>(router: &'a Router) -> Vec<(&'a str, &'a AnyBuffer)> {
    let mut out = Vec::new();
    for entry in router.entries() {
        out.push((entry.reader_name(), entry.primary()));
        for derived in entry.derived() {
            out.push((entry.reader_name(), &derived.buffer));
        }
    }
    out
}

pub fn discard_all_before(router: &mut Router, cutoff: f64) {
    for entry in router.entries_mut() {
        entry.primary_mut().discard_before(cutoff);
        for derived in entry.derived_mut() {
            derived.buffer.discard_before(cutoff);
        }
    }
}
