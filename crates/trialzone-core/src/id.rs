use serde::{Deserialize, Serialize};

/// The three buffer varieties living in the Neutral Zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferKind {
    NumericEvent,
    TextEvent,
    Signal,
}

/// A buffer is identified by `(variety, name)`, not name alone: the same
/// name may appear across varieties without collision.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BufferId {
    pub kind: BufferKind,
    pub name: String,
}

impl BufferId {
    pub fn new(kind: BufferKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    pub fn numeric(name: impl Into<String>) -> Self {
        Self::new(BufferKind::NumericEvent, name)
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(BufferKind::TextEvent, name)
    }

    pub fn signal(name: impl Into<String>) -> Self {
        Self::new(BufferKind::Signal, name)
    }
}
