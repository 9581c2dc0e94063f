use trialzone_expr::Expr;

/// Per-reader sync configuration. A reader either carries its own
/// descriptor (`reader_name: None`) and observes sync events in its own
/// buffer, or borrows another reader's sync list via `reader_name`. The two
/// are mutually exclusive.
#[derive(Debug, Clone)]
pub struct SyncDescriptor {
    pub is_reference: bool,
    pub buffer_name: String,
    pub predicate: Expr,
    pub pairing_key: Option<Expr>,
    /// Set when this reader has no sync signal of its own and instead
    /// inherits another reader's offset corrections.
    pub reader_name: Option<String>,
}

impl SyncDescriptor {
    pub fn owning(buffer_name: impl Into<String>, predicate: Expr) -> Self {
        Self {
            is_reference: false,
            buffer_name: buffer_name.into(),
            predicate,
            pairing_key: None,
            reader_name: None,
        }
    }

    pub fn reference(buffer_name: impl Into<String>, predicate: Expr) -> Self {
        Self {
            is_reference: true,
            ..Self::owning(buffer_name, predicate)
        }
    }

    pub fn inheriting(reader_name: impl Into<String>) -> Self {
        Self {
            is_reference: false,
            buffer_name: String::new(),
            predicate: Expr::Bool(false),
            pairing_key: None,
            reader_name: Some(reader_name.into()),
        }
    }

    pub fn with_pairing_key(mut self, key: Expr) -> Self {
        self.pairing_key = Some(key);
        self
    }
}
