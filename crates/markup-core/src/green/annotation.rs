use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ANNOTATION_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque marker attached to green elements by tooling
///
/// Each annotation gets a process-unique id, so two annotations with the same
/// kind and data are still distinct. Clones share the id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SyntaxAnnotation {
    id: u64,
    kind: Arc<str>,
    data: Option<Arc<str>>,
}

impl SyntaxAnnotation {
    pub fn new(kind: impl Into<Arc<str>>) -> Self {
        Self {
            id: NEXT_ANNOTATION_ID.fetch_add(1, Ordering::Relaxed),
            kind: kind.into(),
            data: None,
        }
    }

    pub fn with_data(kind: impl Into<Arc<str>>, data: impl Into<Arc<str>>) -> Self {
        Self {
            data: Some(data.into()),
            ..Self::new(kind)
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn data(&self) -> Option<&str> {
        self.data.as_deref()
    }
}
