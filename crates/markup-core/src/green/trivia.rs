use std::fmt;
use std::sync::Arc;

use super::{GreenNode, NodeFlags};
use crate::syntax_kind::SyntaxKind;
use crate::text::{TextSize, text_size};

/// Trivia attached to a green token
///
/// Plain trivia stores its text. Structured trivia (skipped tokens) stores a
/// green node instead and reports that node's full width.
#[derive(Clone, PartialEq, Eq)]
pub struct GreenTrivia(Arc<TriviaData>);

#[derive(PartialEq, Eq)]
struct TriviaData {
    kind: SyntaxKind,
    text: Box<str>,
    structure: Option<GreenNode>,
}

impl GreenTrivia {
    pub fn new(kind: SyntaxKind, text: &str) -> Self {
        debug_assert!(kind.is_trivia(), "{kind:?} is not a trivia kind");
        Self(Arc::new(TriviaData {
            kind,
            text: text.into(),
            structure: None,
        }))
    }

    pub fn structured(kind: SyntaxKind, structure: GreenNode) -> Self {
        debug_assert!(kind.is_trivia(), "{kind:?} is not a trivia kind");
        Self(Arc::new(TriviaData {
            kind,
            text: Box::default(),
            structure: Some(structure),
        }))
    }

    pub fn kind(&self) -> SyntaxKind {
        self.0.kind
    }

    /// Text of plain trivia; empty for structured trivia
    pub fn text(&self) -> &str {
        &self.0.text
    }

    pub fn structure(&self) -> Option<&GreenNode> {
        self.0.structure.as_ref()
    }

    pub fn has_structure(&self) -> bool {
        self.0.structure.is_some()
    }

    pub fn full_width(&self) -> TextSize {
        match &self.0.structure {
            Some(structure) => structure.full_width(),
            None => text_size(self.0.text.len()),
        }
    }

    pub fn flags(&self) -> NodeFlags {
        match &self.0.structure {
            Some(structure) => {
                let mut flags = structure.flags().inherited() | NodeFlags::CONTAINS_STRUCTURED_TRIVIA;
                if self.0.kind == SyntaxKind::SkippedTokensTrivia {
                    flags |= NodeFlags::CONTAINS_SKIPPED_TEXT;
                }
                flags
            }
            None => NodeFlags::NONE,
        }
    }

    pub fn ptr_eq(a: &GreenTrivia, b: &GreenTrivia) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    pub(crate) fn identity(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    pub(crate) fn write_to(&self, out: &mut String) {
        match &self.0.structure {
            Some(structure) => structure.write_to(out),
            None => out.push_str(&self.0.text),
        }
    }

    pub fn to_full_string(&self) -> String {
        let mut out = String::new();
        self.write_to(&mut out);
        out
    }
}

impl fmt::Debug for GreenTrivia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.structure {
            Some(structure) => write!(f, "{:?}({structure:?})", self.0.kind),
            None => write!(f, "{:?}({:?})", self.0.kind, self.0.text),
        }
    }
}

/// Total width of a trivia list
pub(crate) fn trivia_width(list: &[GreenTrivia]) -> TextSize {
    list
        .iter()
        .fold(TextSize::from(0), |acc, trivia| acc + trivia.full_width())
}
