use std::fmt;

use super::{SyntaxNode, SyntaxToken, collect_diagnostics};
use crate::diagnostics::{DefaultMessageProvider, Diagnostic, MessageProvider};
use crate::green::{GreenElement, GreenTrivia};
use crate::syntax_kind::SyntaxKind;
use crate::text::{TextRange, TextSize};

/// Positioned view of one trivia of a token
///
/// `index` counts leading trivia first, then trailing trivia.
#[derive(Clone)]
pub struct SyntaxTrivia {
    token: SyntaxToken,
    index: u32,
    offset: TextSize,
    green: GreenTrivia,
}

impl SyntaxTrivia {
    pub(crate) fn new(token: SyntaxToken, index: usize, offset: TextSize, green: GreenTrivia) -> Self {
        Self {
            token,
            index: index as u32,
            offset,
            green,
        }
    }

    pub fn green(&self) -> &GreenTrivia {
        &self.green
    }

    pub fn kind(&self) -> SyntaxKind {
        self.green.kind()
    }

    /// Token owning this trivia
    pub fn token(&self) -> &SyntaxToken {
        &self.token
    }

    pub fn index(&self) -> usize {
        self.index as usize
    }

    pub fn is_leading(&self) -> bool {
        self.index() < self.token.green().leading_trivia().len()
    }

    pub fn full_width(&self) -> TextSize {
        self.green.full_width()
    }

    pub fn full_span(&self) -> TextRange {
        TextRange::at(self.offset, self.green.full_width())
    }

    pub fn has_structure(&self) -> bool {
        self.green.has_structure()
    }

    /// Structure node of structured trivia
    ///
    /// Memoized per tree: while a returned structure is alive, later calls
    /// return the same instance.
    pub fn structure(&self) -> Option<SyntaxNode> {
        let green = self.green.structure()?.clone();
        let key = (
            self.token.green().identity(),
            u32::from(self.token.position()),
            self.index,
        );
        let memo = self.token.parent().memo();
        Some(memo.get_or_create(key, || {
            SyntaxNode::new_structure(green, self, self.offset)
        }))
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics_with(&DefaultMessageProvider)
    }

    pub fn diagnostics_with(&self, provider: &dyn MessageProvider) -> Vec<Diagnostic> {
        let mut out = Vec::new();
        if let Some(structure) = self.green.structure() {
            collect_diagnostics(
                &GreenElement::Node(structure.clone()),
                self.offset,
                provider,
                &mut out,
            );
        }
        out
    }

    pub fn to_full_string(&self) -> String {
        self.green.to_full_string()
    }
}

impl fmt::Display for SyntaxTrivia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_full_string())
    }
}

impl fmt::Debug for SyntaxTrivia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let span = self.full_span();
        write!(
            f,
            "{:?}@{}..{}",
            self.kind(),
            u32::from(span.start()),
            u32::from(span.end())
        )
    }
}

impl PartialEq for SyntaxTrivia {
    fn eq(&self, other: &SyntaxTrivia) -> bool {
        self.token == other.token && self.index == other.index
    }
}

impl Eq for SyntaxTrivia {}
