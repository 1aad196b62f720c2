use std::fmt;
use std::hash::{Hash, Hasher};

use super::{SyntaxElement, SyntaxNode, SyntaxTrivia, collect_diagnostics};
use crate::NodeOrToken;
use crate::diagnostics::{DefaultMessageProvider, Diagnostic, MessageProvider};
use crate::green::{GreenElement, GreenToken};
use crate::syntax_kind::SyntaxKind;
use crate::text::{TextRange, TextSize};

/// Positioned view of a green token
#[derive(Clone)]
pub struct SyntaxToken {
    parent: SyntaxNode,
    index: u32,
    offset: TextSize,
    green: GreenToken,
}

impl SyntaxToken {
    pub(crate) fn new(parent: SyntaxNode, index: usize, offset: TextSize, green: GreenToken) -> Self {
        Self {
            parent,
            index: index as u32,
            offset,
            green,
        }
    }

    pub fn green(&self) -> &GreenToken {
        &self.green
    }

    pub fn kind(&self) -> SyntaxKind {
        self.green.kind()
    }

    pub fn text(&self) -> &str {
        self.green.text()
    }

    /// Decoded value, e.g. with entities resolved
    pub fn value_text(&self) -> &str {
        self.green.value_text()
    }

    pub fn is_missing(&self) -> bool {
        self.green.is_missing()
    }

    pub fn parent(&self) -> &SyntaxNode {
        &self.parent
    }

    pub fn ancestors(&self) -> impl Iterator<Item = SyntaxNode> + use<> {
        self.parent.ancestors()
    }

    pub fn index(&self) -> usize {
        self.index as usize
    }

    /// Absolute offset including leading trivia
    pub fn position(&self) -> TextSize {
        self.offset
    }

    pub fn full_span(&self) -> TextRange {
        TextRange::at(self.offset, self.green.full_width())
    }

    pub fn span(&self) -> TextRange {
        TextRange::at(self.offset + self.green.leading_trivia_width(), self.green.width())
    }

    pub fn leading_trivia(&self) -> impl Iterator<Item = SyntaxTrivia> + use<> {
        let token = self.clone();
        let count = self.green.leading_trivia().len();
        let mut offset = self.offset;
        (0..count).map(move |index| {
            let green = token.green.leading_trivia()[index].clone();
            let trivia = SyntaxTrivia::new(token.clone(), index, offset, green);
            offset += trivia.full_width();
            trivia
        })
    }

    pub fn trailing_trivia(&self) -> impl Iterator<Item = SyntaxTrivia> + use<> {
        let token = self.clone();
        let leading = self.green.leading_trivia().len();
        let count = self.green.trailing_trivia().len();
        let mut offset = self.span().end();
        (0..count).map(move |index| {
            let green = token.green.trailing_trivia()[index].clone();
            let trivia = SyntaxTrivia::new(token.clone(), leading + index, offset, green);
            offset += trivia.full_width();
            trivia
        })
    }

    /// Leading trivia followed by trailing trivia
    pub fn all_trivia(&self) -> impl Iterator<Item = SyntaxTrivia> + use<> {
        self.leading_trivia().chain(self.trailing_trivia())
    }

    pub fn next_sibling_or_token(&self) -> Option<SyntaxElement> {
        SyntaxNode::siblings_after(&self.parent, self.index(), self.full_span().end()).next()
    }

    pub fn prev_sibling_or_token(&self) -> Option<SyntaxElement> {
        self.parent.prev_present(self.index(), self.offset)
    }

    /// Next token in document order, missing tokens included
    pub fn next_token(&self) -> Option<SyntaxToken> {
        let mut current: SyntaxElement = self.clone().into();
        loop {
            match current.next_sibling_or_token() {
                Some(NodeOrToken::Token(token)) => return Some(token),
                Some(NodeOrToken::Node(node)) => match node.first_token() {
                    Some(token) => return Some(token),
                    None => current = node.into(),
                },
                None => current = current.parent()?.into(),
            }
        }
    }

    /// Previous token in document order, missing tokens included
    pub fn prev_token(&self) -> Option<SyntaxToken> {
        let mut current: SyntaxElement = self.clone().into();
        loop {
            match current.prev_sibling_or_token() {
                Some(NodeOrToken::Token(token)) => return Some(token),
                Some(NodeOrToken::Node(node)) => match node.last_token() {
                    Some(token) => return Some(token),
                    None => current = node.into(),
                },
                None => current = current.parent()?.into(),
            }
        }
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics_with(&DefaultMessageProvider)
    }

    pub fn diagnostics_with(&self, provider: &dyn MessageProvider) -> Vec<Diagnostic> {
        let mut out = Vec::new();
        collect_diagnostics(
            &GreenElement::Token(self.green.clone()),
            self.offset,
            provider,
            &mut out,
        );
        out
    }

    pub fn to_full_string(&self) -> String {
        self.green.to_full_string()
    }
}

impl fmt::Display for SyntaxToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

impl fmt::Debug for SyntaxToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let span = self.span();
        write!(
            f,
            "{:?}@{}..{} {:?}",
            self.kind(),
            u32::from(span.start()),
            u32::from(span.end()),
            self.text()
        )
    }
}

impl PartialEq for SyntaxToken {
    fn eq(&self, other: &SyntaxToken) -> bool {
        self.parent == other.parent && self.index == other.index
    }
}

impl Eq for SyntaxToken {}

impl Hash for SyntaxToken {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.parent.hash(state);
        self.index.hash(state);
    }
}
