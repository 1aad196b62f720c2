//! Red (external) syntax tree
//!
//! Red elements wrap green ones with an absolute position and a parent
//! link. They are created on demand during navigation and are cheap to
//! clone; navigating to the same child twice yields equal (not necessarily
//! identical) wrappers.
//!
//! Structured trivia is rooted separately: its structure node has no parent
//! node, only a [`SyntaxTrivia`] it belongs to. Structures are memoized per
//! tree so repeated access returns the same instance while it is alive.

mod diagnostics;
mod node;
mod token;
mod trivia;
mod walk;

pub use node::{SyntaxElementChildren, SyntaxNode, SyntaxNodeChildren, WeakSyntaxNode};
pub use token::SyntaxToken;
pub use trivia::SyntaxTrivia;
pub use walk::{Preorder, PreorderWithTokens, SyntaxWalker, WalkDepth, WalkEvent};

pub(crate) use diagnostics::collect_diagnostics;

use crate::NodeOrToken;
use crate::syntax_kind::SyntaxKind;
use crate::text::TextRange;

/// A red node or token
pub type SyntaxElement = NodeOrToken<SyntaxNode, SyntaxToken>;

impl SyntaxElement {
    pub fn kind(&self) -> SyntaxKind {
        match self {
            NodeOrToken::Node(node) => node.kind(),
            NodeOrToken::Token(token) => token.kind(),
        }
    }

    pub fn full_span(&self) -> TextRange {
        match self {
            NodeOrToken::Node(node) => node.full_span(),
            NodeOrToken::Token(token) => token.full_span(),
        }
    }

    pub fn span(&self) -> TextRange {
        match self {
            NodeOrToken::Node(node) => node.span(),
            NodeOrToken::Token(token) => token.span(),
        }
    }

    pub fn parent(&self) -> Option<SyntaxNode> {
        match self {
            NodeOrToken::Node(node) => node.parent(),
            NodeOrToken::Token(token) => Some(token.parent().clone()),
        }
    }

    /// Slot index within the parent
    pub fn index(&self) -> usize {
        match self {
            NodeOrToken::Node(node) => node.index(),
            NodeOrToken::Token(token) => token.index(),
        }
    }

    pub fn next_sibling_or_token(&self) -> Option<SyntaxElement> {
        match self {
            NodeOrToken::Node(node) => node.next_sibling_or_token(),
            NodeOrToken::Token(token) => token.next_sibling_or_token(),
        }
    }

    pub fn prev_sibling_or_token(&self) -> Option<SyntaxElement> {
        match self {
            NodeOrToken::Node(node) => node.prev_sibling_or_token(),
            NodeOrToken::Token(token) => token.prev_sibling_or_token(),
        }
    }

    pub fn to_full_string(&self) -> String {
        match self {
            NodeOrToken::Node(node) => node.to_full_string(),
            NodeOrToken::Token(token) => token.to_full_string(),
        }
    }
}

impl From<SyntaxNode> for SyntaxElement {
    fn from(node: SyntaxNode) -> Self {
        NodeOrToken::Node(node)
    }
}

impl From<SyntaxToken> for SyntaxElement {
    fn from(token: SyntaxToken) -> Self {
        NodeOrToken::Token(token)
    }
}
