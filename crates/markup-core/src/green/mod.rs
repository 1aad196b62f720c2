//! Green (internal) syntax tree
//!
//! Green elements are immutable, positionless and reference counted, so a
//! subtree can appear at several positions or in several trees at once.
//! Every node caches its full width at construction; positions are computed
//! by the red layer from ancestor widths.
//!
//! ## Elements
//!
//! - [`GreenNode`]: kind, slots (some possibly empty), diagnostics, annotations
//! - [`GreenToken`]: kind, text, decoded value, leading and trailing trivia
//! - [`GreenTrivia`]: whitespace, end of line, comment, or a structure node
//!
//! Small node shapes are interned through [`NodeCache`], either per parse or
//! through a process-wide [`SharedNodeCache`].

mod annotation;
mod cache;
mod factory;
mod flags;
mod node;
mod token;
mod trivia;

pub use annotation::SyntaxAnnotation;
pub use cache::{CacheStats, NodeCache, SharedNodeCache};
pub use factory::SyntaxFactory;
pub use flags::NodeFlags;
pub use node::GreenNode;
pub use token::GreenToken;
pub use trivia::GreenTrivia;

use crate::NodeOrToken;
use crate::syntax_kind::SyntaxKind;
use crate::text::TextSize;

/// A green node or token occupying one slot
pub type GreenElement = NodeOrToken<GreenNode, GreenToken>;

impl GreenElement {
    pub fn kind(&self) -> SyntaxKind {
        match self {
            NodeOrToken::Node(node) => node.kind(),
            NodeOrToken::Token(token) => token.kind(),
        }
    }

    pub fn full_width(&self) -> TextSize {
        match self {
            NodeOrToken::Node(node) => node.full_width(),
            NodeOrToken::Token(token) => token.full_width(),
        }
    }

    pub fn flags(&self) -> NodeFlags {
        match self {
            NodeOrToken::Node(node) => node.flags(),
            NodeOrToken::Token(token) => token.flags(),
        }
    }

    pub fn last_token(&self) -> Option<&GreenToken> {
        match self {
            NodeOrToken::Node(node) => node.last_token(),
            NodeOrToken::Token(token) => Some(token),
        }
    }

    /// Copy with `trivia` appended after the last token; `None` without one
    pub fn with_trailing_trivia(&self, trivia: Vec<GreenTrivia>) -> Option<GreenElement> {
        match self {
            NodeOrToken::Node(node) => node.with_trailing_trivia(trivia).map(NodeOrToken::Node),
            NodeOrToken::Token(token) => Some(token.with_appended_trivia(trivia).into()),
        }
    }

    /// Address used as identity by the node cache
    pub(crate) fn identity(&self) -> usize {
        match self {
            NodeOrToken::Node(node) => node.identity(),
            NodeOrToken::Token(token) => token.identity(),
        }
    }

    pub(crate) fn write_to(&self, out: &mut String) {
        match self {
            NodeOrToken::Node(node) => node.write_to(out),
            NodeOrToken::Token(token) => token.write_to(out),
        }
    }
}

impl From<GreenNode> for GreenElement {
    fn from(node: GreenNode) -> Self {
        NodeOrToken::Node(node)
    }
}

impl From<GreenToken> for GreenElement {
    fn from(token: GreenToken) -> Self {
        NodeOrToken::Token(token)
    }
}
