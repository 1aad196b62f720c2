//! Preorder traversal and the visitor trait built on it

use super::{SyntaxElement, SyntaxNode, SyntaxToken, SyntaxTrivia};
use crate::NodeOrToken;

/// Entering or leaving an element during a preorder walk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WalkEvent<T> {
    Enter(T),
    Leave(T),
}

impl<T> WalkEvent<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> WalkEvent<U> {
        match self {
            WalkEvent::Enter(value) => WalkEvent::Enter(f(value)),
            WalkEvent::Leave(value) => WalkEvent::Leave(f(value)),
        }
    }
}

/// Preorder walk over nodes; iterative, so depth does not grow the stack
pub struct Preorder {
    start: SyntaxNode,
    next: Option<WalkEvent<SyntaxNode>>,
    skip_subtree: bool,
}

impl Preorder {
    pub(crate) fn new(start: SyntaxNode) -> Preorder {
        let next = Some(WalkEvent::Enter(start.clone()));
        Preorder {
            start,
            next,
            skip_subtree: false,
        }
    }

    /// Do not descend into the node most recently entered
    pub fn skip_subtree(&mut self) {
        self.skip_subtree = true;
    }

    #[cold]
    fn do_skip(&mut self) {
        self.next = self.next.take().and_then(|next| match next {
            WalkEvent::Enter(first_child) => first_child.parent().map(WalkEvent::Leave),
            WalkEvent::Leave(parent) => Some(WalkEvent::Leave(parent)),
        })
    }
}

impl Iterator for Preorder {
    type Item = WalkEvent<SyntaxNode>;

    fn next(&mut self) -> Option<WalkEvent<SyntaxNode>> {
        if self.skip_subtree {
            self.do_skip();
            self.skip_subtree = false;
        }
        let next = self.next.take();
        self.next = next.as_ref().and_then(|next| {
            Some(match next {
                WalkEvent::Enter(node) => match node.first_child() {
                    Some(child) => WalkEvent::Enter(child),
                    None => WalkEvent::Leave(node.clone()),
                },
                WalkEvent::Leave(node) => {
                    if node == &self.start {
                        return None;
                    }
                    match node.next_sibling() {
                        Some(sibling) => WalkEvent::Enter(sibling),
                        None => WalkEvent::Leave(node.parent()?),
                    }
                }
            })
        });
        next
    }
}

/// Preorder walk over nodes and tokens
pub struct PreorderWithTokens {
    start: SyntaxElement,
    next: Option<WalkEvent<SyntaxElement>>,
    skip_subtree: bool,
}

impl PreorderWithTokens {
    pub(crate) fn new(start: SyntaxNode) -> PreorderWithTokens {
        let next = Some(WalkEvent::Enter(start.clone().into()));
        PreorderWithTokens {
            start: start.into(),
            next,
            skip_subtree: false,
        }
    }

    pub fn skip_subtree(&mut self) {
        self.skip_subtree = true;
    }

    #[cold]
    fn do_skip(&mut self) {
        self.next = self.next.take().and_then(|next| match next {
            WalkEvent::Enter(first_child) => first_child
                .parent()
                .map(|parent| WalkEvent::Leave(parent.into())),
            WalkEvent::Leave(parent) => Some(WalkEvent::Leave(parent)),
        })
    }
}

impl Iterator for PreorderWithTokens {
    type Item = WalkEvent<SyntaxElement>;

    fn next(&mut self) -> Option<WalkEvent<SyntaxElement>> {
        if self.skip_subtree {
            self.do_skip();
            self.skip_subtree = false;
        }
        let next = self.next.take();
        self.next = next.as_ref().and_then(|next| {
            Some(match next {
                WalkEvent::Enter(element) => match element {
                    NodeOrToken::Node(node) => match node.first_child_or_token() {
                        Some(child) => WalkEvent::Enter(child),
                        None => WalkEvent::Leave(node.clone().into()),
                    },
                    NodeOrToken::Token(token) => WalkEvent::Leave(token.clone().into()),
                },
                WalkEvent::Leave(element) if element == &self.start => return None,
                WalkEvent::Leave(element) => match element.next_sibling_or_token() {
                    Some(sibling) => WalkEvent::Enter(sibling),
                    None => WalkEvent::Leave(element.parent()?.into()),
                },
            })
        });
        next
    }
}

/// How far a [`SyntaxWalker`] descends
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum WalkDepth {
    #[default]
    Nodes,
    Tokens,
    Trivia,
    /// Trivia, and the nodes inside structured trivia
    StructuredTrivia,
}

/// Visitor over a red tree
///
/// Override the hooks of interest; [`SyntaxWalker::walk`] drives them in
/// document order.
pub trait SyntaxWalker {
    fn depth(&self) -> WalkDepth {
        WalkDepth::Nodes
    }

    fn enter_node(&mut self, _node: &SyntaxNode) {}

    fn leave_node(&mut self, _node: &SyntaxNode) {}

    fn visit_token(&mut self, _token: &SyntaxToken) {}

    fn visit_trivia(&mut self, _trivia: &SyntaxTrivia) {}

    fn walk(&mut self, root: &SyntaxNode)
    where
        Self: Sized,
    {
        walk_dyn(self, root);
    }
}

fn walk_dyn(walker: &mut dyn SyntaxWalker, root: &SyntaxNode) {
    let depth = walker.depth();
    if depth == WalkDepth::Nodes {
        for event in root.preorder() {
            match event {
                WalkEvent::Enter(node) => walker.enter_node(&node),
                WalkEvent::Leave(node) => walker.leave_node(&node),
            }
        }
        return;
    }
    for event in root.preorder_with_tokens() {
        match event {
            WalkEvent::Enter(NodeOrToken::Node(node)) => walker.enter_node(&node),
            WalkEvent::Leave(NodeOrToken::Node(node)) => walker.leave_node(&node),
            WalkEvent::Enter(NodeOrToken::Token(token)) => {
                if depth >= WalkDepth::Trivia {
                    for trivia in token.leading_trivia() {
                        visit_trivia(walker, &trivia, depth);
                    }
                }
                walker.visit_token(&token);
                if depth >= WalkDepth::Trivia {
                    for trivia in token.trailing_trivia() {
                        visit_trivia(walker, &trivia, depth);
                    }
                }
            }
            WalkEvent::Leave(NodeOrToken::Token(_)) => {}
        }
    }
}

fn visit_trivia(walker: &mut dyn SyntaxWalker, trivia: &SyntaxTrivia, depth: WalkDepth) {
    walker.visit_trivia(trivia);
    if depth == WalkDepth::StructuredTrivia
        && let Some(structure) = trivia.structure()
    {
        walk_dyn(walker, &structure);
    }
}
