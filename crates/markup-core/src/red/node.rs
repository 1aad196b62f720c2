use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use super::walk::{Preorder, PreorderWithTokens, WalkEvent};
use super::{SyntaxElement, SyntaxToken, SyntaxTrivia, collect_diagnostics};
use crate::NodeOrToken;
use crate::diagnostics::{DefaultMessageProvider, Diagnostic, MessageProvider};
use crate::green::{GreenElement, GreenNode};
use crate::syntax_kind::SyntaxKind;
use crate::text::{TextRange, TextSize};

/// Dead entries are pruned once the memo grows past this many
const MEMO_PRUNE_THRESHOLD: usize = 64;

/// Structured-trivia instances of one tree, keyed by
/// `(token identity, token offset, trivia index)`
#[derive(Default)]
pub(crate) struct StructureMemo {
    entries: Mutex<HashMap<(usize, u32, u32), Weak<NodeData>>>,
}

impl StructureMemo {
    pub(crate) fn get_or_create(
        &self,
        key: (usize, u32, u32),
        create: impl FnOnce() -> SyntaxNode,
    ) -> SyntaxNode {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = entries.get(&key).and_then(Weak::upgrade) {
            return SyntaxNode(existing);
        }
        if entries.len() >= MEMO_PRUNE_THRESHOLD {
            entries.retain(|_, weak| weak.strong_count() > 0);
        }
        let node = create();
        entries.insert(key, Arc::downgrade(&node.0));
        node
    }
}

pub(crate) struct NodeData {
    green: GreenNode,
    parent: Option<SyntaxNode>,
    index: u32,
    offset: TextSize,
    structure_parent: Option<SyntaxTrivia>,
    memo: Arc<StructureMemo>,
}

/// Positioned, parent-linked view of a green node
#[derive(Clone)]
pub struct SyntaxNode(Arc<NodeData>);

/// Weak handle that does not keep a tree alive
#[derive(Clone)]
pub struct WeakSyntaxNode(Weak<NodeData>);

impl WeakSyntaxNode {
    pub fn upgrade(&self) -> Option<SyntaxNode> {
        self.0.upgrade().map(SyntaxNode)
    }
}

impl SyntaxNode {
    /// Root of a new tree starting at offset 0
    pub fn new_root(green: GreenNode) -> SyntaxNode {
        SyntaxNode(Arc::new(NodeData {
            green,
            parent: None,
            index: 0,
            offset: TextSize::from(0),
            structure_parent: None,
            memo: Arc::new(StructureMemo::default()),
        }))
    }

    pub(crate) fn new_structure(green: GreenNode, trivia: &SyntaxTrivia, offset: TextSize) -> SyntaxNode {
        SyntaxNode(Arc::new(NodeData {
            green,
            parent: None,
            index: 0,
            offset,
            structure_parent: Some(trivia.clone()),
            memo: trivia.token().parent().0.memo.clone(),
        }))
    }

    fn new_child(&self, green: GreenNode, index: usize, offset: TextSize) -> SyntaxNode {
        SyntaxNode(Arc::new(NodeData {
            green,
            parent: Some(self.clone()),
            index: index as u32,
            offset,
            structure_parent: None,
            memo: self.0.memo.clone(),
        }))
    }

    pub(crate) fn memo(&self) -> &StructureMemo {
        &self.0.memo
    }

    pub(crate) fn element_at(&self, index: usize, green: &GreenElement, offset: TextSize) -> SyntaxElement {
        match green {
            NodeOrToken::Node(node) => NodeOrToken::Node(self.new_child(node.clone(), index, offset)),
            NodeOrToken::Token(token) => {
                NodeOrToken::Token(SyntaxToken::new(self.clone(), index, offset, token.clone()))
            }
        }
    }

    pub fn green(&self) -> &GreenNode {
        &self.0.green
    }

    pub fn kind(&self) -> SyntaxKind {
        self.0.green.kind()
    }

    pub fn parent(&self) -> Option<SyntaxNode> {
        self.0.parent.clone()
    }

    /// The trivia this node is the structure of, for structured-trivia roots
    pub fn structure_parent(&self) -> Option<SyntaxTrivia> {
        self.0.structure_parent.clone()
    }

    pub fn is_structure(&self) -> bool {
        self.0.structure_parent.is_some()
    }

    /// Slot index within the parent
    pub fn index(&self) -> usize {
        self.0.index as usize
    }

    /// Absolute offset of the first character, leading trivia included
    pub fn position(&self) -> TextSize {
        self.0.offset
    }

    pub fn full_width(&self) -> TextSize {
        self.0.green.full_width()
    }

    pub fn full_span(&self) -> TextRange {
        TextRange::at(self.0.offset, self.0.green.full_width())
    }

    /// Span without the leading trivia of the first token and the trailing
    /// trivia of the last one
    pub fn span(&self) -> TextRange {
        let full = self.full_span();
        let start = full.start() + self.0.green.leading_trivia_width();
        let end = full.end() - self.0.green.trailing_trivia_width();
        TextRange::new(start, end.max(start))
    }

    pub fn downgrade(&self) -> WeakSyntaxNode {
        WeakSyntaxNode(Arc::downgrade(&self.0))
    }

    /// Identity comparison of the red wrappers themselves
    pub fn ptr_eq(a: &SyntaxNode, b: &SyntaxNode) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    pub fn ancestors(&self) -> impl Iterator<Item = SyntaxNode> + use<> {
        std::iter::successors(Some(self.clone()), SyntaxNode::parent)
    }

    /// Topmost node of the tree (or structure) containing this node
    pub fn root(&self) -> SyntaxNode {
        self.ancestors().last().unwrap_or_else(|| self.clone())
    }

    /// Element in slot `index`, if the slot is present
    pub fn slot(&self, index: usize) -> Option<SyntaxElement> {
        let slots = self.0.green.slots();
        let green = slots.get(index)?.as_ref()?;
        let offset = slots[..index]
            .iter()
            .flatten()
            .fold(self.0.offset, |acc, element| acc + element.full_width());
        Some(self.element_at(index, green, offset))
    }

    pub fn slot_node(&self, index: usize) -> Option<SyntaxNode> {
        self.slot(index).and_then(SyntaxElement::into_node)
    }

    pub fn slot_token(&self, index: usize) -> Option<SyntaxToken> {
        self.slot(index).and_then(SyntaxElement::into_token)
    }

    pub fn children(&self) -> SyntaxNodeChildren {
        SyntaxNodeChildren {
            inner: self.children_with_tokens(),
        }
    }

    pub fn children_with_tokens(&self) -> SyntaxElementChildren {
        SyntaxElementChildren {
            parent: self.clone(),
            next_index: 0,
            offset: self.0.offset,
        }
    }

    pub fn first_child(&self) -> Option<SyntaxNode> {
        self.children().next()
    }

    pub fn last_child(&self) -> Option<SyntaxNode> {
        self.children().last()
    }

    pub fn first_child_or_token(&self) -> Option<SyntaxElement> {
        self.children_with_tokens().next()
    }

    pub fn last_child_or_token(&self) -> Option<SyntaxElement> {
        self.children_with_tokens().last()
    }

    /// Following present slots of the parent
    pub(crate) fn siblings_after(
        parent: &SyntaxNode,
        index: usize,
        offset_after: TextSize,
    ) -> SyntaxElementChildren {
        SyntaxElementChildren {
            parent: parent.clone(),
            next_index: index + 1,
            offset: offset_after,
        }
    }

    pub fn next_sibling_or_token(&self) -> Option<SyntaxElement> {
        let parent = self.parent()?;
        SyntaxNode::siblings_after(&parent, self.index(), self.full_span().end()).next()
    }

    pub fn next_sibling(&self) -> Option<SyntaxNode> {
        let parent = self.parent()?;
        SyntaxNode::siblings_after(&parent, self.index(), self.full_span().end())
            .find_map(SyntaxElement::into_node)
    }

    pub fn prev_sibling_or_token(&self) -> Option<SyntaxElement> {
        let parent = self.parent()?;
        parent.prev_present(self.index(), self.0.offset)
    }

    pub fn prev_sibling(&self) -> Option<SyntaxNode> {
        let mut current: SyntaxElement = self.clone().into();
        loop {
            current = current.prev_sibling_or_token()?;
            if let NodeOrToken::Node(node) = current {
                return Some(node);
            }
        }
    }

    /// The present slot before `index`, given the offset where `index` starts
    pub(crate) fn prev_present(&self, index: usize, start: TextSize) -> Option<SyntaxElement> {
        let slots = self.0.green.slots();
        let (prev_index, green) = slots[..index]
            .iter()
            .enumerate()
            .rev()
            .find_map(|(i, slot)| slot.as_ref().map(|green| (i, green)))?;
        let offset = start - green.full_width();
        Some(self.element_at(prev_index, green, offset))
    }

    pub fn first_token(&self) -> Option<SyntaxToken> {
        let mut node = self.clone();
        loop {
            let mut next = None;
            for child in node.children_with_tokens() {
                match child {
                    NodeOrToken::Token(token) => return Some(token),
                    NodeOrToken::Node(child) => {
                        if child.green().first_token().is_some() {
                            next = Some(child);
                            break;
                        }
                    }
                }
            }
            node = next?;
        }
    }

    pub fn last_token(&self) -> Option<SyntaxToken> {
        let mut node = self.clone();
        loop {
            let children: Vec<SyntaxElement> = node.children_with_tokens().collect();
            let mut next = None;
            for child in children.into_iter().rev() {
                match child {
                    NodeOrToken::Token(token) => return Some(token),
                    NodeOrToken::Node(child) => {
                        if child.green().last_token().is_some() {
                            next = Some(child);
                            break;
                        }
                    }
                }
            }
            node = next?;
        }
    }

    /// Token whose full span contains `offset`; at the very end, the last token
    pub fn find_token(&self, offset: TextSize) -> Option<SyntaxToken> {
        let full = self.full_span();
        if offset < full.start() || offset > full.end() {
            return None;
        }
        let mut node = self.clone();
        loop {
            let found = node.children_with_tokens().find(|child| {
                let span = child.full_span();
                span.start() <= offset && offset < span.end()
            });
            match found {
                Some(NodeOrToken::Token(token)) => return Some(token),
                Some(NodeOrToken::Node(child)) => node = child,
                None => return node.last_token(),
            }
        }
    }

    /// Nodes of the subtree in preorder, this node first
    pub fn descendants(&self) -> impl Iterator<Item = SyntaxNode> + use<> {
        self.preorder().filter_map(|event| match event {
            WalkEvent::Enter(node) => Some(node),
            WalkEvent::Leave(_) => None,
        })
    }

    pub fn descendants_with_tokens(&self) -> impl Iterator<Item = SyntaxElement> + use<> {
        self.preorder_with_tokens().filter_map(|event| match event {
            WalkEvent::Enter(element) => Some(element),
            WalkEvent::Leave(_) => None,
        })
    }

    pub fn descendant_tokens(&self) -> impl Iterator<Item = SyntaxToken> + use<> {
        self.descendants_with_tokens()
            .filter_map(SyntaxElement::into_token)
    }

    pub fn preorder(&self) -> Preorder {
        Preorder::new(self.clone())
    }

    pub fn preorder_with_tokens(&self) -> PreorderWithTokens {
        PreorderWithTokens::new(self.clone())
    }

    pub fn contains_diagnostics(&self) -> bool {
        self.0.green.contains_diagnostics()
    }

    /// Diagnostics of the subtree with absolute positions, in document order
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics_with(&DefaultMessageProvider)
    }

    pub fn diagnostics_with(&self, provider: &dyn MessageProvider) -> Vec<Diagnostic> {
        let mut out = Vec::new();
        let green = GreenElement::Node(self.0.green.clone());
        collect_diagnostics(&green, self.0.offset, provider, &mut out);
        out
    }

    /// Source text of the subtree including all trivia
    pub fn to_full_string(&self) -> String {
        self.0.green.to_full_string()
    }
}

impl fmt::Display for SyntaxNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let full = self.to_full_string();
        let start = usize::from(self.0.green.leading_trivia_width());
        let end = full.len() - usize::from(self.0.green.trailing_trivia_width());
        f.write_str(&full[start..end.max(start)])
    }
}

impl fmt::Debug for SyntaxNode {
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

impl PartialEq for SyntaxNode {
    fn eq(&self, other: &SyntaxNode) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || (GreenNode::ptr_eq(&self.0.green, &other.0.green)
                && self.0.offset == other.0.offset
                && Arc::ptr_eq(&self.0.memo, &other.0.memo))
    }
}

impl Eq for SyntaxNode {}

impl Hash for SyntaxNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.green.identity().hash(state);
        self.0.offset.hash(state);
    }
}

/// Present child nodes, skipping tokens and empty slots
#[derive(Clone)]
pub struct SyntaxNodeChildren {
    inner: SyntaxElementChildren,
}

impl Iterator for SyntaxNodeChildren {
    type Item = SyntaxNode;

    fn next(&mut self) -> Option<SyntaxNode> {
        self.inner.by_ref().find_map(SyntaxElement::into_node)
    }
}

/// Present child elements, skipping empty slots
#[derive(Clone)]
pub struct SyntaxElementChildren {
    parent: SyntaxNode,
    next_index: usize,
    offset: TextSize,
}

impl Iterator for SyntaxElementChildren {
    type Item = SyntaxElement;

    fn next(&mut self) -> Option<SyntaxElement> {
        loop {
            let index = self.next_index;
            let slot = self.parent.0.green.slots().get(index)?;
            self.next_index += 1;
            if let Some(green) = slot {
                let offset = self.offset;
                self.offset += green.full_width();
                return Some(self.parent.element_at(index, green, offset));
            }
        }
    }
}
