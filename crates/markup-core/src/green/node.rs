use std::fmt;
use std::sync::Arc;

use super::{GreenElement, GreenToken, GreenTrivia, NodeFlags, SyntaxAnnotation};
use crate::NodeOrToken;
use crate::diagnostics::DiagnosticInfo;
use crate::syntax_kind::SyntaxKind;
use crate::text::TextSize;

/// An immutable interior node
///
/// Slots keep their grammar position even when empty, so a slot index always
/// means the same thing for a given kind.
#[derive(Clone, PartialEq, Eq)]
pub struct GreenNode(Arc<NodeData>);

#[derive(PartialEq, Eq)]
struct NodeData {
    kind: SyntaxKind,
    flags: NodeFlags,
    full_width: TextSize,
    /// Deepest chain of nested elements, this node included when it is one
    element_depth: u32,
    slots: Box<[Option<GreenElement>]>,
    diagnostics: Option<Arc<[DiagnosticInfo]>>,
    annotations: Option<Arc<[SyntaxAnnotation]>>,
}

impl GreenNode {
    pub fn new<I>(kind: SyntaxKind, slots: I) -> Self
    where
        I: IntoIterator<Item = Option<GreenElement>>,
    {
        Self::build(kind, slots.into_iter().collect(), Vec::new(), None)
    }

    fn build(
        kind: SyntaxKind,
        slots: Box<[Option<GreenElement>]>,
        diagnostics: Vec<DiagnosticInfo>,
        annotations: Option<Arc<[SyntaxAnnotation]>>,
    ) -> Self {
        debug_assert!(kind.is_node(), "{kind:?} is not a node kind");
        let mut flags = NodeFlags::NONE;
        let mut full_width = TextSize::from(0);
        let mut child_depth = 0;
        for slot in slots.iter().flatten() {
            flags |= slot.flags().inherited();
            full_width += slot.full_width();
            if let NodeOrToken::Node(node) = slot {
                child_depth = child_depth.max(node.element_depth());
            }
        }
        if !diagnostics.is_empty() {
            flags |= NodeFlags::CONTAINS_DIAGNOSTICS;
        }
        if annotations.is_some() {
            flags |= NodeFlags::CONTAINS_ANNOTATIONS;
        }
        let element_depth = if kind.is_element() {
            child_depth + 1
        } else {
            child_depth
        };
        Self(Arc::new(NodeData {
            kind,
            flags,
            full_width,
            element_depth,
            slots,
            diagnostics: (!diagnostics.is_empty()).then(|| Arc::from(diagnostics)),
            annotations,
        }))
    }

    pub fn kind(&self) -> SyntaxKind {
        self.0.kind
    }

    pub fn flags(&self) -> NodeFlags {
        self.0.flags
    }

    /// Sum of the full widths of all slots
    pub fn full_width(&self) -> TextSize {
        self.0.full_width
    }

    pub fn element_depth(&self) -> u32 {
        self.0.element_depth
    }

    pub fn slot_count(&self) -> usize {
        self.0.slots.len()
    }

    pub fn slot(&self, index: usize) -> Option<&GreenElement> {
        self.0.slots.get(index).and_then(Option::as_ref)
    }

    pub fn slots(&self) -> &[Option<GreenElement>] {
        &self.0.slots
    }

    /// Present children in order
    pub fn children(&self) -> impl Iterator<Item = &GreenElement> {
        self.0.slots.iter().flatten()
    }

    /// Diagnostics stored on this node itself
    pub fn diagnostics(&self) -> &[DiagnosticInfo] {
        self.0.diagnostics.as_deref().unwrap_or(&[])
    }

    pub fn annotations(&self) -> &[SyntaxAnnotation] {
        self.0.annotations.as_deref().unwrap_or(&[])
    }

    /// True when this node or anything below it carries diagnostics
    pub fn contains_diagnostics(&self) -> bool {
        self.0.flags.contains(NodeFlags::CONTAINS_DIAGNOSTICS)
    }

    pub fn contains_annotations(&self) -> bool {
        self.0.flags.contains(NodeFlags::CONTAINS_ANNOTATIONS)
    }

    pub fn ptr_eq(a: &GreenNode, b: &GreenNode) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    pub(crate) fn identity(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    pub fn first_token(&self) -> Option<&GreenToken> {
        self.children().find_map(|child| match child {
            NodeOrToken::Token(token) => Some(token),
            NodeOrToken::Node(node) => node.first_token(),
        })
    }

    pub fn last_token(&self) -> Option<&GreenToken> {
        self.0.slots.iter().rev().flatten().find_map(|child| match child {
            NodeOrToken::Token(token) => Some(token),
            NodeOrToken::Node(node) => node.last_token(),
        })
    }

    pub fn leading_trivia_width(&self) -> TextSize {
        self.first_token()
            .map(GreenToken::leading_trivia_width)
            .unwrap_or_default()
    }

    pub fn trailing_trivia_width(&self) -> TextSize {
        self.last_token()
            .map(GreenToken::trailing_trivia_width)
            .unwrap_or_default()
    }

    /// Copy of this node carrying `diagnostics` in addition to its own
    pub fn with_diagnostics(&self, diagnostics: Vec<DiagnosticInfo>) -> GreenNode {
        if diagnostics.is_empty() {
            return self.clone();
        }
        let mut all = self.diagnostics().to_vec();
        all.extend(diagnostics);
        Self::build(
            self.0.kind,
            self.0.slots.clone(),
            all,
            self.0.annotations.clone(),
        )
    }

    /// Copy of this node carrying `annotations` instead of its current ones
    pub fn with_annotations(&self, annotations: Vec<SyntaxAnnotation>) -> GreenNode {
        Self::build(
            self.0.kind,
            self.0.slots.clone(),
            self.diagnostics().to_vec(),
            (!annotations.is_empty()).then(|| Arc::from(annotations)),
        )
    }

    /// Copy of this node with `trivia` appended after its last token
    ///
    /// `None` when the node holds no token at all.
    pub fn with_trailing_trivia(&self, trivia: Vec<GreenTrivia>) -> Option<GreenNode> {
        let index = self.0.slots.iter().rposition(|slot| match slot {
            Some(NodeOrToken::Node(node)) => node.last_token().is_some(),
            Some(NodeOrToken::Token(_)) => true,
            None => false,
        })?;
        let last = self.0.slots[index].as_ref()?.with_trailing_trivia(trivia)?;
        Some(self.replace_slot(index, Some(last)))
    }

    /// Copy of this node with slot `index` replaced
    pub fn replace_slot(&self, index: usize, element: Option<GreenElement>) -> GreenNode {
        let mut slots = self.0.slots.clone();
        if let Some(slot) = slots.get_mut(index) {
            *slot = element;
        }
        Self::build(
            self.0.kind,
            slots,
            self.diagnostics().to_vec(),
            self.0.annotations.clone(),
        )
    }

    pub(crate) fn write_to(&self, out: &mut String) {
        let mut stack: Vec<&GreenElement> = self.0.slots.iter().rev().flatten().collect();
        while let Some(element) = stack.pop() {
            match element {
                NodeOrToken::Token(token) => token.write_to(out),
                NodeOrToken::Node(node) => stack.extend(node.0.slots.iter().rev().flatten()),
            }
        }
    }

    /// Full text of the subtree, trivia included
    pub fn to_full_string(&self) -> String {
        let mut out = String::with_capacity(usize::from(self.0.full_width));
        self.write_to(&mut out);
        out
    }
}

impl fmt::Debug for GreenNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}[{}] width={}",
            self.0.kind,
            self.0.slots.len(),
            u32::from(self.0.full_width)
        )
    }
}
