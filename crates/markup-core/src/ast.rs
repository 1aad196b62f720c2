//! Typed views over red nodes
//!
//! Each view wraps a [`SyntaxNode`] of one kind and exposes the grammar
//! slots by name. Views never fail on malformed input: a missing token is
//! still present (zero width), so accessors return empty text rather than
//! `None` where the grammar requires the slot.
//!
//! # Example
//!
//! ```ignore
//! use markup_core::{ParseOptions, SyntaxTree};
//! use markup_core::ast::{AstNode, Body};
//!
//! let tree = SyntaxTree::parse_text("<a x=\"1\"><b/></a>", ParseOptions::default());
//! let body = Body::cast(tree.get_root()).unwrap();
//! let root = body.root_element().unwrap();
//! assert_eq!(root.name(), "a");
//! assert_eq!(root.attribute("x").as_deref(), Some("1"));
//! ```

use crate::red::{SyntaxNode, SyntaxToken};
use crate::syntax_kind::SyntaxKind;

/// Conversion between red nodes and typed views
pub trait AstNode: Sized {
    fn can_cast(kind: SyntaxKind) -> bool;
    fn cast(node: SyntaxNode) -> Option<Self>;
    fn syntax(&self) -> &SyntaxNode;
}

/// Items of the list stored in `slot`, or nothing for an empty list
fn list_children(node: &SyntaxNode, slot: usize) -> impl Iterator<Item = SyntaxNode> + use<> {
    node.slot_node(slot)
        .filter(|list| list.kind() == SyntaxKind::List)
        .into_iter()
        .flat_map(|list| list.children())
}

fn token_value(token: Option<SyntaxToken>) -> String {
    token.map(|token| token.value_text().to_string()).unwrap_or_default()
}

// ============================================================================
// Document
// ============================================================================

/// Document root: top-level items and the end-of-file token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Body {
    syntax: SyntaxNode,
}

impl AstNode for Body {
    fn can_cast(kind: SyntaxKind) -> bool {
        kind == SyntaxKind::Body
    }

    fn cast(node: SyntaxNode) -> Option<Self> {
        if Self::can_cast(node.kind()) {
            Some(Self { syntax: node })
        } else {
            None
        }
    }

    fn syntax(&self) -> &SyntaxNode {
        &self.syntax
    }
}

impl Body {
    pub fn items(&self) -> impl Iterator<Item = SyntaxNode> + use<> {
        list_children(&self.syntax, 0)
    }

    /// Top-level elements; a well-formed document has exactly one
    pub fn elements(&self) -> impl Iterator<Item = AnyElement> + use<> {
        self.items().filter_map(AnyElement::cast)
    }

    pub fn root_element(&self) -> Option<AnyElement> {
        self.elements().next()
    }

    pub fn processing_instructions(&self) -> impl Iterator<Item = ProcessingInstruction> + use<> {
        self.items().filter_map(ProcessingInstruction::cast)
    }

    pub fn end_of_file(&self) -> Option<SyntaxToken> {
        self.syntax.slot_token(1)
    }
}

// ============================================================================
// Elements
// ============================================================================

/// Element with start tag, content and end tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    syntax: SyntaxNode,
}

impl AstNode for Element {
    fn can_cast(kind: SyntaxKind) -> bool {
        kind == SyntaxKind::Element
    }

    fn cast(node: SyntaxNode) -> Option<Self> {
        if Self::can_cast(node.kind()) {
            Some(Self { syntax: node })
        } else {
            None
        }
    }

    fn syntax(&self) -> &SyntaxNode {
        &self.syntax
    }
}

impl Element {
    pub fn start_tag(&self) -> Option<StartTag> {
        self.syntax.slot_node(0).and_then(StartTag::cast)
    }

    pub fn content(&self) -> impl Iterator<Item = SyntaxNode> + use<> {
        list_children(&self.syntax, 1)
    }

    pub fn end_tag(&self) -> Option<EndTag> {
        self.syntax.slot_node(2).and_then(EndTag::cast)
    }

    /// Whether the end tag was synthesized during recovery
    pub fn is_end_tag_missing(&self) -> bool {
        self.end_tag()
            .is_some_and(|end| u32::from(end.syntax().full_width()) == 0)
    }
}

/// Self-closing element `<name ... />`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyElement {
    syntax: SyntaxNode,
}

impl AstNode for EmptyElement {
    fn can_cast(kind: SyntaxKind) -> bool {
        kind == SyntaxKind::EmptyElement
    }

    fn cast(node: SyntaxNode) -> Option<Self> {
        if Self::can_cast(node.kind()) {
            Some(Self { syntax: node })
        } else {
            None
        }
    }

    fn syntax(&self) -> &SyntaxNode {
        &self.syntax
    }
}

impl EmptyElement {
    pub fn name(&self) -> Option<Name> {
        self.syntax.slot_node(1).and_then(Name::cast)
    }

    pub fn attributes(&self) -> impl Iterator<Item = Attribute> + use<> {
        list_children(&self.syntax, 2).filter_map(Attribute::cast)
    }
}

/// Either element form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnyElement {
    Element(Element),
    EmptyElement(EmptyElement),
}

impl AstNode for AnyElement {
    fn can_cast(kind: SyntaxKind) -> bool {
        kind.is_element()
    }

    fn cast(node: SyntaxNode) -> Option<Self> {
        match node.kind() {
            SyntaxKind::Element => Element::cast(node).map(AnyElement::Element),
            SyntaxKind::EmptyElement => EmptyElement::cast(node).map(AnyElement::EmptyElement),
            _ => None,
        }
    }

    fn syntax(&self) -> &SyntaxNode {
        match self {
            AnyElement::Element(element) => element.syntax(),
            AnyElement::EmptyElement(element) => element.syntax(),
        }
    }
}

impl AnyElement {
    pub fn name_node(&self) -> Option<Name> {
        match self {
            AnyElement::Element(element) => element.start_tag().and_then(|tag| tag.name()),
            AnyElement::EmptyElement(element) => element.name(),
        }
    }

    /// Qualified name, `prefix:local` when prefixed
    pub fn name(&self) -> String {
        self.name_node().map(|name| name.text()).unwrap_or_default()
    }

    pub fn attributes(&self) -> Vec<Attribute> {
        match self {
            AnyElement::Element(element) => element
                .start_tag()
                .map(|tag| tag.attributes().collect())
                .unwrap_or_default(),
            AnyElement::EmptyElement(element) => element.attributes().collect(),
        }
    }

    /// Decoded value of the first attribute named `name`
    pub fn attribute(&self, name: &str) -> Option<String> {
        self.attributes()
            .into_iter()
            .find(|attribute| attribute.name_text() == name)
            .map(|attribute| attribute.value())
    }

    pub fn child_elements(&self) -> Vec<AnyElement> {
        match self {
            AnyElement::Element(element) => element.content().filter_map(AnyElement::cast).collect(),
            AnyElement::EmptyElement(_) => Vec::new(),
        }
    }

    /// Decoded text directly inside the element, CDATA included
    pub fn text(&self) -> String {
        let AnyElement::Element(element) = self else {
            return String::new();
        };
        let mut out = String::new();
        for child in element.content() {
            if let Some(text) = Text::cast(child.clone()) {
                out.push_str(&text.value());
            } else if let Some(cdata) = CData::cast(child) {
                out.push_str(&cdata.value());
            }
        }
        out
    }
}

// ============================================================================
// Tags
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTag {
    syntax: SyntaxNode,
}

impl AstNode for StartTag {
    fn can_cast(kind: SyntaxKind) -> bool {
        kind == SyntaxKind::StartTag
    }

    fn cast(node: SyntaxNode) -> Option<Self> {
        if Self::can_cast(node.kind()) {
            Some(Self { syntax: node })
        } else {
            None
        }
    }

    fn syntax(&self) -> &SyntaxNode {
        &self.syntax
    }
}

impl StartTag {
    pub fn name(&self) -> Option<Name> {
        self.syntax.slot_node(1).and_then(Name::cast)
    }

    pub fn attributes(&self) -> impl Iterator<Item = Attribute> + use<> {
        list_children(&self.syntax, 2).filter_map(Attribute::cast)
    }

    pub fn greater_than_token(&self) -> Option<SyntaxToken> {
        self.syntax.slot_token(3)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndTag {
    syntax: SyntaxNode,
}

impl AstNode for EndTag {
    fn can_cast(kind: SyntaxKind) -> bool {
        kind == SyntaxKind::EndTag
    }

    fn cast(node: SyntaxNode) -> Option<Self> {
        if Self::can_cast(node.kind()) {
            Some(Self { syntax: node })
        } else {
            None
        }
    }

    fn syntax(&self) -> &SyntaxNode {
        &self.syntax
    }
}

impl EndTag {
    pub fn name(&self) -> Option<Name> {
        self.syntax.slot_node(1).and_then(Name::cast)
    }
}

// ============================================================================
// Names and attributes
// ============================================================================

/// Possibly prefixed name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name {
    syntax: SyntaxNode,
}

impl AstNode for Name {
    fn can_cast(kind: SyntaxKind) -> bool {
        kind == SyntaxKind::Name
    }

    fn cast(node: SyntaxNode) -> Option<Self> {
        if Self::can_cast(node.kind()) {
            Some(Self { syntax: node })
        } else {
            None
        }
    }

    fn syntax(&self) -> &SyntaxNode {
        &self.syntax
    }
}

impl Name {
    pub fn prefix(&self) -> Option<String> {
        self.syntax
            .slot_node(0)
            .and_then(|prefix| prefix.slot_token(0))
            .map(|token| token.text().to_string())
    }

    pub fn local_name(&self) -> String {
        self.syntax
            .slot_token(1)
            .map(|token| token.text().to_string())
            .unwrap_or_default()
    }

    pub fn text(&self) -> String {
        match self.prefix() {
            Some(prefix) => format!("{prefix}:{}", self.local_name()),
            None => self.local_name(),
        }
    }
}

/// `name="value"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    syntax: SyntaxNode,
}

impl AstNode for Attribute {
    fn can_cast(kind: SyntaxKind) -> bool {
        kind == SyntaxKind::Attribute
    }

    fn cast(node: SyntaxNode) -> Option<Self> {
        if Self::can_cast(node.kind()) {
            Some(Self { syntax: node })
        } else {
            None
        }
    }

    fn syntax(&self) -> &SyntaxNode {
        &self.syntax
    }
}

impl Attribute {
    pub fn name(&self) -> Option<Name> {
        self.syntax.slot_node(0).and_then(Name::cast)
    }

    pub fn name_text(&self) -> String {
        self.name().map(|name| name.text()).unwrap_or_default()
    }

    pub fn value_node(&self) -> Option<AttributeValue> {
        self.syntax.slot_node(2).and_then(AttributeValue::cast)
    }

    /// Entity-decoded value
    pub fn value(&self) -> String {
        self.value_node().map(|value| value.value()).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeValue {
    syntax: SyntaxNode,
}

impl AstNode for AttributeValue {
    fn can_cast(kind: SyntaxKind) -> bool {
        kind == SyntaxKind::AttributeValue
    }

    fn cast(node: SyntaxNode) -> Option<Self> {
        if Self::can_cast(node.kind()) {
            Some(Self { syntax: node })
        } else {
            None
        }
    }

    fn syntax(&self) -> &SyntaxNode {
        &self.syntax
    }
}

impl AttributeValue {
    pub fn open_quote(&self) -> Option<SyntaxToken> {
        self.syntax.slot_token(0)
    }

    pub fn text_token(&self) -> Option<SyntaxToken> {
        self.syntax.slot_token(1)
    }

    pub fn close_quote(&self) -> Option<SyntaxToken> {
        self.syntax.slot_token(2)
    }

    pub fn value(&self) -> String {
        token_value(self.text_token())
    }
}

// ============================================================================
// Character data
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text {
    syntax: SyntaxNode,
}

impl AstNode for Text {
    fn can_cast(kind: SyntaxKind) -> bool {
        kind == SyntaxKind::Text
    }

    fn cast(node: SyntaxNode) -> Option<Self> {
        if Self::can_cast(node.kind()) {
            Some(Self { syntax: node })
        } else {
            None
        }
    }

    fn syntax(&self) -> &SyntaxNode {
        &self.syntax
    }
}

impl Text {
    pub fn value(&self) -> String {
        token_value(self.syntax.slot_token(0))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    syntax: SyntaxNode,
}

impl AstNode for Comment {
    fn can_cast(kind: SyntaxKind) -> bool {
        kind == SyntaxKind::Comment
    }

    fn cast(node: SyntaxNode) -> Option<Self> {
        if Self::can_cast(node.kind()) {
            Some(Self { syntax: node })
        } else {
            None
        }
    }

    fn syntax(&self) -> &SyntaxNode {
        &self.syntax
    }
}

impl Comment {
    pub fn text(&self) -> String {
        token_value(self.syntax.slot_token(1))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CData {
    syntax: SyntaxNode,
}

impl AstNode for CData {
    fn can_cast(kind: SyntaxKind) -> bool {
        kind == SyntaxKind::CData
    }

    fn cast(node: SyntaxNode) -> Option<Self> {
        if Self::can_cast(node.kind()) {
            Some(Self { syntax: node })
        } else {
            None
        }
    }

    fn syntax(&self) -> &SyntaxNode {
        &self.syntax
    }
}

impl CData {
    pub fn value(&self) -> String {
        token_value(self.syntax.slot_token(1))
    }
}

/// `<?target body?>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingInstruction {
    syntax: SyntaxNode,
}

impl AstNode for ProcessingInstruction {
    fn can_cast(kind: SyntaxKind) -> bool {
        kind == SyntaxKind::ProcessingInstruction
    }

    fn cast(node: SyntaxNode) -> Option<Self> {
        if Self::can_cast(node.kind()) {
            Some(Self { syntax: node })
        } else {
            None
        }
    }

    fn syntax(&self) -> &SyntaxNode {
        &self.syntax
    }
}

impl ProcessingInstruction {
    pub fn target(&self) -> String {
        self.syntax
            .slot_token(1)
            .map(|token| token.text().to_string())
            .unwrap_or_default()
    }

    pub fn body(&self) -> String {
        token_value(self.syntax.slot_token(2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ParseOptions;
    use crate::tree::SyntaxTree;

    fn body(text: &str) -> Body {
        let tree = SyntaxTree::parse_text(text, ParseOptions::default());
        Body::cast(tree.get_root()).unwrap()
    }

    #[test]
    fn test_element_accessors() {
        let body = body("<x:root a=\"1 &amp; 2\" b='two'><child/>hi<![CDATA[ <raw> ]]></x:root>");
        let root = body.root_element().unwrap();
        assert_eq!(root.name(), "x:root");
        assert_eq!(root.name_node().unwrap().prefix().as_deref(), Some("x"));
        assert_eq!(root.attribute("a").as_deref(), Some("1 & 2"));
        assert_eq!(root.attribute("b").as_deref(), Some("two"));
        assert_eq!(root.attribute("c"), None);
        assert_eq!(root.text(), "hi <raw> ");

        let children = root.child_elements();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].name(), "child");
        assert!(matches!(children[0], AnyElement::EmptyElement(_)));
    }

    #[test]
    fn test_processing_instruction_and_comment() {
        let body = body("<?xml version=\"1.0\"?><!-- hello --><a/>");
        let pi = body.processing_instructions().next().unwrap();
        assert_eq!(pi.target(), "xml");
        assert_eq!(pi.body(), " version=\"1.0\"");

        let comment = body.items().find_map(Comment::cast).unwrap();
        assert_eq!(comment.text(), " hello ");
        assert!(body.end_of_file().is_some());
    }

    #[test]
    fn test_missing_end_tag_is_visible() {
        let body = body("<a><b></a>");
        let AnyElement::Element(a) = body.root_element().unwrap() else {
            panic!("expected element");
        };
        assert!(!a.is_end_tag_missing());
        let b = a.content().find_map(Element::cast).unwrap();
        assert!(b.is_end_tag_missing());
    }

    #[test]
    fn test_cast_rejects_other_kinds() {
        let body = body("<a/>");
        assert!(Element::cast(body.syntax().clone()).is_none());
        assert!(Attribute::cast(body.syntax().clone()).is_none());
    }
}
