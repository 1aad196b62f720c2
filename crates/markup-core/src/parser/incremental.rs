//! Subtree reuse for incremental reparsing

use std::collections::HashMap;

use crate::green::{GreenElement, GreenNode};
use crate::syntax_kind::SyntaxKind;
use crate::text::{TextChangeRange, TextRange, TextSize};

/// Old element subtrees that may be reused, keyed by old full start
///
/// Only elements without diagnostics whose full range does not touch any
/// change are recorded. Touching is inclusive: an insertion right at an
/// element boundary disqualifies it. Elements that are not recorded are
/// searched for recordable ones below, through their content lists.
pub(crate) struct ReuseMap {
    elements: HashMap<u32, GreenNode>,
    changes: Vec<TextChangeRange>,
}

impl ReuseMap {
    pub(crate) fn new(old_root: &GreenNode, changes: &[TextChangeRange]) -> Self {
        let mut changes = changes.to_vec();
        changes.sort_by_key(|change| change.span.start());

        let mut elements = HashMap::new();
        let mut stack = vec![(old_root.clone(), TextSize::from(0))];
        while let Some((node, offset)) = stack.pop() {
            let mut child_offset = offset;
            for slot in node.slots() {
                let Some(child) = slot else {
                    continue;
                };
                let width = child.full_width();
                if let GreenElement::Node(child) = child {
                    let reusable = child.kind().is_element()
                        && !child.contains_diagnostics()
                        && !touches(&changes, TextRange::at(child_offset, width));
                    if reusable {
                        elements.insert(u32::from(child_offset), child.clone());
                    } else if child.kind().is_element() || child.kind() == SyntaxKind::List {
                        // elements only sit in lists
                        stack.push((child.clone(), child_offset));
                    }
                }
                child_offset += width;
            }
        }
        Self { elements, changes }
    }

    pub(crate) fn len(&self) -> usize {
        self.elements.len()
    }

    /// Element that started at the old offset corresponding to
    /// `new_position`
    pub(crate) fn lookup(&self, new_position: usize) -> Option<&GreenNode> {
        let old = self.to_old_position(new_position)?;
        let node = self.elements.get(&old)?;
        debug_assert!(matches!(node.kind(), SyntaxKind::Element | SyntaxKind::EmptyElement));
        Some(node)
    }

    fn to_old_position(&self, new_position: usize) -> Option<u32> {
        let new_position = new_position as i64;
        let mut delta = 0i64;
        for change in &self.changes {
            let new_start = i64::from(u32::from(change.span.start())) + delta;
            if new_position < new_start {
                break;
            }
            let new_end = new_start + i64::from(u32::from(change.new_length));
            if new_position < new_end {
                return None;
            }
            delta += change.length_delta();
        }
        u32::try_from(new_position - delta).ok()
    }
}

fn touches(changes: &[TextChangeRange], range: TextRange) -> bool {
    changes
        .iter()
        .any(|change| change.span.start() <= range.end() && range.start() <= change.span.end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::green::GreenToken;

    fn element(name: &str) -> GreenNode {
        let token = |kind, text| Some(GreenElement::from(GreenToken::new(kind, text)));
        let name_node = GreenNode::new(SyntaxKind::Name, [None, token(SyntaxKind::NameToken, name)]);
        GreenNode::new(
            SyntaxKind::EmptyElement,
            [
                token(SyntaxKind::LessThanToken, "<"),
                Some(name_node.into()),
                None,
                token(SyntaxKind::SlashGreaterThanToken, "/>"),
            ],
        )
    }

    fn body(children: Vec<GreenNode>) -> GreenNode {
        let list = GreenNode::new(
            SyntaxKind::List,
            children.into_iter().map(|child| Some(GreenElement::from(child))),
        );
        GreenNode::new(
            SyntaxKind::Body,
            [
                Some(list.into()),
                Some(GreenToken::new(SyntaxKind::EndOfFileToken, "").into()),
            ],
        )
    }

    #[test]
    fn test_untouched_elements_are_recorded() {
        // "<a/><b/><c/>" with "b" replaced by "bb"
        let root = body(vec![element("a"), element("b"), element("c")]);
        let change = TextChangeRange::new(TextRange::new(5.into(), 6.into()), 2.into());
        let map = ReuseMap::new(&root, &[change]);
        assert_eq!(map.len(), 2);
        assert!(map.lookup(0).is_some());
        assert!(map.lookup(4).is_none());
        // "c" moved from 8 to 9
        assert_eq!(map.lookup(9).map(GreenNode::kind), Some(SyntaxKind::EmptyElement));
        assert!(map.lookup(8).is_none());
    }

    #[test]
    fn test_untouched_list_inside_touched_element_is_searched() {
        // "<r><a/><b/></r>" with a change inside the start tag of "r"
        let token = |kind, text| Some(GreenElement::from(GreenToken::new(kind, text)));
        let name = |text| GreenNode::new(SyntaxKind::Name, [None, token(SyntaxKind::NameToken, text)]);
        let start_tag = GreenNode::new(
            SyntaxKind::StartTag,
            [
                token(SyntaxKind::LessThanToken, "<"),
                Some(name("r").into()),
                None,
                token(SyntaxKind::GreaterThanToken, ">"),
            ],
        );
        let content = GreenNode::new(
            SyntaxKind::List,
            [Some(element("a").into()), Some(element("b").into())],
        );
        let end_tag = GreenNode::new(
            SyntaxKind::EndTag,
            [
                token(SyntaxKind::LessThanSlashToken, "</"),
                Some(name("r").into()),
                token(SyntaxKind::GreaterThanToken, ">"),
            ],
        );
        let root_element = GreenNode::new(
            SyntaxKind::Element,
            [Some(start_tag.into()), Some(content.into()), Some(end_tag.into())],
        );
        let root = body(vec![root_element]);
        assert_eq!(root.to_full_string(), "<r><a/><b/></r>");

        let change = TextChangeRange::new(TextRange::new(1.into(), 2.into()), 4.into());
        let map = ReuseMap::new(&root, &[change]);
        assert_eq!(map.len(), 2);
        assert!(map.lookup(0).is_none());
        assert!(map.lookup(6).is_some());
        assert!(map.lookup(10).is_some());
    }

    #[test]
    fn test_positions_inside_changes_do_not_map() {
        let root = body(vec![element("a")]);
        let change = TextChangeRange::new(TextRange::new(10.into(), 10.into()), 5.into());
        let map = ReuseMap::new(&root, &[change]);
        assert_eq!(map.to_old_position(12), None);
        assert_eq!(map.to_old_position(15), Some(10));
        assert_eq!(map.to_old_position(3), Some(3));
    }
}
