use crate::NodeOrToken;
use crate::diagnostics::{Diagnostic, MessageProvider};
use crate::green::{GreenElement, NodeFlags};
use crate::text::TextSize;

/// Collect the diagnostics of a green subtree that starts at `offset`.
///
/// Only descends into elements flagged as containing diagnostics. The result
/// is in document order; entries starting at the same offset keep tree order.
pub(crate) fn collect_diagnostics(
    root: &GreenElement,
    offset: TextSize,
    provider: &dyn MessageProvider,
    out: &mut Vec<Diagnostic>,
) {
    let start = out.len();
    let mut stack: Vec<(&GreenElement, TextSize)> = vec![(root, offset)];
    while let Some((element, position)) = stack.pop() {
        if !element.flags().contains(NodeFlags::CONTAINS_DIAGNOSTICS) {
            continue;
        }
        match element {
            NodeOrToken::Node(node) => {
                out.extend(
                    node.diagnostics()
                        .iter()
                        .map(|info| Diagnostic::from_info(info, position, provider)),
                );
                let mut children = Vec::with_capacity(node.slot_count());
                let mut child_position = position;
                for child in node.children() {
                    children.push((child, child_position));
                    child_position += child.full_width();
                }
                stack.extend(children.into_iter().rev());
            }
            NodeOrToken::Token(token) => {
                let mut trivia_position = position;
                for trivia in token.leading_trivia() {
                    if let Some(structure) = trivia.structure() {
                        let structure = GreenElement::Node(structure.clone());
                        collect_diagnostics(&structure, trivia_position, provider, out);
                    }
                    trivia_position += trivia.full_width();
                }
                out.extend(
                    token
                        .diagnostics()
                        .iter()
                        .map(|info| Diagnostic::from_info(info, position, provider)),
                );
                let mut trivia_position = position + token.leading_trivia_width() + token.width();
                for trivia in token.trailing_trivia() {
                    if let Some(structure) = trivia.structure() {
                        let structure = GreenElement::Node(structure.clone());
                        collect_diagnostics(&structure, trivia_position, provider, out);
                    }
                    trivia_position += trivia.full_width();
                }
            }
        }
    }
    out[start..].sort_by_key(|diagnostic| diagnostic.range.start());
}
