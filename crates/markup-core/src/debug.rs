//! Deterministic textual dump of a red tree
//!
//! One line per node or token, indented two spaces per level:
//!
//! ```text
//! Body@0..4
//!   List@0..4
//!     EmptyElement@0..4
//!       LessThanToken@0..1 "<"
//! ```

use std::fmt::Write;

use crate::NodeOrToken;
use crate::red::{SyntaxNode, SyntaxToken, SyntaxTrivia, WalkEvent};
use crate::text::TextRange;

/// What [`dump`] includes besides nodes and tokens
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DumpOptions {
    /// Trivia lines under each token, structured trivia expanded
    pub trivia: bool,
    /// Diagnostics after the tree
    pub diagnostics: bool,
}

impl DumpOptions {
    pub fn with_trivia(mut self) -> Self {
        self.trivia = true;
        self
    }

    pub fn with_diagnostics(mut self) -> Self {
        self.diagnostics = true;
        self
    }
}

pub fn dump(root: &SyntaxNode, options: DumpOptions) -> String {
    let mut out = String::new();
    dump_node(root, 0, options, &mut out);
    if options.diagnostics {
        for diagnostic in root.diagnostics() {
            let _ = writeln!(out, "{diagnostic}");
        }
    }
    out
}

fn dump_node(root: &SyntaxNode, base: usize, options: DumpOptions, out: &mut String) {
    let mut level = base;
    for event in root.preorder_with_tokens() {
        match event {
            WalkEvent::Enter(NodeOrToken::Node(node)) => {
                let range = range_text(node.full_span());
                let _ = writeln!(out, "{:indent$}{:?}@{range}", "", node.kind(), indent = level * 2);
                level += 1;
            }
            WalkEvent::Enter(NodeOrToken::Token(token)) => {
                dump_token(&token, level, options, out);
            }
            WalkEvent::Leave(NodeOrToken::Node(_)) => level -= 1,
            WalkEvent::Leave(NodeOrToken::Token(_)) => {}
        }
    }
}

fn dump_token(token: &SyntaxToken, level: usize, options: DumpOptions, out: &mut String) {
    let _ = write!(
        out,
        "{:indent$}{:?}@{} {:?}",
        "",
        token.kind(),
        range_text(token.span()),
        token.text(),
        indent = level * 2
    );
    if token.is_missing() {
        out.push_str(" (missing)");
    }
    if token.value_text() != token.text() {
        let _ = write!(out, " = {:?}", token.value_text());
    }
    out.push('\n');

    if options.trivia {
        for trivia in token.leading_trivia() {
            dump_trivia(&trivia, "leading", level + 1, options, out);
        }
        for trivia in token.trailing_trivia() {
            dump_trivia(&trivia, "trailing", level + 1, options, out);
        }
    }
}

fn dump_trivia(trivia: &SyntaxTrivia, side: &str, level: usize, options: DumpOptions, out: &mut String) {
    let _ = writeln!(
        out,
        "{:indent$}{side} {:?}@{} {:?}",
        "",
        trivia.kind(),
        range_text(trivia.full_span()),
        trivia.to_full_string(),
        indent = level * 2
    );
    if let Some(structure) = trivia.structure() {
        dump_node(&structure, level + 1, options, out);
    }
}

fn range_text(range: TextRange) -> String {
    format!("{}..{}", u32::from(range.start()), u32::from(range.end()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ParseOptions;
    use crate::tree::SyntaxTree;

    fn root(text: &str) -> SyntaxNode {
        SyntaxTree::parse_text(text, ParseOptions::default()).get_root()
    }

    #[test]
    fn test_dump_empty_element() {
        let dumped = dump(&root("<a/>"), DumpOptions::default());
        insta::assert_snapshot!(dumped, @r#"
        Body@0..4
          List@0..4
            EmptyElement@0..4
              LessThanToken@0..1 "<"
              Name@1..2
                NameToken@1..2 "a"
              SlashGreaterThanToken@2..4 "/>"
          EndOfFileToken@4..4 ""
        "#);
    }

    #[test]
    fn test_dump_with_trivia_and_diagnostics() {
        let dumped = dump(
            &root("<a>&lt;</b></a> "),
            DumpOptions::default().with_trivia().with_diagnostics(),
        );
        insta::assert_snapshot!(dumped, @r#"
        Body@0..16
          List@0..15
            Element@0..15
              StartTag@0..3
                LessThanToken@0..1 "<"
                Name@1..2
                  NameToken@1..2 "a"
                GreaterThanToken@2..3 ">"
              List@3..11
                Text@3..11
                  TextToken@3..7 "&lt;" = "<"
                    trailing SkippedTokensTrivia@7..11 "</b>"
                      SkippedTokens@7..11
                        LessThanSlashToken@7..9 "</"
                        NameToken@9..10 "b"
                        GreaterThanToken@10..11 ">"
              EndTag@11..15
                LessThanSlashToken@11..13 "</"
                Name@13..14
                  NameToken@13..14 "a"
                GreaterThanToken@14..15 ">"
          EndOfFileToken@16..16 ""
            leading WhitespaceTrivia@15..16 " "
        error ML2007 at 7..9: End tag '</b>' has no matching start tag
        "#);
    }

    #[test]
    fn test_dump_marks_missing_tokens() {
        let dumped = dump(&root("<a"), DumpOptions::default());
        assert!(dumped.contains("GreaterThanToken@2..2 \"\" (missing)"));
    }
}
