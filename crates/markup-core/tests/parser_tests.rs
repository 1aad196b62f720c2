//! Parser behaviour through the public tree API

use markup_core::ast::{AnyElement, AstNode, Body, Element};
use markup_core::{
    CancellationToken, DumpOptions, ErrorCode, MarkupError, ParseOptions, SourceKind, SyntaxKind,
    SyntaxTree, TextRange, TextSize, TreeParser, dump,
};

fn parse(text: &str) -> SyntaxTree {
    SyntaxTree::parse_text(text, ParseOptions::default())
}

fn codes(tree: &SyntaxTree) -> Vec<ErrorCode> {
    tree.diagnostics().iter().map(|diagnostic| diagnostic.code).collect()
}

fn root_element(tree: &SyntaxTree) -> AnyElement {
    Body::cast(tree.get_root()).unwrap().root_element().unwrap()
}

#[test]
fn test_mismatched_closing_tag() {
    let tree = parse("<a><b></a>");
    assert_eq!(codes(&tree), vec![ErrorCode::EndTagMismatch]);

    let AnyElement::Element(a) = root_element(&tree) else {
        panic!("expected an element with an end tag");
    };
    let children: Vec<_> = a.content().collect();
    assert_eq!(children.len(), 1);
    let b = Element::cast(children[0].clone()).unwrap();
    assert!(b.is_end_tag_missing());
    assert_eq!(a.end_tag().unwrap().syntax().to_full_string(), "</a>");
}

#[test]
fn test_entity_decoding() {
    let tree = parse("<a>&amp;</a>");
    assert_eq!(root_element(&tree).text(), "&");

    let tree = parse("<a>&#65;</a>");
    assert_eq!(root_element(&tree).text(), "A");

    let tree = parse("<a>&#x1F600;</a>");
    let text = root_element(&tree).text();
    assert_eq!(text.encode_utf16().collect::<Vec<_>>(), vec![0xD83D, 0xDE00]);

    let tree = parse("<a>&bogus;x</a>");
    assert_eq!(codes(&tree), vec![ErrorCode::UnknownEntity]);
    assert_eq!(root_element(&tree).text(), "\u{FFFD}x");
    let diagnostic = &tree.diagnostics()[0];
    assert_eq!(diagnostic.range, TextRange::new(3.into(), 10.into()));
    assert_eq!(diagnostic.message, "No such named entity '&bogus;'");
}

#[test]
fn test_duplicate_attribute() {
    let tree = parse("<a x=\"1\" x=\"2\">");
    let diagnostics = tree.diagnostics();
    let duplicates: Vec<_> = diagnostics
        .iter()
        .filter(|diagnostic| diagnostic.code == ErrorCode::DuplicateAttribute)
        .collect();
    assert_eq!(duplicates.len(), 1);
    assert_eq!(duplicates[0].range.start(), TextSize::from(9));

    let attributes = root_element(&tree).attributes();
    assert_eq!(attributes.len(), 2);
    assert_eq!(attributes[1].value(), "2");
}

#[test]
fn test_empty_document() {
    let tree = parse(" \n\t\r\n ");
    let diagnostics = tree.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code, ErrorCode::EmptyDocument);
    assert_eq!(diagnostics[0].range.start(), TextSize::from(0));
    assert_eq!(Body::cast(tree.get_root()).unwrap().items().count(), 0);
}

#[test]
fn test_deeply_nested_input_terminates() {
    let input = "<a>".repeat(100_000);
    let tree = SyntaxTree::parse_text(input.as_str(), ParseOptions::default());
    assert_eq!(codes(&tree), vec![ErrorCode::MaxDepthExceeded]);
    assert_eq!(tree.get_root().to_full_string(), input);
}

#[test]
fn test_deeply_nested_input_terminates_on_worker_threads() {
    let input = "<a>".repeat(100_000);
    std::thread::scope(|scope| {
        for _ in 0..2 {
            scope.spawn(|| {
                let tree = SyntaxTree::parse_text(input.as_str(), ParseOptions::default());
                assert_eq!(codes(&tree), vec![ErrorCode::MaxDepthExceeded]);
            });
        }
    });
}

#[test]
fn test_configured_depth_limit() {
    let input = "<a>".repeat(100_000);
    let tree = TreeParser::new().max_depth(64).parse(input.as_str()).unwrap();
    assert_eq!(codes(&tree), vec![ErrorCode::MaxDepthExceeded]);
    assert_eq!(tree.get_root().to_full_string(), input);
}

#[test]
fn test_nesting_within_limit_is_kept() {
    let input = format!("{}{}", "<a>".repeat(64), "</a>".repeat(64));
    let tree = TreeParser::new().max_depth(64).parse(input.as_str()).unwrap();
    assert!(tree.diagnostics().is_empty());
}

#[test]
fn test_script_fragments() {
    let options = ParseOptions::new().with_source_kind(SourceKind::Script);
    let tree = SyntaxTree::parse_text("Hello <b>world</b>!", options);
    assert!(tree.diagnostics().is_empty());
    let kinds: Vec<_> = Body::cast(tree.get_root())
        .unwrap()
        .items()
        .map(|item| item.kind())
        .collect();
    assert_eq!(kinds, vec![SyntaxKind::Text, SyntaxKind::Element, SyntaxKind::Text]);
}

#[test]
fn test_cancellation() {
    let token = CancellationToken::new();
    let parser = TreeParser::new().cancellation(token.clone());
    assert!(parser.parse("<a/>").is_ok());
    token.cancel();
    assert_eq!(parser.parse("<a/>").unwrap_err(), MarkupError::Cancelled);
}

#[test]
fn test_line_span_of_diagnostic() {
    let tree = parse("<a>\n  <b>\n</a>");
    let diagnostic = &tree.diagnostics()[0];
    assert_eq!(diagnostic.code, ErrorCode::EndTagMismatch);
    let span = tree.get_line_span(diagnostic.range).unwrap();
    assert_eq!((span.start.line, span.start.character), (2, 0));
}

#[test]
fn test_recovery_dump() {
    let tree = parse("<a x=1><b></a>");
    insta::assert_snapshot!(dump(&tree.get_root(), DumpOptions::default().with_diagnostics()), @r#"
    Body@0..14
      List@0..14
        Element@0..14
          StartTag@0..7
            LessThanToken@0..1 "<"
            Name@1..3
              NameToken@1..2 "a"
            List@3..5
              Attribute@3..5
                Name@3..4
                  NameToken@3..4 "x"
                EqualsToken@4..5 "="
                AttributeValue@5..5
                  DoubleQuoteToken@5..5 "" (missing)
                  DoubleQuoteToken@5..5 "" (missing)
            GreaterThanToken@6..7 ">"
          List@7..10
            Element@7..10
              StartTag@7..10
                LessThanToken@7..8 "<"
                Name@8..9
                  NameToken@8..9 "b"
                GreaterThanToken@9..10 ">"
              EndTag@10..10
                LessThanSlashToken@10..10 "" (missing)
                Name@10..10
                  NameToken@10..10 "" (missing)
                GreaterThanToken@10..10 "" (missing)
          EndTag@10..14
            LessThanSlashToken@10..12 "</"
            Name@12..13
              NameToken@12..13 "a"
            GreaterThanToken@13..14 ">"
      EndOfFileToken@14..14 ""
    error ML2003 at 5..5: Quoted attribute value expected
    error ML2001 at 5..6: Unexpected '1'
    error ML2006 at 10..10: End tag '</a>' does not match start tag '<b>'
    "#);
}
