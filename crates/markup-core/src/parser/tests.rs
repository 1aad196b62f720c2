use super::*;
use crate::diagnostics::Diagnostic;
use crate::options::DocumentationMode;
use crate::red::SyntaxNode;
use crate::text::{TextRange, TextSize};

fn parse_with(text: &str, options: &ParseOptions) -> SyntaxNode {
    let config = ParseConfig {
        options,
        max_depth: DEFAULT_MAX_DEPTH,
        cache: NodeCache::new(),
        cancellation: None,
        reuse: None,
    };
    let output = parse(text, config).unwrap();
    SyntaxNode::new_root(output.root)
}

fn parse_text(text: &str) -> SyntaxNode {
    parse_with(text, &ParseOptions::default())
}

fn codes(diagnostics: &[Diagnostic]) -> Vec<ErrorCode> {
    diagnostics.iter().map(|diagnostic| diagnostic.code).collect()
}

fn child_kinds(node: &SyntaxNode) -> Vec<SyntaxKind> {
    node.children().map(|child| child.kind()).collect()
}

/// Elements directly inside the `List` slot of `node`
fn list_items(node: &SyntaxNode, slot: usize) -> Vec<SyntaxNode> {
    node.slot_node(slot)
        .map(|list| list.children().collect())
        .unwrap_or_default()
}

#[test]
fn test_round_trip_of_malformed_input() {
    let inputs = [
        "",
        "   \n\t",
        "<a>",
        "<a",
        "</a>",
        "<a><b></a>",
        "<a x=\"1\" x='2' y=>text</a>",
        "<a>&bogus; &#xZZ; &#1234567890123;</a>",
        "<a><!-- unterminated",
        "<a><![CDATA[ x ]]",
        "<?pi",
        "<a x=\"1<b/>",
        "<a>\u{1}</a>",
        "text <a/> more <b/>",
        "<a $ % b=\"1\"/>",
        "<a:b:c/>",
        "<<<>>>",
    ];
    for input in inputs {
        let root = parse_text(input);
        assert_eq!(root.to_full_string(), input, "round trip of {input:?}");
        assert_eq!(u32::from(root.full_width()) as usize, input.len());
    }
}

#[test]
fn test_well_formed_document() {
    let root = parse_text("<?xml version=\"1.0\"?>\n<root a=\"1\" b='2'>\n  <child/>\n  text\n</root>\n");
    assert!(root.diagnostics().is_empty());
    assert_eq!(root.kind(), SyntaxKind::Body);

    let items = list_items(&root, 0);
    let kinds: Vec<_> = items.iter().map(SyntaxNode::kind).collect();
    assert_eq!(kinds, vec![SyntaxKind::ProcessingInstruction, SyntaxKind::Element]);

    let element = &items[1];
    assert_eq!(
        child_kinds(element),
        vec![SyntaxKind::StartTag, SyntaxKind::List, SyntaxKind::EndTag]
    );
    let start_tag = element.slot_node(0).unwrap();
    let attributes = list_items(&start_tag, 2);
    assert_eq!(attributes.len(), 2);
}

#[test]
fn test_mismatched_end_tag_closes_inner_element() {
    let root = parse_text("<a><b></a>");
    let diagnostics = root.diagnostics();
    assert_eq!(codes(&diagnostics), vec![ErrorCode::EndTagMismatch]);
    assert_eq!(
        diagnostics[0].message,
        "End tag '</a>' does not match start tag '<b>'"
    );

    let a = &list_items(&root, 0)[0];
    assert_eq!(a.kind(), SyntaxKind::Element);
    let content = list_items(a, 1);
    assert_eq!(content.len(), 1);

    let b = &content[0];
    assert_eq!(b.kind(), SyntaxKind::Element);
    let b_end = b.slot_node(2).unwrap();
    assert_eq!(b_end.kind(), SyntaxKind::EndTag);
    assert_eq!(u32::from(b_end.full_width()), 0);

    let a_end = a.slot_node(2).unwrap();
    assert_eq!(a_end.to_full_string(), "</a>");
}

#[test]
fn test_mismatch_closes_every_intermediate_element_once() {
    let root = parse_text("<a><b><c></a>");
    assert_eq!(codes(&root.diagnostics()), vec![ErrorCode::EndTagMismatch]);
    let a = &list_items(&root, 0)[0];
    assert_eq!(a.slot_node(2).unwrap().to_full_string(), "</a>");
}

#[test]
fn test_unmatched_end_tag_is_skipped() {
    let root = parse_text("<a></b></a>");
    assert_eq!(codes(&root.diagnostics()), vec![ErrorCode::UnmatchedEndTag]);
    let a = &list_items(&root, 0)[0];
    assert_eq!(a.slot_node(0).unwrap().to_full_string(), "<a></b>");
    assert_eq!(a.slot_node(2).unwrap().to_full_string(), "</a>");
}

#[test]
fn test_missing_end_tags_at_end_of_input() {
    let root = parse_text("<a><b>");
    assert_eq!(
        codes(&root.diagnostics()),
        vec![ErrorCode::MissingEndTag, ErrorCode::MissingEndTag]
    );
}

#[test]
fn test_duplicate_attribute_reported_once() {
    let root = parse_text("<a x=\"1\" x=\"2\"/>");
    let diagnostics = root.diagnostics();
    assert_eq!(codes(&diagnostics), vec![ErrorCode::DuplicateAttribute]);
    assert_eq!(diagnostics[0].range, TextRange::new(9.into(), 10.into()));

    let element = &list_items(&root, 0)[0];
    assert_eq!(element.kind(), SyntaxKind::EmptyElement);
    assert_eq!(list_items(element, 2).len(), 2);
}

#[test]
fn test_attribute_requires_leading_whitespace() {
    let root = parse_text("<a x=\"1\"y=\"2\"/>");
    assert_eq!(codes(&root.diagnostics()), vec![ErrorCode::ExpectedWhitespace]);
}

#[test]
fn test_missing_attribute_value() {
    let root = parse_text("<a x=/>");
    assert_eq!(codes(&root.diagnostics()), vec![ErrorCode::ExpectedQuote]);

    let root = parse_text("<a x \"1\"/>");
    let diagnostics = root.diagnostics();
    assert_eq!(codes(&diagnostics), vec![ErrorCode::ExpectedToken]);
    assert_eq!(diagnostics[0].message, "'=' expected");
}

#[test]
fn test_smart_quotes_are_replaced_by_missing_quotes() {
    let input = "<a x=\u{201C}1\u{201D}/>";
    let root = parse_text(input);
    assert_eq!(root.to_full_string(), input);
    assert_eq!(
        codes(&root.diagnostics()),
        vec![ErrorCode::SmartQuote, ErrorCode::SmartQuote]
    );
}

#[test]
fn test_whitespace_only_document_is_empty() {
    let root = parse_text("  \n\t ");
    assert!(root.slot(0).is_none());
    let diagnostics = root.diagnostics();
    assert_eq!(codes(&diagnostics), vec![ErrorCode::EmptyDocument]);
    assert_eq!(diagnostics[0].range, TextRange::empty(0.into()));
}

#[test]
fn test_regular_source_requires_single_root() {
    let root = parse_text("text <a/><b/>");
    assert_eq!(
        codes(&root.diagnostics()),
        vec![ErrorCode::TextOutsideRoot, ErrorCode::MultipleRootElements]
    );
}

#[test]
fn test_script_source_accepts_fragments() {
    let options = ParseOptions::new().with_source_kind(SourceKind::Script);
    let root = parse_with("text <a/><b/><![CDATA[x]]>", &options);
    assert!(root.diagnostics().is_empty());
    let kinds: Vec<_> = list_items(&root, 0).iter().map(SyntaxNode::kind).collect();
    assert_eq!(
        kinds,
        vec![
            SyntaxKind::Text,
            SyntaxKind::EmptyElement,
            SyntaxKind::EmptyElement,
            SyntaxKind::CData
        ]
    );
}

#[test]
fn test_document_comments_follow_documentation_mode() {
    let input = "<!-- note --><a/>";

    let parsed = parse_text(input);
    let kinds: Vec<_> = list_items(&parsed, 0).iter().map(SyntaxNode::kind).collect();
    assert_eq!(kinds, vec![SyntaxKind::Comment, SyntaxKind::EmptyElement]);

    let options = ParseOptions::new().with_documentation_mode(DocumentationMode::None);
    let trivia = parse_with(input, &options);
    let kinds: Vec<_> = list_items(&trivia, 0).iter().map(SyntaxNode::kind).collect();
    assert_eq!(kinds, vec![SyntaxKind::EmptyElement]);
    assert_eq!(trivia.to_full_string(), input);
}

#[test]
fn test_prefixed_names() {
    let root = parse_text("<x:a x:b=\"1\"></x:a>");
    assert!(root.diagnostics().is_empty());
    let element = &list_items(&root, 0)[0];
    let name = element.slot_node(0).unwrap().slot_node(1).unwrap();
    assert_eq!(name.kind(), SyntaxKind::Name);
    assert_eq!(name.slot_node(0).map(|prefix| prefix.kind()), Some(SyntaxKind::Prefix));
}

#[test]
fn test_unexpected_tokens_in_tag_are_skipped_once() {
    let root = parse_text("<a $ % b=\"1\"/>");
    let diagnostics = root.diagnostics();
    assert_eq!(codes(&diagnostics), vec![ErrorCode::UnexpectedToken]);
    assert_eq!(diagnostics[0].range.start(), TextSize::from(3));
}

#[test]
fn test_deep_nesting_hits_depth_limit() {
    let input = "<a>".repeat(100_000);
    let root = parse_text(&input);
    let diagnostics = root.diagnostics();
    assert_eq!(codes(&diagnostics), vec![ErrorCode::MaxDepthExceeded]);
    assert!(diagnostics[0].message.contains("512"));
    assert_eq!(root.to_full_string(), input);
}

#[test]
fn test_nesting_at_default_limit_is_parsed() {
    let depth = DEFAULT_MAX_DEPTH as usize;
    let input = format!("{}{}", "<a>".repeat(depth), "</a>".repeat(depth));
    let root = parse_text(&input);
    assert!(root.diagnostics().is_empty());
    assert_eq!(root.to_full_string(), input);
    assert_eq!(root.green().element_depth(), DEFAULT_MAX_DEPTH);
}

#[test]
fn test_depth_limit_is_configurable() {
    let options = ParseOptions::default();
    let config = ParseConfig {
        options: &options,
        max_depth: 3,
        cache: NodeCache::new(),
        cancellation: None,
        reuse: None,
    };
    let output = parse("<a><b><c/></b></a>", config).unwrap();
    assert!(!output.root.contains_diagnostics());

    let config = ParseConfig {
        options: &options,
        max_depth: 2,
        cache: NodeCache::new(),
        cancellation: None,
        reuse: None,
    };
    let output = parse("<a><b><c/></b></a>", config).unwrap();
    assert!(output.root.contains_diagnostics());
}

#[test]
fn test_cancelled_parse_fails() {
    let options = ParseOptions::default();
    let token = CancellationToken::new();
    token.cancel();
    let config = ParseConfig {
        options: &options,
        max_depth: DEFAULT_MAX_DEPTH,
        cache: NodeCache::new(),
        cancellation: Some(&token),
        reuse: None,
    };
    assert!(matches!(
        parse("<a/>", config),
        Err(MarkupError::Cancelled)
    ));
}

#[test]
fn test_skipped_tokens_become_structured_trivia() {
    let root = parse_text("<a>x</a></b>");
    let eof = root.slot_token(1).unwrap();
    assert_eq!(eof.kind(), SyntaxKind::EndOfFileToken);
    assert_eq!(eof.leading_trivia().count(), 0);

    let greater_than = eof.prev_token().unwrap();
    assert_eq!(greater_than.kind(), SyntaxKind::GreaterThanToken);
    assert_eq!(greater_than.position(), TextSize::from(7));
    let trivia: Vec<_> = greater_than.trailing_trivia().collect();
    assert_eq!(trivia.len(), 1);
    assert_eq!(trivia[0].kind(), SyntaxKind::SkippedTokensTrivia);
    let structure = trivia[0].structure().unwrap();
    assert_eq!(structure.kind(), SyntaxKind::SkippedTokens);
    assert_eq!(structure.to_full_string(), "</b>");
    assert_eq!(structure.position(), TextSize::from(8));
}

#[test]
fn test_skipped_tokens_trail_the_preceding_attribute() {
    let root = parse_text("<a x=\"1\" !! y=\"2\"/>");
    let diagnostics = root.diagnostics();
    assert_eq!(codes(&diagnostics), vec![ErrorCode::UnexpectedToken]);
    assert_eq!(diagnostics[0].range, TextRange::new(9.into(), 11.into()));

    let quote = root.find_token(TextSize::from(7)).unwrap();
    assert_eq!(quote.kind(), SyntaxKind::DoubleQuoteToken);
    let kinds: Vec<_> = quote.trailing_trivia().map(|trivia| trivia.kind()).collect();
    assert_eq!(
        kinds,
        vec![SyntaxKind::WhitespaceTrivia, SyntaxKind::SkippedTokensTrivia]
    );
    let skipped = quote.trailing_trivia().find_map(|trivia| trivia.structure()).unwrap();
    assert_eq!(skipped.to_full_string(), "!! ");

    let y = quote.next_token().unwrap();
    assert_eq!(y.text(), "y");
    assert_eq!(y.leading_trivia().count(), 0);
}

#[test]
fn test_skipped_tokens_after_element_name() {
    let root = parse_text("<a !! x=\"1\"/>");
    let name = root.find_token(TextSize::from(1)).unwrap();
    assert_eq!(name.text(), "a");
    assert_eq!(
        name.trailing_trivia().map(|trivia| trivia.kind()).last(),
        Some(SyntaxKind::SkippedTokensTrivia)
    );
}

#[test]
fn test_skipped_text_before_root_leads_the_root() {
    let root = parse_text("junk <a/>");
    assert_eq!(codes(&root.diagnostics()), vec![ErrorCode::TextOutsideRoot]);
    let less_than = root.first_token().unwrap();
    assert_eq!(less_than.kind(), SyntaxKind::LessThanToken);
    assert_eq!(
        less_than.leading_trivia().map(|trivia| trivia.kind()).collect::<Vec<_>>(),
        vec![SyntaxKind::SkippedTokensTrivia]
    );
}

#[test]
fn test_entity_values_are_decoded() {
    let root = parse_text("<a t=\"&lt;&#65;\">&amp;&#x1F600;</a>");
    assert!(root.diagnostics().is_empty());
    let values: Vec<String> = root
        .descendant_tokens()
        .filter(|token| token.kind() == SyntaxKind::TextToken)
        .map(|token| token.value_text().to_string())
        .collect();
    assert_eq!(values, vec!["<A".to_string(), "&\u{1F600}".to_string()]);
}
