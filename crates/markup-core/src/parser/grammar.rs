//! Grammar rules
//!
//! ```text
//! Body            = List?(Element | EmptyElement | Comment | ProcessingInstruction | Text) EndOfFile
//! Element         = StartTag List?(content) EndTag
//! StartTag        = '<' Name List?(Attribute) '>'
//! EmptyElement    = '<' Name List?(Attribute) '/>'
//! EndTag          = '</' Name '>'
//! Name            = Prefix? NameToken
//! Prefix          = NameToken ':'
//! Attribute       = Name '=' AttributeValue
//! AttributeValue  = quote TextToken? quote
//! ```

use super::pool::PooledList;
use super::recovery::{is_recovery_point, is_tag_recovery_point};
use super::{Abort, ParseResult, Parser};
use crate::NodeOrToken;
use crate::diagnostics::{DiagnosticInfo, ErrorCode};
use crate::green::{GreenElement, GreenNode};
use crate::lexer::LexMode;
use crate::options::SourceKind;
use crate::syntax_kind::SyntaxKind;

/// An element whose start tag is parsed and whose content is still open
struct OpenElement {
    start_tag: GreenElement,
    key: String,
    content: PooledList,
}

impl OpenElement {
    /// Last node of the element so far, where skipped tokens attach
    fn last_mut(&mut self) -> &mut GreenElement {
        match self.content.last_mut() {
            Some(last) => last,
            None => &mut self.start_tag,
        }
    }
}

enum Started {
    Complete(GreenElement),
    Open(OpenElement),
}

/// Where [`Parser::parse_content`] stopped
enum ContentEnd {
    /// At the `<` of a nested element
    Element,
    /// At an end tag, the end of input, or a pending implicit close
    Close,
}

impl<'src, 'a> Parser<'src, 'a> {
    pub(super) fn parse_body(&mut self) -> ParseResult<GreenNode> {
        let mut items = self.pool.acquire();
        let script = self.source_kind == SourceKind::Script;
        let mut roots = 0usize;
        loop {
            self.check_cancelled()?;
            match self.current_kind() {
                SyntaxKind::EndOfFileToken => break,
                SyntaxKind::LessThanToken => {
                    let mut element = self.parse_element()?;
                    roots += 1;
                    if roots > 1 && !script {
                        element = with_node_diagnostic(element, ErrorCode::MultipleRootElements);
                    }
                    items.push(element);
                    self.relex_in(LexMode::Misc);
                }
                SyntaxKind::CommentStartToken => {
                    let comment = self.parse_comment();
                    items.push(comment.into());
                }
                SyntaxKind::ProcessingInstructionStartToken => {
                    let instruction = self.parse_processing_instruction();
                    items.push(instruction.into());
                }
                SyntaxKind::CDataStartToken if script => {
                    let cdata = self.parse_cdata();
                    items.push(cdata.into());
                }
                SyntaxKind::TextToken if script => {
                    let text = self.parse_text();
                    items.push(text.into());
                }
                SyntaxKind::TextToken => {
                    self.skip(ErrorCode::TextOutsideRoot, Vec::new(), |kind| {
                        kind == SyntaxKind::TextToken
                    });
                    self.attach_skipped_to_last(&mut items);
                }
                SyntaxKind::LessThanSlashToken => {
                    let name = self.peek_end_tag_name();
                    self.skip_end_tag(&name);
                    self.attach_skipped_to_last(&mut items);
                    self.relex_in(LexMode::Misc);
                }
                _ => {
                    self.skip(ErrorCode::UnexpectedToken, Vec::new(), |kind| {
                        !is_recovery_point(kind)
                    });
                    self.attach_skipped_to_last(&mut items);
                    self.relex_in(LexMode::Misc);
                }
            }
        }

        let mut diagnostics = Vec::new();
        if roots == 0 && !script {
            diagnostics.push(DiagnosticInfo::at_start(ErrorCode::EmptyDocument));
        }
        let end_of_file = self.bump_element();
        let list = self.factory.list(&mut items);
        Ok(self
            .factory
            .node_with_diagnostics(SyntaxKind::Body, vec![list, Some(end_of_file)], diagnostics))
    }

    /// Element or empty element; the current token is `<`
    ///
    /// Nested elements go on an explicit stack of open elements rather than
    /// the call stack, so nesting depth costs heap, not stack.
    fn parse_element(&mut self) -> ParseResult<GreenElement> {
        let mut current = match self.start_element()? {
            Started::Complete(element) => return Ok(element),
            Started::Open(open) => open,
        };
        let mut ancestors: Vec<OpenElement> = Vec::new();
        loop {
            match self.parse_content(&mut current)? {
                ContentEnd::Element => match self.start_element()? {
                    Started::Complete(element) => current.content.push(element),
                    Started::Open(child) => ancestors.push(std::mem::replace(&mut current, child)),
                },
                ContentEnd::Close => {
                    let Some(end_tag) = self.parse_end_tag(&current.key) else {
                        self.attach_skipped_after(current.last_mut());
                        continue;
                    };
                    let element = self.finish_element(current, end_tag);
                    current = match ancestors.pop() {
                        Some(mut parent) => {
                            parent.content.push(element);
                            parent
                        }
                        None => return Ok(element),
                    };
                }
            }
        }
    }

    /// Start tag or complete empty element; the current token is `<`
    fn start_element(&mut self) -> ParseResult<Started> {
        if let Some(reused) = self.try_reuse() {
            return Ok(Started::Complete(reused));
        }
        if self.depth >= self.max_depth {
            let position = self.current().start();
            return Err(Abort::DepthExceeded { position });
        }

        let less_than = self.bump_element();
        let name = self.parse_name();
        let key = name_text(&name);
        let mut name = GreenElement::from(name);
        let attributes = self.parse_attributes(&mut name);

        if self.at(SyntaxKind::SlashGreaterThanToken) {
            let close = self.bump_element();
            let slots = vec![Some(less_than), Some(name), attributes, Some(close)];
            return Ok(Started::Complete(
                self.factory.node(SyntaxKind::EmptyElement, slots).into(),
            ));
        }

        let greater_than = self.expect(SyntaxKind::GreaterThanToken);
        let start_tag = self.factory.node(
            SyntaxKind::StartTag,
            vec![Some(less_than), Some(name), attributes, Some(greater_than)],
        );
        self.depth += 1;
        self.open_elements.push(key.clone());
        Ok(Started::Open(OpenElement {
            start_tag: start_tag.into(),
            key,
            content: self.pool.acquire(),
        }))
    }

    fn finish_element(&mut self, open: OpenElement, end_tag: GreenNode) -> GreenElement {
        self.depth -= 1;
        self.open_elements.pop();
        let OpenElement {
            start_tag,
            mut content,
            ..
        } = open;
        let content = self.factory.list(&mut content);
        let slots = vec![Some(start_tag), content, Some(end_tag.into())];
        self.factory.node(SyntaxKind::Element, slots).into()
    }

    /// Content of `open` up to the next nested element or closing point
    fn parse_content(&mut self, open: &mut OpenElement) -> ParseResult<ContentEnd> {
        loop {
            self.check_cancelled()?;
            if self.pending_closes > 0 {
                return Ok(ContentEnd::Close);
            }
            match self.current_kind() {
                SyntaxKind::EndOfFileToken | SyntaxKind::LessThanSlashToken => {
                    return Ok(ContentEnd::Close);
                }
                SyntaxKind::LessThanToken => return Ok(ContentEnd::Element),
                SyntaxKind::TextToken => {
                    let text = self.parse_text();
                    open.content.push(text.into());
                }
                SyntaxKind::CommentStartToken => {
                    let comment = self.parse_comment();
                    open.content.push(comment.into());
                }
                SyntaxKind::CDataStartToken => {
                    let cdata = self.parse_cdata();
                    open.content.push(cdata.into());
                }
                SyntaxKind::ProcessingInstructionStartToken => {
                    let instruction = self.parse_processing_instruction();
                    open.content.push(instruction.into());
                }
                _ => {
                    self.skip(ErrorCode::UnexpectedToken, Vec::new(), |kind| {
                        !is_recovery_point(kind) && kind != SyntaxKind::TextToken
                    });
                    self.attach_skipped_after(open.last_mut());
                }
            }
        }
    }

    /// End tag for the element named `key`
    ///
    /// Returns `None` after skipping an end tag that matches no open
    /// element; the caller then continues with the element content.
    fn parse_end_tag(&mut self, key: &str) -> Option<GreenNode> {
        if self.pending_closes > 0 {
            self.pending_closes -= 1;
            return Some(self.missing_end_tag(None));
        }
        if !self.at(SyntaxKind::LessThanSlashToken) {
            let diagnostic = DiagnosticInfo::at_start(ErrorCode::MissingEndTag).with_args([key]);
            return Some(self.missing_end_tag(Some(diagnostic)));
        }

        let found = self.peek_end_tag_name();
        if found == key {
            let less_than_slash = self.bump_element();
            let name = self.parse_name();
            let greater_than = self.expect(SyntaxKind::GreaterThanToken);
            let slots = vec![Some(less_than_slash), Some(name.into()), Some(greater_than)];
            return Some(self.factory.node(SyntaxKind::EndTag, slots));
        }

        let ancestors = &self.open_elements[..self.open_elements.len().saturating_sub(1)];
        if let Some(index) = ancestors.iter().rposition(|open| *open == found) {
            // everything between this element and the matching ancestor
            // closes implicitly, without further diagnostics
            let distance = ancestors.len() - index;
            self.pending_closes = (distance - 1) as u32;
            let diagnostic =
                DiagnosticInfo::at_start(ErrorCode::EndTagMismatch).with_args([found.as_str(), key]);
            return Some(self.missing_end_tag(Some(diagnostic)));
        }

        self.skip_end_tag(&found);
        None
    }

    /// Attributes after the element `name`
    fn parse_attributes(&mut self, name: &mut GreenElement) -> Option<GreenElement> {
        let mut attributes = self.pool.acquire();
        let mut seen: Vec<String> = Vec::new();
        loop {
            match self.current_kind() {
                SyntaxKind::NameToken => {
                    let attribute = self.parse_attribute(&mut seen);
                    attributes.push(attribute.into());
                }
                kind if is_tag_recovery_point(kind) => break,
                _ => {
                    self.skip(ErrorCode::UnexpectedToken, Vec::new(), |kind| {
                        !is_tag_recovery_point(kind)
                    });
                    match attributes.last_mut() {
                        Some(last) => self.attach_skipped_after(last),
                        None => self.attach_skipped_after(name),
                    }
                }
            }
        }
        self.factory.list(&mut attributes)
    }

    fn parse_attribute(&mut self, seen: &mut Vec<String>) -> GreenNode {
        let separated = self.last_trailing_trivia || self.current().has_leading_whitespace();
        let name = self.parse_name();
        let key = name_text(&name);
        let equals = self.expect(SyntaxKind::EqualsToken);
        let value = self.parse_attribute_value();

        let name_start = name.leading_trivia_width();
        let name_width = name.full_width() - name_start - name.trailing_trivia_width();
        let mut diagnostics = Vec::new();
        if !separated {
            diagnostics.push(
                DiagnosticInfo::new(ErrorCode::ExpectedWhitespace, name_start, name_width)
                    .with_args([key.as_str()]),
            );
        }
        if seen.contains(&key) {
            diagnostics.push(
                DiagnosticInfo::new(ErrorCode::DuplicateAttribute, name_start, name_width)
                    .with_args([key.as_str()]),
            );
        } else {
            seen.push(key);
        }

        let slots = vec![Some(name.into()), Some(equals), Some(value.into())];
        self.factory
            .node_with_diagnostics(SyntaxKind::Attribute, slots, diagnostics)
    }

    fn parse_attribute_value(&mut self) -> GreenNode {
        if !self.current_kind().is_quote() {
            let diagnostic = DiagnosticInfo::at_start(ErrorCode::ExpectedQuote);
            let open = self.missing_element(SyntaxKind::DoubleQuoteToken, Some(diagnostic));
            let close = self.missing_element(SyntaxKind::DoubleQuoteToken, None);
            return self
                .factory
                .node(SyntaxKind::AttributeValue, vec![Some(open), None, Some(close)]);
        }

        let open = self.bump_quote();
        let text = if self.at(SyntaxKind::TextToken) {
            Some(self.bump_element())
        } else {
            None
        };
        let close = if self.current_kind().is_quote() {
            self.bump_quote().into()
        } else {
            let diagnostic = DiagnosticInfo::at_start(ErrorCode::ExpectedQuote);
            self.missing_element(open.kind(), Some(diagnostic))
        };
        self.factory
            .node(SyntaxKind::AttributeValue, vec![Some(open.into()), text, Some(close)])
    }

    fn parse_name(&mut self) -> GreenNode {
        if !self.at(SyntaxKind::NameToken) {
            let diagnostic = DiagnosticInfo::at_start(ErrorCode::ExpectedName);
            let missing = self.missing_element(SyntaxKind::NameToken, Some(diagnostic));
            return self.factory.node(SyntaxKind::Name, vec![None, Some(missing)]);
        }
        let prefix = if self.at_prefix(0) {
            let prefix = self.bump_element();
            let colon = self.bump_element();
            Some(
                self.factory
                    .node(SyntaxKind::Prefix, vec![Some(prefix), Some(colon)])
                    .into(),
            )
        } else {
            None
        };
        let local = self.bump_element();
        self.factory.node(SyntaxKind::Name, vec![prefix, Some(local)])
    }

    /// `prefix:local` written without whitespace, starting at token `n`
    fn at_prefix(&mut self, n: usize) -> bool {
        if !self.nth(n).trailing.is_empty() {
            return false;
        }
        let colon = self.nth(n + 1);
        if colon.kind != SyntaxKind::ColonToken || !colon.leading.is_empty() || !colon.trailing.is_empty() {
            return false;
        }
        let local = self.nth(n + 2);
        local.kind == SyntaxKind::NameToken && local.leading.is_empty()
    }

    /// Name of the end tag starting at the current `</`, without consuming it
    fn peek_end_tag_name(&mut self) -> String {
        if self.nth_kind(1) != SyntaxKind::NameToken {
            return String::new();
        }
        if self.at_prefix(1) {
            let prefix = self.nth(1).text;
            let local = self.nth(3).text;
            format!("{prefix}:{local}")
        } else {
            self.nth(1).text.to_string()
        }
    }

    fn parse_text(&mut self) -> GreenNode {
        let text = self.bump_element();
        self.factory.node(SyntaxKind::Text, vec![Some(text)])
    }

    fn parse_comment(&mut self) -> GreenNode {
        let start = self.bump_element();
        let text = if self.at(SyntaxKind::CommentTextToken) {
            Some(self.bump_element())
        } else {
            None
        };
        let end = self.expect(SyntaxKind::CommentEndToken);
        self.factory
            .node(SyntaxKind::Comment, vec![Some(start), text, Some(end)])
    }

    fn parse_cdata(&mut self) -> GreenNode {
        let start = self.bump_element();
        let text = if self.at(SyntaxKind::CDataTextToken) {
            Some(self.bump_element())
        } else {
            None
        };
        let end = self.expect(SyntaxKind::CDataEndToken);
        self.factory
            .node(SyntaxKind::CData, vec![Some(start), text, Some(end)])
    }

    fn parse_processing_instruction(&mut self) -> GreenNode {
        let start = self.bump_element();
        let target = if self.at(SyntaxKind::NameToken) {
            self.bump_element()
        } else {
            let diagnostic = DiagnosticInfo::at_start(ErrorCode::ExpectedName);
            self.missing_element(SyntaxKind::NameToken, Some(diagnostic))
        };
        let text = if self.at(SyntaxKind::ProcessingInstructionTextToken) {
            Some(self.bump_element())
        } else {
            None
        };
        let end = self.expect(SyntaxKind::ProcessingInstructionEndToken);
        self.factory.node(
            SyntaxKind::ProcessingInstruction,
            vec![Some(start), Some(target), text, Some(end)],
        )
    }
}

/// Qualified name text (`prefix:local`) of a green `Name`
pub(super) fn name_text(name: &GreenNode) -> String {
    let mut text = String::new();
    let mut stack: Vec<&GreenElement> = name.children().collect();
    stack.reverse();
    while let Some(element) = stack.pop() {
        match element {
            NodeOrToken::Token(token) => text.push_str(token.text()),
            NodeOrToken::Node(node) => {
                let mut children: Vec<&GreenElement> = node.children().collect();
                children.reverse();
                stack.extend(children);
            }
        }
    }
    text
}

fn with_node_diagnostic(element: GreenElement, code: ErrorCode) -> GreenElement {
    match element {
        NodeOrToken::Node(node) => {
            let start = node.leading_trivia_width();
            let width = node.full_width() - start - node.trailing_trivia_width();
            node.with_diagnostics(vec![DiagnosticInfo::new(code, start, width)])
                .into()
        }
        token => token,
    }
}
