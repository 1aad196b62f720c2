//! Mode-driven markup lexer
//!
//! The lexer hands out one token at a time together with its leading and
//! trailing trivia. Every byte of the input ends up in exactly one token or
//! trivia, so concatenating the full text of all tokens reproduces the
//! input. Problems are recorded as diagnostics on the token; scanning never
//! fails.

mod entity;
mod line;
mod state;

pub use entity::PLACEHOLDER;
pub use line::{LexedLine, lex_line, lex_lines};
pub use state::{LexMode, MultiLineToken, QuoteKind, ScannerState};

use crate::diagnostics::{DiagnosticInfo, ErrorCode};
use crate::options::DocumentationMode;
use crate::syntax_kind::SyntaxKind;
use crate::text::text_size;
use entity::scan_entity;

/// Trivia as produced by the lexer, borrowing the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexedTrivia<'src> {
    pub kind: SyntaxKind,
    pub text: &'src str,
}

/// A token with its trivia
///
/// Diagnostic offsets are relative to `full_start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'src> {
    pub kind: SyntaxKind,
    pub text: &'src str,
    /// Decoded text, present only when it differs from `text`
    pub value: Option<String>,
    pub leading: Vec<LexedTrivia<'src>>,
    pub trailing: Vec<LexedTrivia<'src>>,
    pub diagnostics: Vec<DiagnosticInfo>,
    pub full_start: usize,
    /// Synthesized terminator of an unterminated construct
    pub is_missing: bool,
}

impl<'src> Token<'src> {
    pub fn value_text(&self) -> &str {
        self.value.as_deref().unwrap_or(self.text)
    }

    pub fn leading_len(&self) -> usize {
        self.leading.iter().map(|trivia| trivia.text.len()).sum()
    }

    pub fn trailing_len(&self) -> usize {
        self.trailing.iter().map(|trivia| trivia.text.len()).sum()
    }

    /// Start of the token text, after leading trivia
    pub fn start(&self) -> usize {
        self.full_start + self.leading_len()
    }

    pub fn full_len(&self) -> usize {
        self.leading_len() + self.text.len() + self.trailing_len()
    }

    pub fn full_end(&self) -> usize {
        self.full_start + self.full_len()
    }

    pub fn has_leading_whitespace(&self) -> bool {
        !self.leading.is_empty()
    }

    pub fn write_full_text(&self, out: &mut String) {
        for trivia in &self.leading {
            out.push_str(trivia.text);
        }
        out.push_str(self.text);
        for trivia in &self.trailing {
            out.push_str(trivia.text);
        }
    }
}

struct Scanned {
    kind: SyntaxKind,
    value: Option<String>,
    missing: bool,
}

impl Scanned {
    fn token(kind: SyntaxKind) -> Scanned {
        Scanned {
            kind,
            value: None,
            missing: false,
        }
    }

    fn missing(kind: SyntaxKind) -> Scanned {
        Scanned {
            kind,
            value: None,
            missing: true,
        }
    }
}

pub struct Lexer<'src> {
    text: &'src str,
    position: usize,
    mode: LexMode,
    outer: LexMode,
    documentation_mode: DocumentationMode,
}

impl<'src> Lexer<'src> {
    pub fn new(text: &'src str, documentation_mode: DocumentationMode) -> Self {
        Self::with_state(text, documentation_mode, ScannerState::initial())
    }

    /// Lexer resuming from a state captured at the end of a previous scan
    pub fn with_state(text: &'src str, documentation_mode: DocumentationMode, state: ScannerState) -> Self {
        Self {
            text,
            position: 0,
            mode: state.mode(),
            outer: state.return_mode(),
            documentation_mode,
        }
    }

    pub fn text(&self) -> &'src str {
        self.text
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn mode(&self) -> LexMode {
        self.mode
    }

    pub fn scanner_state(&self) -> ScannerState {
        ScannerState::new(self.mode, self.outer)
    }

    pub fn is_at_end(&self) -> bool {
        self.position >= self.text.len()
    }

    /// Continue lexing at `position` in `mode`
    pub(crate) fn reset_to(&mut self, position: usize, mode: LexMode) {
        self.position = position.min(self.text.len());
        self.mode = mode;
        if matches!(mode, LexMode::Misc | LexMode::Content) {
            self.outer = mode;
        }
    }

    pub(crate) fn skip_to_end(&mut self) {
        self.reset_to(self.text.len(), LexMode::Misc);
    }

    /// Scans the next token with its trivia
    ///
    /// With `stop_at_end_of_line`, text inside multi-line constructs stops
    /// after the first line break and the end of input leaves the construct
    /// open in [`Lexer::scanner_state`] instead of synthesizing its
    /// terminator.
    pub fn next_token(&mut self, stop_at_end_of_line: bool) -> Token<'src> {
        let full_start = self.position;
        let mut leading = Vec::new();
        if self.mode.admits_trivia() {
            self.scan_trivia(&mut leading, true, stop_at_end_of_line);
        }

        let start = self.position;
        let mut diagnostics = Vec::new();
        let scanned = self.scan_token(full_start, stop_at_end_of_line, &mut diagnostics);
        let text = &self.text[start..self.position];

        let mut trailing = Vec::new();
        if scanned.kind != SyntaxKind::EndOfFileToken && !scanned.missing && self.mode.admits_trivia() {
            self.scan_trivia(&mut trailing, false, stop_at_end_of_line);
        }

        Token {
            kind: scanned.kind,
            text,
            value: scanned.value,
            leading,
            trailing,
            diagnostics,
            full_start,
            is_missing: scanned.missing,
        }
    }

    fn rest(&self) -> &'src str {
        &self.text[self.position..]
    }

    fn diagnostic(
        &self,
        full_start: usize,
        at: usize,
        width: usize,
        code: ErrorCode,
        arg: Option<String>,
    ) -> DiagnosticInfo {
        DiagnosticInfo::new(code, text_size(at - full_start), text_size(width)).with_args(arg)
    }

    fn scan_trivia(&mut self, out: &mut Vec<LexedTrivia<'src>>, leading: bool, stop_at_end_of_line: bool) {
        loop {
            let rest = self.rest();
            let len = if let Some(len) = whitespace_len(rest) {
                out.push(LexedTrivia {
                    kind: SyntaxKind::WhitespaceTrivia,
                    text: &rest[..len],
                });
                len
            } else if !leading {
                break;
            } else if let Some(len) = end_of_line_len(rest) {
                out.push(LexedTrivia {
                    kind: SyntaxKind::EndOfLineTrivia,
                    text: &rest[..len],
                });
                len
            } else if self.mode == LexMode::Misc
                && self.documentation_mode == DocumentationMode::None
                && !stop_at_end_of_line
                && rest.starts_with("<!--")
                && let Some(end) = rest[4..].find("-->")
            {
                let len = 4 + end + 3;
                out.push(LexedTrivia {
                    kind: SyntaxKind::CommentTrivia,
                    text: &rest[..len],
                });
                len
            } else {
                break;
            };
            self.position += len;
        }
    }

    fn scan_token(
        &mut self,
        full_start: usize,
        stop_at_end_of_line: bool,
        diagnostics: &mut Vec<DiagnosticInfo>,
    ) -> Scanned {
        match self.mode {
            LexMode::Misc | LexMode::Content => self.scan_markup(full_start, stop_at_end_of_line, diagnostics),
            LexMode::Tag => self.scan_tag(),
            LexMode::AttributeValue(quote) => {
                self.scan_attribute_value(quote, full_start, stop_at_end_of_line, diagnostics)
            }
            LexMode::Comment => self.scan_delimited(
                Delimited::COMMENT,
                full_start,
                stop_at_end_of_line,
                diagnostics,
            ),
            LexMode::CData => self.scan_delimited(
                Delimited::CDATA,
                full_start,
                stop_at_end_of_line,
                diagnostics,
            ),
            LexMode::ProcessingInstructionTarget => {
                let rest = self.rest();
                match rest.chars().next() {
                    Some(c) if is_name_start(c) && !rest.starts_with("?>") => {
                        self.position += name_len(rest, false);
                        self.mode = LexMode::ProcessingInstructionBody;
                        Scanned::token(SyntaxKind::NameToken)
                    }
                    _ => {
                        self.mode = LexMode::ProcessingInstructionBody;
                        self.scan_delimited(
                            Delimited::PROCESSING_INSTRUCTION,
                            full_start,
                            stop_at_end_of_line,
                            diagnostics,
                        )
                    }
                }
            }
            LexMode::ProcessingInstructionBody => self.scan_delimited(
                Delimited::PROCESSING_INSTRUCTION,
                full_start,
                stop_at_end_of_line,
                diagnostics,
            ),
        }
    }

    fn scan_markup(
        &mut self,
        full_start: usize,
        stop_at_end_of_line: bool,
        diagnostics: &mut Vec<DiagnosticInfo>,
    ) -> Scanned {
        let rest = self.rest();
        if rest.is_empty() {
            return Scanned::token(SyntaxKind::EndOfFileToken);
        }
        let opened = [
            ("<!--", SyntaxKind::CommentStartToken, LexMode::Comment),
            ("<![CDATA[", SyntaxKind::CDataStartToken, LexMode::CData),
            (
                "<?",
                SyntaxKind::ProcessingInstructionStartToken,
                LexMode::ProcessingInstructionTarget,
            ),
        ];
        for (prefix, kind, mode) in opened {
            if rest.starts_with(prefix) {
                self.position += prefix.len();
                self.outer = self.mode;
                self.mode = mode;
                return Scanned::token(kind);
            }
        }
        if rest.starts_with("</") {
            self.position += 2;
            self.mode = LexMode::Tag;
            return Scanned::token(SyntaxKind::LessThanSlashToken);
        }
        if rest.starts_with('<') {
            self.position += 1;
            self.mode = LexMode::Tag;
            return Scanned::token(SyntaxKind::LessThanToken);
        }

        if self.mode == LexMode::Misc {
            let value = self.scan_text(
                full_start,
                |c| c == '<' || c == '\r' || c == '\n',
                false,
                diagnostics,
            );
            // trailing blanks become trivia
            let text = &self.text[..self.position];
            let trimmed = text.trim_end_matches([' ', '\t']).len();
            let trim = self.position - trimmed;
            self.position = trimmed;
            let value = value.map(|mut value| {
                value.truncate(value.len() - trim);
                value
            });
            Scanned {
                kind: SyntaxKind::TextToken,
                value,
                missing: false,
            }
        } else {
            let value = self.scan_text(full_start, |c| c == '<', stop_at_end_of_line, diagnostics);
            Scanned {
                kind: SyntaxKind::TextToken,
                value,
                missing: false,
            }
        }
    }

    fn scan_tag(&mut self) -> Scanned {
        let rest = self.rest();
        let Some(c) = rest.chars().next() else {
            return Scanned::token(SyntaxKind::EndOfFileToken);
        };
        let punctuation = [
            ("/>", SyntaxKind::SlashGreaterThanToken),
            (">", SyntaxKind::GreaterThanToken),
            ("</", SyntaxKind::LessThanSlashToken),
            ("<", SyntaxKind::LessThanToken),
            ("=", SyntaxKind::EqualsToken),
            (":", SyntaxKind::ColonToken),
        ];
        for (text, kind) in punctuation {
            if rest.starts_with(text) {
                self.position += text.len();
                if matches!(
                    kind,
                    SyntaxKind::GreaterThanToken | SyntaxKind::SlashGreaterThanToken
                ) {
                    self.mode = LexMode::Content;
                }
                return Scanned::token(kind);
            }
        }
        if let Some(quote) = QuoteKind::from_char(c) {
            self.position += c.len_utf8();
            self.mode = LexMode::AttributeValue(quote);
            return Scanned::token(quote_token_kind(quote));
        }
        if is_name_start(c) {
            self.position += name_len(rest, true);
            return Scanned::token(SyntaxKind::NameToken);
        }

        let mut len = 0;
        for c in rest.chars() {
            if c.is_whitespace() || "<>=:/".contains(c) || QuoteKind::from_char(c).is_some() || is_name_start(c) {
                break;
            }
            len += c.len_utf8();
        }
        self.position += if len == 0 { c.len_utf8() } else { len };
        Scanned::token(SyntaxKind::BadToken)
    }

    fn scan_attribute_value(
        &mut self,
        quote: QuoteKind,
        full_start: usize,
        stop_at_end_of_line: bool,
        diagnostics: &mut Vec<DiagnosticInfo>,
    ) -> Scanned {
        let rest = self.rest();
        match rest.chars().next() {
            None if stop_at_end_of_line => Scanned::token(SyntaxKind::EndOfFileToken),
            None => self.unterminated_value(quote, full_start, diagnostics),
            Some('<') => self.unterminated_value(quote, full_start, diagnostics),
            Some(c) if quote.closes_with(c) => {
                self.position += c.len_utf8();
                self.mode = LexMode::Tag;
                Scanned::token(quote_token_kind(quote))
            }
            Some(_) => {
                let value = self.scan_text(
                    full_start,
                    |c| c == '<' || quote.closes_with(c),
                    stop_at_end_of_line,
                    diagnostics,
                );
                Scanned {
                    kind: SyntaxKind::TextToken,
                    value,
                    missing: false,
                }
            }
        }
    }

    fn unterminated_value(
        &mut self,
        quote: QuoteKind,
        full_start: usize,
        diagnostics: &mut Vec<DiagnosticInfo>,
    ) -> Scanned {
        diagnostics.push(self.diagnostic(
            full_start,
            self.position,
            0,
            ErrorCode::UnterminatedAttributeValue,
            None,
        ));
        self.mode = LexMode::Tag;
        Scanned::missing(quote_token_kind(quote))
    }

    fn scan_delimited(
        &mut self,
        delimited: Delimited,
        full_start: usize,
        stop_at_end_of_line: bool,
        diagnostics: &mut Vec<DiagnosticInfo>,
    ) -> Scanned {
        let rest = self.rest();
        if rest.is_empty() {
            if stop_at_end_of_line {
                return Scanned::token(SyntaxKind::EndOfFileToken);
            }
            diagnostics.push(self.diagnostic(full_start, self.position, 0, delimited.unterminated, None));
            self.mode = self.outer;
            return Scanned::missing(delimited.end_kind);
        }
        if rest.starts_with(delimited.terminator) {
            self.position += delimited.terminator.len();
            self.mode = self.outer;
            return Scanned::token(delimited.end_kind);
        }

        let mut len = rest.find(delimited.terminator).unwrap_or(rest.len());
        if stop_at_end_of_line && let Some(eol) = first_line_break_end(&rest[..len]) {
            len = eol;
        }
        for (index, c) in rest[..len].char_indices() {
            if is_illegal(c) {
                diagnostics.push(self.illegal_character(full_start, self.position + index, c));
            }
        }
        if delimited.end_kind == SyntaxKind::CommentEndToken
            && let Some(index) = rest[..len].find("--")
        {
            diagnostics.push(self.diagnostic(
                full_start,
                self.position + index,
                2,
                ErrorCode::DoubleHyphenInComment,
                None,
            ));
        }
        self.position += len;
        Scanned::token(delimited.text_kind)
    }

    /// Text run with entity decoding
    ///
    /// Returns the decoded value when it differs from the raw text; the
    /// buffer is only allocated once the first reference is seen.
    fn scan_text(
        &mut self,
        full_start: usize,
        stop: impl Fn(char) -> bool,
        stop_at_end_of_line: bool,
        diagnostics: &mut Vec<DiagnosticInfo>,
    ) -> Option<String> {
        let text = self.text;
        let start = self.position;
        let mut value: Option<String> = None;
        while let Some(c) = text[self.position..].chars().next() {
            if stop(c) {
                break;
            }
            if c == '&' {
                let entity = scan_entity(&text[self.position..]);
                if let Some(error) = entity.error {
                    diagnostics.push(self.diagnostic(
                        full_start,
                        self.position + error.offset,
                        error.width,
                        error.code,
                        error.arg,
                    ));
                }
                value
                    .get_or_insert_with(|| text[start..self.position].to_string())
                    .push(entity.decoded);
                self.position += entity.len;
                continue;
            }
            if is_illegal(c) {
                diagnostics.push(self.illegal_character(full_start, self.position, c));
            }
            self.position += c.len_utf8();
            if let Some(value) = &mut value {
                value.push(c);
            }
            let line_break = c == '\n' || (c == '\r' && !text[self.position..].starts_with('\n'));
            if stop_at_end_of_line && line_break {
                break;
            }
        }
        value
    }

    fn illegal_character(&self, full_start: usize, at: usize, c: char) -> DiagnosticInfo {
        self.diagnostic(
            full_start,
            at,
            c.len_utf8(),
            ErrorCode::IllegalCharacter,
            Some(c.escape_unicode().to_string()),
        )
    }
}

/// Terminated construct scanned by [`Lexer::scan_delimited`]
#[derive(Clone, Copy)]
struct Delimited {
    terminator: &'static str,
    text_kind: SyntaxKind,
    end_kind: SyntaxKind,
    unterminated: ErrorCode,
}

impl Delimited {
    const COMMENT: Delimited = Delimited {
        terminator: "-->",
        text_kind: SyntaxKind::CommentTextToken,
        end_kind: SyntaxKind::CommentEndToken,
        unterminated: ErrorCode::UnterminatedComment,
    };
    const CDATA: Delimited = Delimited {
        terminator: "]]>",
        text_kind: SyntaxKind::CDataTextToken,
        end_kind: SyntaxKind::CDataEndToken,
        unterminated: ErrorCode::UnterminatedCData,
    };
    const PROCESSING_INSTRUCTION: Delimited = Delimited {
        terminator: "?>",
        text_kind: SyntaxKind::ProcessingInstructionTextToken,
        end_kind: SyntaxKind::ProcessingInstructionEndToken,
        unterminated: ErrorCode::UnterminatedProcessingInstruction,
    };
}

fn quote_token_kind(quote: QuoteKind) -> SyntaxKind {
    match quote {
        QuoteKind::Double | QuoteKind::SmartDouble => SyntaxKind::DoubleQuoteToken,
        QuoteKind::Single | QuoteKind::SmartSingle => SyntaxKind::SingleQuoteToken,
    }
}

pub(crate) fn is_name_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_name_char(c: char, in_tag: bool) -> bool {
    c == '_' || c == '-' || c.is_alphanumeric() || (in_tag && c == '.')
}

fn name_len(text: &str, in_tag: bool) -> usize {
    text.char_indices()
        .find(|&(index, c)| if index == 0 { !is_name_start(c) } else { !is_name_char(c, in_tag) })
        .map_or(text.len(), |(index, _)| index)
}

fn is_illegal(c: char) -> bool {
    (c.is_control() && !matches!(c, '\t' | '\n' | '\r')) || matches!(c, '\u{FFFE}' | '\u{FFFF}')
}

fn whitespace_len(text: &str) -> Option<usize> {
    let len = text.bytes().take_while(|b| matches!(b, b' ' | b'\t')).count();
    (len > 0).then_some(len)
}

fn end_of_line_len(text: &str) -> Option<usize> {
    if text.starts_with("\r\n") {
        Some(2)
    } else if text.starts_with(['\r', '\n']) {
        Some(1)
    } else {
        None
    }
}

/// End of the first line break in `text`, if any
fn first_line_break_end(text: &str) -> Option<usize> {
    let index = text.find(['\r', '\n'])?;
    Some(index + end_of_line_len(&text[index..]).unwrap_or(1))
}

/// Lexes a whole document; the last token is the end-of-file token
pub fn tokenize(text: &str, documentation_mode: DocumentationMode) -> Vec<Token<'_>> {
    let mut lexer = Lexer::new(text, documentation_mode);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token(false);
        let done = token.kind == SyntaxKind::EndOfFileToken;
        tokens.push(token);
        if done {
            return tokens;
        }
    }
}
