//! Line-at-a-time lexing for colorizers

use super::{Lexer, ScannerState, Token};
use crate::options::DocumentationMode;
use crate::syntax_kind::SyntaxKind;

/// Lexes one line starting from `state`
///
/// Returns the tokens of the line and the state to resume the next line
/// with. Constructs still open at the end of the line stay open in the
/// returned state. An end-of-file token is only included when it carries
/// trivia, so the tokens of consecutive lines concatenate to their text.
pub fn lex_line(line: &str, state: ScannerState) -> (Vec<Token<'_>>, ScannerState) {
    let mut lexer = Lexer::with_state(line, DocumentationMode::Parse, state);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token(true);
        if token.kind == SyntaxKind::EndOfFileToken {
            if token.full_len() > 0 {
                tokens.push(token);
            }
            break;
        }
        tokens.push(token);
    }
    (tokens, lexer.scanner_state())
}

/// Tokens of one line of a document
#[derive(Debug, Clone)]
pub struct LexedLine<'src> {
    /// Zero-based line number
    pub line: usize,
    /// Line text including its line break
    pub text: &'src str,
    pub tokens: Vec<Token<'src>>,
    pub start_state: ScannerState,
    pub end_state: ScannerState,
}

/// Lexes `text` line by line, threading the scanner state through
pub fn lex_lines(text: &str) -> Vec<LexedLine<'_>> {
    let mut state = ScannerState::initial();
    split_lines(text)
        .enumerate()
        .map(|(line, line_text)| {
            let (tokens, end_state) = lex_line(line_text, state);
            let lexed = LexedLine {
                line,
                text: line_text,
                tokens,
                start_state: state,
                end_state,
            };
            state = end_state;
            lexed
        })
        .collect()
}

/// Lines with their terminators; `\r\n` counts as one break
fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = text;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let end = match rest.find(['\r', '\n']) {
            Some(index) if rest[index..].starts_with("\r\n") => index + 2,
            Some(index) => index + 1,
            None => rest.len(),
        };
        let (line, tail) = rest.split_at(end);
        rest = tail;
        Some(line)
    })
}
