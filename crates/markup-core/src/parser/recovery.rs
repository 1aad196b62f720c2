//! Error recovery: skipping unplaceable tokens and synthesizing missing ones

use super::Parser;
use crate::diagnostics::{DiagnosticInfo, ErrorCode};
use crate::green::{GreenElement, GreenNode, GreenToken};
use crate::syntax_kind::SyntaxKind;

/// Tokens that start something the grammar can place; skipping stops there
pub(super) fn is_recovery_point(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::LessThanToken
            | SyntaxKind::LessThanSlashToken
            | SyntaxKind::CommentStartToken
            | SyntaxKind::CDataStartToken
            | SyntaxKind::ProcessingInstructionStartToken
            | SyntaxKind::EndOfFileToken
    )
}

/// Recovery points inside a start tag
pub(super) fn is_tag_recovery_point(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::NameToken
            | SyntaxKind::GreaterThanToken
            | SyntaxKind::SlashGreaterThanToken
            | SyntaxKind::LessThanToken
            | SyntaxKind::LessThanSlashToken
            | SyntaxKind::EndOfFileToken
    )
}

impl<'src, 'a> Parser<'src, 'a> {
    /// Skips the current token, then every following token for which
    /// `more` holds
    ///
    /// Skipped tokens are parked until the caller attaches them as trailing
    /// skipped-token trivia of the preceding node. Only the first token of
    /// the run is diagnosed, with
    /// `args` or, when empty, the token text. Returns the number of tokens
    /// skipped; zero means the stream was at its end and the caller must stop
    /// looping.
    pub(super) fn skip(&mut self, code: ErrorCode, args: Vec<String>, more: impl Fn(SyntaxKind) -> bool) -> usize {
        let mut count = 0;
        loop {
            let kind = self.current_kind();
            if kind == SyntaxKind::EndOfFileToken || (count > 0 && !more(kind)) {
                break;
            }
            let mut token = self.next_raw();
            if count == 0 {
                let args = if args.is_empty() {
                    vec![token.text().to_string()]
                } else {
                    args.clone()
                };
                let diagnostic = DiagnosticInfo::new(code, token.leading_trivia_width(), token.width())
                    .with_args(args);
                token = token.with_diagnostics(vec![diagnostic]);
            }
            self.skipped.push(token.into());
            count += 1;
        }
        count
    }

    /// Skips an end tag that closes nothing, through its `>`
    pub(super) fn skip_end_tag(&mut self, name: &str) -> usize {
        let count = self.skip(ErrorCode::UnmatchedEndTag, vec![name.to_string()], |kind| {
            !is_recovery_point(kind)
                && !matches!(
                    kind,
                    SyntaxKind::GreaterThanToken | SyntaxKind::SlashGreaterThanToken
                )
        });
        if count > 0 && self.at(SyntaxKind::GreaterThanToken) {
            let token = self.next_raw();
            self.skipped.push(token.into());
            return count + 1;
        }
        count
    }

    /// The current token if it is a quote; a typographic quote is replaced
    /// by a missing ASCII quote that keeps the original as skipped trivia
    pub(super) fn bump_quote(&mut self) -> GreenToken {
        let (kind, smart) = {
            let current = self.current();
            (current.kind, !current.is_missing && !current.text.is_ascii())
        };
        if !smart {
            return self.bump();
        }
        let mut token = self.next_raw();
        let diagnostic = DiagnosticInfo::new(ErrorCode::SmartQuote, token.leading_trivia_width(), token.width())
            .with_args([token.text().to_string()]);
        token = token.with_diagnostics(vec![diagnostic]);
        self.skipped.push(token.into());
        let trivia = self.factory.skipped_tokens_trivia(&mut self.skipped);
        GreenToken::missing_with_leading(kind, vec![trivia], Vec::new())
    }

    /// End tag synthesized for an element whose end tag is absent
    ///
    /// Carries `diagnostic` on the node; its missing tokens carry none.
    pub(super) fn missing_end_tag(&mut self, diagnostic: Option<DiagnosticInfo>) -> GreenNode {
        let name_token = self.missing_element(SyntaxKind::NameToken, None);
        let name = self.factory.node(SyntaxKind::Name, vec![None, Some(name_token)]);
        let slots = vec![
            Some(self.missing_element(SyntaxKind::LessThanSlashToken, None)),
            Some(GreenElement::from(name)),
            Some(self.missing_element(SyntaxKind::GreaterThanToken, None)),
        ];
        self.factory
            .node_with_diagnostics(SyntaxKind::EndTag, slots, diagnostic.into_iter().collect())
    }

    /// Missing `kind` reported as "'text' expected"
    pub(super) fn expected_token(&mut self, kind: SyntaxKind) -> GreenElement {
        let text = kind.token_text().unwrap_or_default();
        let diagnostic = DiagnosticInfo::at_start(ErrorCode::ExpectedToken).with_args([text]);
        self.missing_element(kind, Some(diagnostic))
    }

    /// The current token if it has `kind`, else a diagnosed missing token
    pub(super) fn expect(&mut self, kind: SyntaxKind) -> GreenElement {
        if self.at(kind) {
            self.bump_element()
        } else {
            self.expected_token(kind)
        }
    }
}
