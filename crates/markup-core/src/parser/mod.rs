//! Recursive-descent parser building green trees
//!
//! The parser pulls tokens from the [`Lexer`](crate::lexer::Lexer) on
//! demand, keeps a small lookahead buffer and builds green nodes bottom-up.
//! Malformed input never stops it: absent tokens are synthesized as missing
//! tokens, unplaceable tokens become skipped-token trivia, and both carry
//! diagnostics. Only two conditions abort a grammar rule: the nesting depth
//! limit and cancellation.

mod grammar;
mod incremental;
mod pool;
mod recovery;

pub(crate) use incremental::ReuseMap;

use std::collections::VecDeque;

use tracing::{debug, trace, warn};

use crate::diagnostics::{DiagnosticInfo, ErrorCode};
use crate::error::MarkupError;
use crate::green::{CacheStats, GreenElement, GreenNode, GreenToken, NodeCache, SyntaxFactory};
use crate::lexer::{LexMode, Lexer, Token};
use crate::options::{ParseOptions, SourceKind};
use crate::result::Result;
use crate::syntax_kind::SyntaxKind;
use crate::text::text_size;
use crate::tree::CancellationToken;
use pool::ListPool;

/// Default limit on nested elements
pub const DEFAULT_MAX_DEPTH: u32 = 512;

/// Why a grammar rule stopped early
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Abort {
    DepthExceeded { position: usize },
    Cancelled,
}

pub(crate) type ParseResult<T> = std::result::Result<T, Abort>;

pub(crate) struct ParseConfig<'a> {
    pub options: &'a ParseOptions,
    pub max_depth: u32,
    pub cache: NodeCache,
    pub cancellation: Option<&'a CancellationToken>,
    pub reuse: Option<ReuseMap>,
}

pub(crate) struct ParseOutput {
    pub root: GreenNode,
    pub reused_nodes: usize,
    pub cache_stats: CacheStats,
}

/// Parses `text` into a green `Body` node
///
/// Only cancellation produces an error; malformed input yields diagnostics.
pub(crate) fn parse(text: &str, config: ParseConfig<'_>) -> Result<ParseOutput> {
    debug!(
        len = text.len(),
        incremental = config.reuse.is_some(),
        "parsing document"
    );
    let mut parser = Parser::new(text, config);
    let root = parser.parse_document()?;
    let output = ParseOutput {
        reused_nodes: parser.reused,
        cache_stats: parser.factory.cache_stats(),
        root,
    };
    debug!(
        width = u32::from(output.root.full_width()),
        diagnostics = output.root.contains_diagnostics(),
        reused = output.reused_nodes,
        cache_hits = output.cache_stats.hits,
        cache_misses = output.cache_stats.misses,
        "parsed document"
    );
    Ok(output)
}

pub(crate) struct Parser<'src, 'a> {
    lexer: Lexer<'src>,
    buffer: VecDeque<Token<'src>>,
    factory: SyntaxFactory,
    pool: ListPool,
    /// Names of the elements currently open, innermost last
    open_elements: Vec<String>,
    depth: u32,
    max_depth: u32,
    /// Enclosing elements still to close after a mismatched end tag
    pending_closes: u32,
    /// Tokens skipped and not yet attached as trivia
    skipped: Vec<GreenElement>,
    /// Whether the last consumed token ended in whitespace
    last_trailing_trivia: bool,
    source_kind: SourceKind,
    cancellation: Option<&'a CancellationToken>,
    reuse: Option<ReuseMap>,
    reused: usize,
}

impl<'src, 'a> Parser<'src, 'a> {
    fn new(text: &'src str, config: ParseConfig<'a>) -> Self {
        Self {
            lexer: Lexer::new(text, config.options.documentation_mode),
            buffer: VecDeque::new(),
            factory: SyntaxFactory::with_cache(config.cache),
            pool: ListPool::new(),
            open_elements: Vec::new(),
            depth: 0,
            max_depth: config.max_depth.max(1),
            pending_closes: 0,
            skipped: Vec::new(),
            last_trailing_trivia: false,
            source_kind: config.options.source_kind,
            cancellation: config.cancellation,
            reuse: config.reuse,
            reused: 0,
        }
    }

    fn parse_document(&mut self) -> Result<GreenNode> {
        self.depth = 0;
        match self.parse_body() {
            Ok(body) => Ok(body),
            Err(Abort::Cancelled) => {
                debug!("parse cancelled");
                Err(MarkupError::Cancelled)
            }
            Err(Abort::DepthExceeded { position }) => {
                warn!(
                    position,
                    max_depth = self.max_depth,
                    "element nesting too deep, keeping the document as skipped text"
                );
                Ok(self.depth_exceeded_body(position))
            }
        }
    }

    /// Degenerate tree: the whole text as one skipped token in front of the
    /// end-of-file token
    fn depth_exceeded_body(&mut self, position: usize) -> GreenNode {
        let text = self.lexer.text();
        self.lexer.skip_to_end();
        self.buffer.clear();
        self.skipped.clear();
        self.open_elements.clear();
        self.pending_closes = 0;
        self.depth = 0;

        let mut tokens = vec![GreenElement::from(GreenToken::new(SyntaxKind::BadToken, text))];
        let trivia = self.factory.skipped_tokens_trivia(&mut tokens);
        let eof = GreenToken::create(
            SyntaxKind::EndOfFileToken,
            "",
            None,
            vec![trivia],
            Vec::new(),
            Vec::new(),
        );
        let diagnostic = DiagnosticInfo::new(ErrorCode::MaxDepthExceeded, text_size(position), 0.into())
            .with_args([self.max_depth.to_string()]);
        GreenNode::new(SyntaxKind::Body, [None, Some(eof.into())]).with_diagnostics(vec![diagnostic])
    }

    fn check_cancelled(&self) -> ParseResult<()> {
        match self.cancellation {
            Some(token) if token.is_cancelled() => Err(Abort::Cancelled),
            _ => Ok(()),
        }
    }

    fn nth(&mut self, n: usize) -> &Token<'src> {
        while self.buffer.len() <= n {
            let token = self.lexer.next_token(false);
            self.buffer.push_back(token);
        }
        &self.buffer[n]
    }

    fn current(&mut self) -> &Token<'src> {
        self.nth(0)
    }

    fn current_kind(&mut self) -> SyntaxKind {
        self.current().kind
    }

    fn nth_kind(&mut self, n: usize) -> SyntaxKind {
        self.nth(n).kind
    }

    fn at(&mut self, kind: SyntaxKind) -> bool {
        self.current_kind() == kind
    }

    /// Relex from the first unconsumed token in `mode`
    ///
    /// Used where the grammar knows more about the context than the lexer,
    /// e.g. after the root element the lexer returns to document level.
    fn relex_in(&mut self, mode: LexMode) {
        let position = match self.buffer.front() {
            Some(token) => token.full_start,
            None => self.lexer.position(),
        };
        if self.buffer.is_empty() && self.lexer.mode() == mode {
            return;
        }
        self.buffer.clear();
        self.lexer.reset_to(position, mode);
    }

    /// Removes the current token from the stream without attaching pending
    /// skipped tokens
    fn next_raw(&mut self) -> GreenToken {
        self.nth(0);
        let token = match self.buffer.pop_front() {
            Some(token) => token,
            None => self.lexer.next_token(false),
        };
        self.last_trailing_trivia = !token.trailing.is_empty();
        self.green_token(token)
    }

    /// Accepts the current token
    ///
    /// Tokens skipped before anything was accepted become its leading trivia.
    fn bump(&mut self) -> GreenToken {
        let token = self.next_raw();
        if self.skipped.is_empty() {
            return token;
        }
        let trivia = self.factory.skipped_tokens_trivia(&mut self.skipped);
        token.with_prepended_trivia(vec![trivia])
    }

    fn bump_element(&mut self) -> GreenElement {
        self.bump().into()
    }

    /// Moves the parked skipped tokens behind the last token of `preceding`
    fn attach_skipped_after(&mut self, preceding: &mut GreenElement) {
        if self.skipped.is_empty() || preceding.last_token().is_none() {
            return;
        }
        let trivia = self.factory.skipped_tokens_trivia(&mut self.skipped);
        if let Some(element) = preceding.with_trailing_trivia(vec![trivia]) {
            *preceding = element;
        }
    }

    /// Like [`Parser::attach_skipped_after`] with the last of `items`; at the
    /// start of the document the tokens stay parked for the next token
    fn attach_skipped_to_last(&mut self, items: &mut [GreenElement]) {
        if let Some(last) = items.last_mut() {
            self.attach_skipped_after(last);
        }
    }

    fn green_token(&mut self, token: Token<'src>) -> GreenToken {
        let leading = token
            .leading
            .iter()
            .map(|trivia| self.factory.trivia(trivia.kind, trivia.text))
            .collect();
        let trailing = token
            .trailing
            .iter()
            .map(|trivia| self.factory.trivia(trivia.kind, trivia.text))
            .collect();
        if token.is_missing {
            return GreenToken::missing_with_leading(token.kind, leading, token.diagnostics);
        }
        self.factory.token(
            token.kind,
            token.text,
            token.value.as_deref(),
            leading,
            trailing,
            token.diagnostics,
        )
    }

    /// Zero-width token standing in for an absent `kind`
    fn missing(&mut self, kind: SyntaxKind, diagnostic: Option<DiagnosticInfo>) -> GreenToken {
        self.factory.missing_token(kind, diagnostic)
    }

    fn missing_element(&mut self, kind: SyntaxKind, diagnostic: Option<DiagnosticInfo>) -> GreenElement {
        self.missing(kind, diagnostic).into()
    }

    /// Reuses an element of the previous tree starting at the current `<`
    fn try_reuse(&mut self) -> Option<GreenElement> {
        let reuse = self.reuse.as_ref()?;
        if self.buffer.len() != 1 || !self.skipped.is_empty() {
            return None;
        }
        let position = self.buffer.front()?.full_start;
        let node = reuse.lookup(position)?;
        if self.depth + node.element_depth() > self.max_depth {
            trace!(position, "reuse rejected: depth limit");
            return None;
        }
        let end = position + u32::from(node.full_width()) as usize;
        if end > self.lexer.text().len() {
            return None;
        }
        let node = node.clone();
        trace!(position, end, kind = ?node.kind(), "reusing element");
        self.buffer.clear();
        let mode = if self.depth > 0 {
            LexMode::Content
        } else {
            LexMode::Misc
        };
        self.lexer.reset_to(end, mode);
        self.last_trailing_trivia = false;
        self.reused += 1;
        Some(node.into())
    }
}

#[cfg(test)]
mod tests;
