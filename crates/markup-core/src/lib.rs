//! Markup Core
//!
//! Incremental, error-tolerant lexer and parser for XML-like markup.
//! Parsing never fails on malformed input: the result is always a complete
//! tree that reproduces the source text exactly, with diagnostics attached
//! where the input deviates from the grammar.
//!
//! The tree has two layers. Green nodes are immutable, positionless and
//! shared; red nodes wrap them with positions and parent links on demand.
//! [`SyntaxTree`] owns a parse result and produces new trees for edited
//! text, reusing unaffected subtrees.

pub mod ast;
pub mod debug;
pub mod diagnostics;
pub mod error;
pub mod green;
pub mod lexer;
mod node_or_token;
pub mod options;
mod parser;
pub mod red;
pub mod result;
pub mod syntax_kind;
pub mod text;
pub mod tree;

pub use debug::{DumpOptions, dump};
pub use diagnostics::{
    DefaultMessageProvider, Diagnostic, DiagnosticInfo, ErrorCode, MessageProvider, Severity,
};
pub use error::MarkupError;
pub use green::{
    CacheStats, GreenElement, GreenNode, GreenToken, GreenTrivia, NodeCache, NodeFlags,
    SharedNodeCache, SyntaxAnnotation, SyntaxFactory,
};
pub use lexer::{LexMode, LexedLine, Lexer, ScannerState, Token, lex_line, lex_lines, tokenize};
pub use node_or_token::NodeOrToken;
pub use options::{DocumentationMode, ParseOptions, SourceKind};
pub use parser::DEFAULT_MAX_DEPTH;
pub use red::{
    Preorder, PreorderWithTokens, SyntaxElement, SyntaxNode, SyntaxToken, SyntaxTrivia,
    SyntaxWalker, WalkDepth, WalkEvent, WeakSyntaxNode,
};
pub use result::Result;
pub use syntax_kind::SyntaxKind;
pub use text::{
    LinePosition, LineSpan, SourceText, TextChange, TextChangeRange, TextRange, TextSize,
};
pub use tree::{CancellationToken, SyntaxTree, TreeParser};

/// Initialize the tracing subscriber for logging
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("markup=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true),
        )
        .init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
