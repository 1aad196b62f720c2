//! Syntax tree container
//!
//! A [`SyntaxTree`] owns one parse result: the root, the source text, the
//! options it was parsed with and the file path it belongs to. Trees are
//! immutable; editing produces a new tree through
//! [`SyntaxTree::with_changed_text`] or [`SyntaxTree::with_changes`], which
//! reuse unaffected element subtrees of the old tree.
//!
//! ## Recoverable roots
//!
//! A tree built with [`TreeParser::recoverable`] holds its root weakly and
//! reparses the retained text when the root is requested after every strong
//! reference was dropped. Callers see the same content either way.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use tracing::debug;

use crate::diagnostics::{Diagnostic, MessageProvider};
use crate::green::{CacheStats, GreenNode, NodeCache, SharedNodeCache};
use crate::options::ParseOptions;
use crate::parser::{self, DEFAULT_MAX_DEPTH, ParseConfig, ParseOutput, ReuseMap};
use crate::red::{SyntaxNode, SyntaxToken, SyntaxTrivia, WeakSyntaxNode};
use crate::result::Result;
use crate::text::{LineSpan, SourceText, TextChange, TextChangeRange, TextRange, TextSize};

/// Shared flag a caller sets to abandon a running parse
///
/// The parser checks it between grammar productions. Clones share the flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Everything besides the text needed to parse, or to parse again
#[derive(Clone)]
struct Settings {
    options: ParseOptions,
    file_path: String,
    max_depth: u32,
    shared_cache: Option<SharedNodeCache>,
    recoverable: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            options: ParseOptions::default(),
            file_path: String::new(),
            max_depth: DEFAULT_MAX_DEPTH,
            shared_cache: None,
            recoverable: false,
        }
    }
}

impl Settings {
    fn run(
        &self,
        text: &str,
        cancellation: Option<&CancellationToken>,
        reuse: Option<ReuseMap>,
    ) -> Result<ParseOutput> {
        let cache = match &self.shared_cache {
            Some(shared) => NodeCache::shared(shared.clone()),
            None => NodeCache::new(),
        };
        parser::parse(
            text,
            ParseConfig {
                options: &self.options,
                max_depth: self.max_depth,
                cache,
                cancellation,
                reuse,
            },
        )
    }

    fn run_uncancelled(&self, text: &str, reuse: Option<ReuseMap>) -> ParseOutput {
        match self.run(text, None, reuse) {
            Ok(output) => output,
            // only a cancellation token can make a parse fail
            Err(error) => unreachable!("parse without cancellation failed: {error}"),
        }
    }
}

/// Builder for parses that need more than [`ParseOptions`]
///
/// ```ignore
/// let tree = TreeParser::new()
///     .file_path("views/main.xaml")
///     .max_depth(64)
///     .parse("<Window/>")?;
/// ```
#[derive(Clone, Default)]
pub struct TreeParser {
    settings: Settings,
    cancellation: Option<CancellationToken>,
}

impl TreeParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn options(mut self, options: ParseOptions) -> Self {
        self.settings.options = options;
        self
    }

    pub fn file_path(mut self, path: impl Into<String>) -> Self {
        self.settings.file_path = path.into();
        self
    }

    /// Intern nodes through a table shared with other parses
    pub fn shared_cache(mut self, cache: SharedNodeCache) -> Self {
        self.settings.shared_cache = Some(cache);
        self
    }

    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Hold the root weakly and recreate it from the text on demand
    pub fn recoverable(mut self, recoverable: bool) -> Self {
        self.settings.recoverable = recoverable;
        self
    }

    /// Maximum element nesting; deeper documents become one skipped run
    pub fn max_depth(mut self, max_depth: u32) -> Self {
        self.settings.max_depth = max_depth.max(1);
        self
    }

    /// Full parse of `text`
    ///
    /// Fails only when the cancellation token fires.
    pub fn parse(&self, text: impl Into<SourceText>) -> Result<SyntaxTree> {
        let text = text.into();
        let output = self
            .settings
            .run(text.as_str(), self.cancellation.as_ref(), None)?;
        Ok(SyntaxTree::from_output(output, Some(text), self.settings.clone()))
    }

    /// Incremental reparse of `old` against `new_text`, honoring this
    /// builder's cancellation token and settings
    pub fn reparse(&self, old: &SyntaxTree, new_text: impl Into<SourceText>) -> Result<SyntaxTree> {
        let new_text = new_text.into();
        let old_text = old.get_text();
        let changes = new_text.change_ranges(&old_text);
        let reuse = ReuseMap::new(old.get_root().green(), &changes);
        let output = self
            .settings
            .run(new_text.as_str(), self.cancellation.as_ref(), Some(reuse))?;
        Ok(SyntaxTree::from_output(output, Some(new_text), self.settings.clone()))
    }
}

enum Root {
    Eager(SyntaxNode),
    Recoverable(Mutex<WeakSyntaxNode>),
}

struct TreeInner {
    root: Root,
    text: OnceLock<SourceText>,
    settings: Settings,
    length: TextSize,
    reused_nodes: usize,
    cache_stats: CacheStats,
}

/// An immutable parse result
///
/// Cloning is cheap and shares the tree.
#[derive(Clone)]
pub struct SyntaxTree {
    inner: Arc<TreeInner>,
}

impl SyntaxTree {
    /// Full parse of `text` with default settings
    pub fn parse_text(text: impl Into<SourceText>, options: ParseOptions) -> SyntaxTree {
        let text = text.into();
        let settings = Settings {
            options,
            ..Settings::default()
        };
        let output = settings.run_uncancelled(text.as_str(), None);
        Self::from_output(output, Some(text), settings)
    }

    /// Tree over an existing root; the text is produced from it on demand
    pub fn create(root: &SyntaxNode, options: ParseOptions) -> SyntaxTree {
        let settings = Settings {
            options,
            ..Settings::default()
        };
        Self::from_green(root.green().clone(), None, settings, 0, CacheStats::default())
    }

    fn from_output(output: ParseOutput, text: Option<SourceText>, settings: Settings) -> SyntaxTree {
        Self::from_green(
            output.root,
            text,
            settings,
            output.reused_nodes,
            output.cache_stats,
        )
    }

    fn from_green(
        green: GreenNode,
        text: Option<SourceText>,
        settings: Settings,
        reused_nodes: usize,
        cache_stats: CacheStats,
    ) -> SyntaxTree {
        let length = green.full_width();
        let cell = OnceLock::new();
        let recoverable = settings.recoverable && text.is_some();
        if let Some(text) = text {
            let _ = cell.set(text);
        }
        let root = SyntaxNode::new_root(green);
        let root = if recoverable {
            Root::Recoverable(Mutex::new(root.downgrade()))
        } else {
            Root::Eager(root)
        };
        SyntaxTree {
            inner: Arc::new(TreeInner {
                root,
                text: cell,
                settings,
                length,
                reused_nodes,
                cache_stats,
            }),
        }
    }

    /// Root node, recreated from the text if a recoverable root was dropped
    pub fn get_root(&self) -> SyntaxNode {
        match &self.inner.root {
            Root::Eager(root) => root.clone(),
            Root::Recoverable(slot) => {
                let mut weak = slot.lock().unwrap_or_else(PoisonError::into_inner);
                if let Some(root) = weak.upgrade() {
                    return root;
                }
                let text = self.get_text();
                debug!(
                    path = %self.inner.settings.file_path,
                    len = text.as_str().len(),
                    "recreating dropped root"
                );
                let output = self.inner.settings.run_uncancelled(text.as_str(), None);
                let root = SyntaxNode::new_root(output.root);
                *weak = root.downgrade();
                root
            }
        }
    }

    /// Root node if it is alive, without reparsing
    pub fn try_get_root(&self) -> Option<SyntaxNode> {
        match &self.inner.root {
            Root::Eager(root) => Some(root.clone()),
            Root::Recoverable(slot) => slot.lock().unwrap_or_else(PoisonError::into_inner).upgrade(),
        }
    }

    pub fn get_text(&self) -> SourceText {
        self.inner
            .text
            .get_or_init(|| SourceText::new(self.get_root().to_full_string()))
            .clone()
    }

    /// Source text if it is already available
    pub fn try_get_text(&self) -> Option<SourceText> {
        self.inner.text.get().cloned()
    }

    pub fn length(&self) -> TextSize {
        self.inner.length
    }

    pub fn file_path(&self) -> &str {
        &self.inner.settings.file_path
    }

    pub fn options(&self) -> &ParseOptions {
        &self.inner.settings.options
    }

    pub fn is_recoverable(&self) -> bool {
        matches!(self.inner.root, Root::Recoverable(_))
    }

    /// Element subtrees taken over from the previous tree by an incremental
    /// reparse
    pub fn reused_node_count(&self) -> usize {
        self.inner.reused_nodes
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.inner.cache_stats
    }

    pub fn ptr_eq(a: &SyntaxTree, b: &SyntaxTree) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    /// Same tree under another path
    pub fn with_file_path(&self, path: impl Into<String>) -> SyntaxTree {
        let path = path.into();
        if path == self.inner.settings.file_path {
            return self.clone();
        }
        let settings = Settings {
            file_path: path,
            ..self.inner.settings.clone()
        };
        let root = match &self.inner.root {
            Root::Eager(root) => Root::Eager(root.clone()),
            Root::Recoverable(slot) => {
                Root::Recoverable(Mutex::new(slot.lock().unwrap_or_else(PoisonError::into_inner).clone()))
            }
        };
        let text = OnceLock::new();
        if let Some(existing) = self.inner.text.get() {
            let _ = text.set(existing.clone());
        }
        SyntaxTree {
            inner: Arc::new(TreeInner {
                root,
                text,
                settings,
                length: self.inner.length,
                reused_nodes: self.inner.reused_nodes,
                cache_stats: self.inner.cache_stats,
            }),
        }
    }

    /// Tree for `new_text`, reusing what the edit left untouched
    ///
    /// Returns this tree when `new_text` is the very same text instance.
    pub fn with_changed_text(&self, new_text: impl Into<SourceText>) -> SyntaxTree {
        let new_text = new_text.into();
        let old_text = self.get_text();
        if SourceText::ptr_eq(&new_text, &old_text) {
            return self.clone();
        }
        let changes = new_text.change_ranges(&old_text);
        if changes.is_empty() {
            debug!("text unchanged, sharing the green tree");
            return Self::from_green(
                self.get_root().green().clone(),
                Some(new_text),
                self.inner.settings.clone(),
                0,
                CacheStats::default(),
            );
        }
        self.reparse(new_text, &changes)
    }

    /// Tree for this text with `changes` applied
    ///
    /// Fails when a change lies outside the text or changes overlap.
    pub fn with_changes(&self, changes: &[TextChange]) -> Result<SyntaxTree> {
        if changes.is_empty() {
            return Ok(self.clone());
        }
        let new_text = self.get_text().with_changes(changes)?;
        let ranges: Vec<TextChangeRange> = changes.iter().map(TextChange::change_range).collect();
        Ok(self.reparse(new_text, &ranges))
    }

    fn reparse(&self, new_text: SourceText, changes: &[TextChangeRange]) -> SyntaxTree {
        let reuse = ReuseMap::new(self.get_root().green(), changes);
        if reuse.len() == 0 {
            debug!(changes = changes.len(), "no reusable subtrees, full reparse");
        } else {
            debug!(
                changes = changes.len(),
                candidates = reuse.len(),
                "incremental reparse"
            );
        }
        let output = self
            .inner
            .settings
            .run_uncancelled(new_text.as_str(), Some(reuse));
        Self::from_output(output, Some(new_text), self.inner.settings.clone())
    }

    /// Every diagnostic in the tree, in document order
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.get_root().diagnostics()
    }

    pub fn diagnostics_with(&self, provider: &dyn MessageProvider) -> Vec<Diagnostic> {
        self.get_root().diagnostics_with(provider)
    }

    pub fn diagnostics_for_node(&self, node: &SyntaxNode) -> Vec<Diagnostic> {
        node.diagnostics()
    }

    pub fn diagnostics_for_token(&self, token: &SyntaxToken) -> Vec<Diagnostic> {
        token.diagnostics()
    }

    pub fn diagnostics_for_trivia(&self, trivia: &SyntaxTrivia) -> Vec<Diagnostic> {
        trivia.diagnostics()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics().iter().any(Diagnostic::is_error)
    }

    /// Line and column span of `span`
    pub fn get_line_span(&self, span: TextRange) -> Result<LineSpan> {
        self.get_text().line_span(span)
    }
}

impl fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntaxTree")
            .field("file_path", &self.inner.settings.file_path)
            .field("length", &self.inner.length)
            .field("recoverable", &self.is_recoverable())
            .field("reused_nodes", &self.inner.reused_nodes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::ErrorCode;
    use crate::error::MarkupError;

    #[test]
    fn test_parse_text_round_trips() {
        let source = "<?xml version=\"1.0\"?>\n<root a=\"1\">text &amp; more</root>\n";
        let tree = SyntaxTree::parse_text(source, ParseOptions::default());
        assert_eq!(tree.get_root().to_full_string(), source);
        assert_eq!(tree.length(), TextSize::from(source.len() as u32));
        assert!(tree.try_get_text().is_some());
        assert!(tree.diagnostics().is_empty());
    }

    #[test]
    fn test_created_tree_produces_text_lazily() {
        let parsed = SyntaxTree::parse_text("<a/>", ParseOptions::default());
        let tree = SyntaxTree::create(&parsed.get_root(), ParseOptions::default());
        assert!(tree.try_get_text().is_none());
        assert_eq!(tree.get_text().as_str(), "<a/>");
        assert!(tree.try_get_text().is_some());
    }

    #[test]
    fn test_same_text_instance_returns_same_tree() {
        let tree = SyntaxTree::parse_text("<a>1</a>", ParseOptions::default());
        let same = tree.with_changed_text(tree.get_text());
        assert!(SyntaxTree::ptr_eq(&tree, &same));

        let equal = tree.with_changed_text("<a>1</a>");
        assert!(!SyntaxTree::ptr_eq(&tree, &equal));
        assert!(GreenNode::ptr_eq(tree.get_root().green(), equal.get_root().green()));
    }

    #[test]
    fn test_incremental_reparse_reuses_untouched_elements() {
        let tree = SyntaxTree::parse_text("<root><a>1</a><b>2</b></root>", ParseOptions::default());
        let edited = tree.with_changed_text("<root><a>1</a><b>3</b></root>");
        assert_eq!(edited.get_root().to_full_string(), "<root><a>1</a><b>3</b></root>");
        assert_eq!(edited.reused_node_count(), 1);
        assert!(edited.diagnostics().is_empty());
    }

    #[test]
    fn test_with_changes_applies_edits() {
        let tree = SyntaxTree::parse_text("<a><b/></a>", ParseOptions::default());
        let change = TextChange::insert(TextSize::from(3), "<c/>");
        let edited = tree.with_changes(&[change]).unwrap();
        assert_eq!(edited.get_text().as_str(), "<a><c/><b/></a>");
        assert_eq!(edited.get_root().to_full_string(), "<a><c/><b/></a>");
    }

    #[test]
    fn test_with_changes_rejects_out_of_range() {
        let tree = SyntaxTree::parse_text("<a/>", ParseOptions::default());
        let change = TextChange::replace(2..40, "x");
        assert!(matches!(
            tree.with_changes(&[change]),
            Err(MarkupError::SpanOutOfRange { .. })
        ));
    }

    #[test]
    fn test_recoverable_root_is_recreated() {
        let source = "<a><b x=\"1\"/></a>";
        let tree = TreeParser::new().recoverable(true).parse(source).unwrap();
        assert!(tree.is_recoverable());
        assert!(tree.try_get_root().is_none());

        let root = tree.get_root();
        assert_eq!(root.to_full_string(), source);
        let again = tree.try_get_root().unwrap();
        assert!(SyntaxNode::ptr_eq(&root, &again));
    }

    #[test]
    fn test_cancelled_parse_returns_no_tree() {
        let token = CancellationToken::new();
        token.cancel();
        let result = TreeParser::new().cancellation(token).parse("<a><b/></a>");
        assert_eq!(result.unwrap_err(), MarkupError::Cancelled);
    }

    #[test]
    fn test_file_path_and_line_span() {
        let tree = TreeParser::new()
            .file_path("a.xml")
            .parse("<a>\n  <b/>\n</a>")
            .unwrap();
        assert_eq!(tree.file_path(), "a.xml");
        let moved = tree.with_file_path("b.xml");
        assert_eq!(moved.file_path(), "b.xml");
        assert_eq!(tree.file_path(), "a.xml");

        let span = tree.get_line_span(TextRange::new(6.into(), 10.into())).unwrap();
        assert_eq!(span.start.line, 1);
        assert_eq!(span.start.character, 2);
    }

    #[test]
    fn test_max_depth_from_builder() {
        let tree = TreeParser::new().max_depth(2).parse("<a><b><c/></b></a>").unwrap();
        let codes: Vec<_> = tree.diagnostics().iter().map(|d| d.code).collect();
        assert_eq!(codes, vec![ErrorCode::MaxDepthExceeded]);
        assert_eq!(tree.get_root().to_full_string(), "<a><b><c/></b></a>");
    }

    #[test]
    fn test_shared_cache_records_hits() {
        let cache = SharedNodeCache::new();
        let parser = TreeParser::new().shared_cache(cache.clone());
        parser.parse("<a><b/><b/></a>").unwrap();
        parser.parse("<a><b/><b/></a>").unwrap();
        assert!(cache.stats().hits > 0);
    }
}
