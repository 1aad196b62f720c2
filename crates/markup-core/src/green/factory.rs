use super::{CacheStats, GreenElement, GreenNode, GreenToken, GreenTrivia, NodeCache};
use crate::NodeOrToken;
use crate::diagnostics::DiagnosticInfo;
use crate::syntax_kind::SyntaxKind;

/// Constructs green elements, interning them through a [`NodeCache`]
pub struct SyntaxFactory {
    cache: NodeCache,
}

impl Default for SyntaxFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntaxFactory {
    pub fn new() -> Self {
        Self::with_cache(NodeCache::new())
    }

    pub fn with_cache(cache: NodeCache) -> Self {
        Self { cache }
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Token with optional trivia and diagnostics; bare tokens are interned
    pub fn token(
        &mut self,
        kind: SyntaxKind,
        text: &str,
        value: Option<&str>,
        leading: Vec<GreenTrivia>,
        trailing: Vec<GreenTrivia>,
        diagnostics: Vec<DiagnosticInfo>,
    ) -> GreenToken {
        if leading.is_empty() && trailing.is_empty() && diagnostics.is_empty() {
            self.cache.token(kind, text, value)
        } else {
            GreenToken::create(kind, text, value, leading, trailing, diagnostics)
        }
    }

    /// Punctuation token with its fixed text and no trivia
    pub fn punctuation(&mut self, kind: SyntaxKind) -> GreenToken {
        let text = kind.token_text().unwrap_or_default();
        self.cache.token(kind, text, None)
    }

    pub fn trivia(&mut self, kind: SyntaxKind, text: &str) -> GreenTrivia {
        self.cache.trivia(kind, text)
    }

    /// Zero-width token standing in for an absent one
    pub fn missing_token(&mut self, kind: SyntaxKind, diagnostic: Option<DiagnosticInfo>) -> GreenToken {
        GreenToken::missing(kind, diagnostic.into_iter().collect())
    }

    pub fn node(&mut self, kind: SyntaxKind, slots: Vec<Option<GreenElement>>) -> GreenNode {
        self.cache.node(kind, slots)
    }

    /// Node carrying its own diagnostics, never interned
    pub fn node_with_diagnostics(
        &mut self,
        kind: SyntaxKind,
        slots: Vec<Option<GreenElement>>,
        diagnostics: Vec<DiagnosticInfo>,
    ) -> GreenNode {
        if diagnostics.is_empty() {
            self.node(kind, slots)
        } else {
            GreenNode::new(kind, slots).with_diagnostics(diagnostics)
        }
    }

    /// List node over `items`, or an empty slot when there are none.
    ///
    /// Drains `items` so pooled buffers keep their capacity.
    pub fn list(&mut self, items: &mut Vec<GreenElement>) -> Option<GreenElement> {
        if items.is_empty() {
            return None;
        }
        let slots = items.drain(..).map(Some).collect();
        Some(NodeOrToken::Node(self.node(SyntaxKind::List, slots)))
    }

    /// Skipped-token trivia wrapping `tokens`
    pub fn skipped_tokens_trivia(&mut self, tokens: &mut Vec<GreenElement>) -> GreenTrivia {
        let slots: Vec<_> = tokens.drain(..).map(Some).collect();
        let structure = GreenNode::new(SyntaxKind::SkippedTokens, slots);
        GreenTrivia::structured(SyntaxKind::SkippedTokensTrivia, structure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::ErrorCode;
    use crate::text::TextSize;

    #[test]
    fn test_empty_list_is_empty_slot() {
        let mut factory = SyntaxFactory::new();
        let mut items = Vec::new();
        assert!(factory.list(&mut items).is_none());

        items.push(factory.punctuation(SyntaxKind::GreaterThanToken).into());
        let list = factory.list(&mut items).unwrap();
        assert_eq!(list.kind(), SyntaxKind::List);
        assert!(items.is_empty());
    }

    #[test]
    fn test_missing_token_is_zero_width() {
        let mut factory = SyntaxFactory::new();
        let token = factory.missing_token(
            SyntaxKind::EqualsToken,
            Some(DiagnosticInfo::at_start(ErrorCode::ExpectedToken).with_args(["="])),
        );
        assert!(token.is_missing());
        assert_eq!(token.full_width(), TextSize::from(0));
        assert_eq!(token.diagnostics().len(), 1);
    }

    #[test]
    fn test_punctuation_is_interned() {
        let mut factory = SyntaxFactory::new();
        let a = factory.punctuation(SyntaxKind::LessThanToken);
        let b = factory.punctuation(SyntaxKind::LessThanToken);
        assert!(GreenToken::ptr_eq(&a, &b));
        assert_eq!(a.text(), "<");
    }
}
