//! Interning of small green shapes
//!
//! Nodes with at most three slots are keyed by kind plus the identity of each
//! child. Children are kept alive by the cached parent, so an address in a key
//! cannot be reused while the entry exists. Trivia-free tokens and plain
//! trivia are keyed by content. Anything carrying diagnostics or annotations
//! is never interned.

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use super::{GreenElement, GreenNode, GreenToken, GreenTrivia, NodeFlags};
use crate::syntax_kind::SyntaxKind;

const MAX_CACHED_SLOTS: usize = 3;
const MAX_CACHED_TEXT: usize = 64;
const DEFAULT_SHARED_LIMIT: usize = 1 << 16;

/// Hit and miss counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct NodeKey {
    kind: SyntaxKind,
    len: u8,
    children: [usize; MAX_CACHED_SLOTS],
}

impl NodeKey {
    fn for_slots(kind: SyntaxKind, slots: &[Option<GreenElement>]) -> Option<NodeKey> {
        if slots.len() > MAX_CACHED_SLOTS {
            return None;
        }
        let mut children = [0; MAX_CACHED_SLOTS];
        for (index, slot) in slots.iter().enumerate() {
            if let Some(element) = slot {
                if element
                    .flags()
                    .intersects(NodeFlags::CONTAINS_DIAGNOSTICS | NodeFlags::CONTAINS_ANNOTATIONS)
                {
                    return None;
                }
                children[index] = element.identity();
            }
        }
        Some(NodeKey {
            kind,
            len: slots.len() as u8,
            children,
        })
    }
}

fn content_hash(kind: SyntaxKind, text: &str, value: Option<&str>) -> u64 {
    let mut hasher = DefaultHasher::new();
    kind.hash(&mut hasher);
    text.hash(&mut hasher);
    value.hash(&mut hasher);
    hasher.finish()
}

fn token_matches(token: &GreenToken, kind: SyntaxKind, text: &str, value: Option<&str>) -> bool {
    token.kind() == kind && token.text() == text && token.value_text() == value.unwrap_or(text)
}

fn trivia_matches(trivia: &GreenTrivia, kind: SyntaxKind, text: &str) -> bool {
    trivia.kind() == kind && trivia.text() == text
}

#[derive(Default)]
struct LocalTables {
    nodes: HashMap<NodeKey, GreenNode>,
    tokens: HashMap<u64, Vec<GreenToken>>,
    trivia: HashMap<u64, Vec<GreenTrivia>>,
}

struct SharedTables {
    nodes: DashMap<NodeKey, GreenNode>,
    tokens: DashMap<u64, Vec<GreenToken>>,
    trivia: DashMap<u64, Vec<GreenTrivia>>,
    limit: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Interning table shared by parses on any thread
///
/// Cloning shares the table. When a table grows past its entry limit it is
/// cleared; existing trees are unaffected because they own their nodes.
#[derive(Clone)]
pub struct SharedNodeCache {
    inner: Arc<SharedTables>,
}

impl Default for SharedNodeCache {
    fn default() -> Self {
        Self::with_limit(DEFAULT_SHARED_LIMIT)
    }
}

impl SharedNodeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache holding at most `limit` entries per table
    pub fn with_limit(limit: usize) -> Self {
        Self {
            inner: Arc::new(SharedTables {
                nodes: DashMap::new(),
                tokens: DashMap::new(),
                trivia: DashMap::new(),
                limit: limit.max(1),
                hits: AtomicU64::new(0),
                misses: AtomicU64::new(0),
            }),
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.inner.hits.load(Ordering::Relaxed),
            misses: self.inner.misses.load(Ordering::Relaxed),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.nodes.len() + self.inner.tokens.len() + self.inner.trivia.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.inner.nodes.clear();
        self.inner.tokens.clear();
        self.inner.trivia.clear();
    }

    fn record(&self, hit: bool) {
        let counter = if hit { &self.inner.hits } else { &self.inner.misses };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

enum Backing {
    Local(LocalTables),
    Shared(SharedNodeCache),
}

/// Interning front end used by one parse
pub struct NodeCache {
    backing: Backing,
    stats: CacheStats,
}

impl Default for NodeCache {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeCache {
    /// Cache private to its owner
    pub fn new() -> Self {
        Self {
            backing: Backing::Local(LocalTables::default()),
            stats: CacheStats::default(),
        }
    }

    /// Front end over a process-wide table
    pub fn shared(cache: SharedNodeCache) -> Self {
        Self {
            backing: Backing::Shared(cache),
            stats: CacheStats::default(),
        }
    }

    /// Counters for lookups made through this front end
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    fn record(&mut self, hit: bool) {
        if hit {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
        }
        if let Backing::Shared(shared) = &self.backing {
            shared.record(hit);
        }
    }

    /// Build a node, returning an existing equivalent one when possible
    pub fn node(&mut self, kind: SyntaxKind, slots: Vec<Option<GreenElement>>) -> GreenNode {
        let Some(key) = NodeKey::for_slots(kind, &slots) else {
            return GreenNode::new(kind, slots);
        };
        let cached = match &mut self.backing {
            Backing::Local(tables) => tables.nodes.get(&key).cloned(),
            Backing::Shared(shared) => shared.inner.nodes.get(&key).map(|entry| entry.value().clone()),
        };
        if let Some(node) = cached {
            self.record(true);
            return node;
        }
        self.record(false);
        let node = GreenNode::new(kind, slots);
        match &mut self.backing {
            Backing::Local(tables) => {
                tables.nodes.insert(key, node.clone());
            }
            Backing::Shared(shared) => {
                if shared.inner.nodes.len() >= shared.inner.limit {
                    shared.inner.nodes.clear();
                }
                shared.inner.nodes.insert(key, node.clone());
            }
        }
        node
    }

    /// Trivia-free token without diagnostics
    pub fn token(&mut self, kind: SyntaxKind, text: &str, value: Option<&str>) -> GreenToken {
        if text.len() > MAX_CACHED_TEXT {
            return GreenToken::create(kind, text, value, Vec::new(), Vec::new(), Vec::new());
        }
        let hash = content_hash(kind, text, value);
        let cached = match &mut self.backing {
            Backing::Local(tables) => tables.tokens.get(&hash).and_then(|bucket| {
                bucket
                    .iter()
                    .find(|token| token_matches(token, kind, text, value))
                    .cloned()
            }),
            Backing::Shared(shared) => shared.inner.tokens.get(&hash).and_then(|bucket| {
                bucket
                    .iter()
                    .find(|token| token_matches(token, kind, text, value))
                    .cloned()
            }),
        };
        if let Some(token) = cached {
            self.record(true);
            return token;
        }
        self.record(false);
        let token = GreenToken::create(kind, text, value, Vec::new(), Vec::new(), Vec::new());
        match &mut self.backing {
            Backing::Local(tables) => tables.tokens.entry(hash).or_default().push(token.clone()),
            Backing::Shared(shared) => {
                if shared.inner.tokens.len() >= shared.inner.limit {
                    shared.inner.tokens.clear();
                }
                shared.inner.tokens.entry(hash).or_default().push(token.clone());
            }
        }
        token
    }

    /// Plain (unstructured) trivia
    pub fn trivia(&mut self, kind: SyntaxKind, text: &str) -> GreenTrivia {
        if text.len() > MAX_CACHED_TEXT {
            return GreenTrivia::new(kind, text);
        }
        let hash = content_hash(kind, text, None);
        let cached = match &mut self.backing {
            Backing::Local(tables) => tables.trivia.get(&hash).and_then(|bucket| {
                bucket
                    .iter()
                    .find(|trivia| trivia_matches(trivia, kind, text))
                    .cloned()
            }),
            Backing::Shared(shared) => shared.inner.trivia.get(&hash).and_then(|bucket| {
                bucket
                    .iter()
                    .find(|trivia| trivia_matches(trivia, kind, text))
                    .cloned()
            }),
        };
        if let Some(trivia) = cached {
            self.record(true);
            return trivia;
        }
        self.record(false);
        let trivia = GreenTrivia::new(kind, text);
        match &mut self.backing {
            Backing::Local(tables) => tables.trivia.entry(hash).or_default().push(trivia.clone()),
            Backing::Shared(shared) => {
                if shared.inner.trivia.len() >= shared.inner.limit {
                    shared.inner.trivia.clear();
                }
                shared.inner.trivia.entry(hash).or_default().push(trivia.clone());
            }
        }
        trivia
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{DiagnosticInfo, ErrorCode};

    fn name_node(cache: &mut NodeCache, text: &str) -> GreenNode {
        let token = cache.token(SyntaxKind::NameToken, text, None);
        cache.node(SyntaxKind::Name, vec![None, Some(token.into())])
    }

    #[test]
    fn test_identical_shapes_are_shared() {
        let mut cache = NodeCache::new();
        let first = name_node(&mut cache, "item");
        let second = name_node(&mut cache, "item");
        let other = name_node(&mut cache, "other");
        assert!(GreenNode::ptr_eq(&first, &second));
        assert!(!GreenNode::ptr_eq(&first, &other));
        assert_eq!(cache.stats(), CacheStats { hits: 2, misses: 4 });
    }

    #[test]
    fn test_diagnostic_children_are_not_interned() {
        let mut cache = NodeCache::new();
        let missing = || {
            GreenToken::missing(
                SyntaxKind::NameToken,
                vec![DiagnosticInfo::at_start(ErrorCode::ExpectedName)],
            )
        };
        let first = cache.node(SyntaxKind::Name, vec![None, Some(missing().into())]);
        let second = cache.node(SyntaxKind::Name, vec![None, Some(missing().into())]);
        assert!(!GreenNode::ptr_eq(&first, &second));
        assert_eq!(cache.stats(), CacheStats::default());
    }

    #[test]
    fn test_large_nodes_are_not_interned() {
        let mut cache = NodeCache::new();
        let slots = || {
            (0..4)
                .map(|_| Some(GreenToken::new(SyntaxKind::TextToken, "x").into()))
                .collect::<Vec<_>>()
        };
        let first = cache.node(SyntaxKind::List, slots());
        let second = cache.node(SyntaxKind::List, slots());
        assert!(!GreenNode::ptr_eq(&first, &second));
    }

    #[test]
    fn test_shared_cache_across_threads() {
        let shared = SharedNodeCache::new();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let shared = shared.clone();
                std::thread::spawn(move || {
                    let mut cache = NodeCache::shared(shared);
                    cache.trivia(SyntaxKind::WhitespaceTrivia, " ")
                })
            })
            .collect();
        let trivia: Vec<GreenTrivia> = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect();
        // Racing first inserts may create more than one instance, later lookups hit
        let mut cache = NodeCache::shared(shared.clone());
        let again = cache.trivia(SyntaxKind::WhitespaceTrivia, " ");
        assert!(trivia.iter().any(|t| GreenTrivia::ptr_eq(t, &again)));
        assert_eq!(cache.stats().hits, 1);
        assert!(shared.stats().hits + shared.stats().misses >= 5);
    }

    #[test]
    fn test_shared_limit_clears_table() {
        let shared = SharedNodeCache::with_limit(2);
        let mut cache = NodeCache::shared(shared.clone());
        for text in ["a", "b", "c"] {
            cache.token(SyntaxKind::NameToken, text, None);
        }
        assert!(shared.inner.tokens.len() <= 2);
    }
}
