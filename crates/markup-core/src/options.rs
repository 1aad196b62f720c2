//! Language options that influence how text is lexed and parsed

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Whether document-level comments become syntax nodes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentationMode {
    /// Comments outside the root element are parsed into `Comment` nodes
    #[default]
    Parse,
    /// Comments outside the root element are kept as comment trivia
    None,
}

/// Shape of document the parser accepts at the top level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// A complete document with a single root element
    #[default]
    Regular,
    /// A fragment: text and any number of elements at the top level
    Script,
}

/// Options carried by a syntax tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParseOptions {
    pub documentation_mode: DocumentationMode,
    pub source_kind: SourceKind,
    /// Free-form feature switches, kept for consumers
    pub features: BTreeMap<String, String>,
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_documentation_mode(mut self, mode: DocumentationMode) -> Self {
        self.documentation_mode = mode;
        self
    }

    pub fn with_source_kind(mut self, kind: SourceKind) -> Self {
        self.source_kind = kind;
        self
    }

    pub fn with_feature(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.features.insert(name.into(), value.into());
        self
    }

    pub fn feature(&self, name: &str) -> Option<&str> {
        self.features.get(name).map(String::as_str)
    }
}
