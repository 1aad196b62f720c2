use std::fmt;
use std::sync::Arc;

use super::trivia::trivia_width;
use super::{GreenTrivia, NodeFlags, SyntaxAnnotation};
use crate::diagnostics::DiagnosticInfo;
use crate::syntax_kind::SyntaxKind;
use crate::text::{TextSize, text_size};

/// A terminal with its raw text, decoded value and trivia
#[derive(Clone, PartialEq, Eq)]
pub struct GreenToken(Arc<TokenData>);

#[derive(PartialEq, Eq)]
struct TokenData {
    kind: SyntaxKind,
    flags: NodeFlags,
    text: Box<str>,
    value: Option<Box<str>>,
    leading: Box<[GreenTrivia]>,
    trailing: Box<[GreenTrivia]>,
    full_width: TextSize,
    diagnostics: Option<Arc<[DiagnosticInfo]>>,
    annotations: Option<Arc<[SyntaxAnnotation]>>,
}

impl GreenToken {
    /// Token without trivia or decoded value
    pub fn new(kind: SyntaxKind, text: &str) -> Self {
        Self::create(kind, text, None, Vec::new(), Vec::new(), Vec::new())
    }

    /// General constructor
    ///
    /// `value` is only stored when it differs from `text`. Diagnostic offsets
    /// are relative to the token's full start.
    pub fn create(
        kind: SyntaxKind,
        text: &str,
        value: Option<&str>,
        leading: Vec<GreenTrivia>,
        trailing: Vec<GreenTrivia>,
        diagnostics: Vec<DiagnosticInfo>,
    ) -> Self {
        Self::build(kind, text, value, leading, trailing, diagnostics, false)
    }

    /// Zero-width synthesized token
    pub fn missing(kind: SyntaxKind, diagnostics: Vec<DiagnosticInfo>) -> Self {
        Self::build(kind, "", None, Vec::new(), Vec::new(), diagnostics, true)
    }

    /// Synthesized token whose leading trivia holds the text it replaces
    pub fn missing_with_leading(
        kind: SyntaxKind,
        leading: Vec<GreenTrivia>,
        diagnostics: Vec<DiagnosticInfo>,
    ) -> Self {
        Self::build(kind, "", None, leading, Vec::new(), diagnostics, true)
    }

    fn build(
        kind: SyntaxKind,
        text: &str,
        value: Option<&str>,
        leading: Vec<GreenTrivia>,
        trailing: Vec<GreenTrivia>,
        diagnostics: Vec<DiagnosticInfo>,
        missing: bool,
    ) -> Self {
        debug_assert!(kind.is_token(), "{kind:?} is not a token kind");
        let mut flags = NodeFlags::NONE;
        if missing {
            flags |= NodeFlags::IS_MISSING;
        }
        if !diagnostics.is_empty() {
            flags |= NodeFlags::CONTAINS_DIAGNOSTICS;
        }
        for trivia in leading.iter().chain(trailing.iter()) {
            flags |= trivia.flags();
        }
        let full_width = trivia_width(&leading) + text_size(text.len()) + trivia_width(&trailing);
        Self(Arc::new(TokenData {
            kind,
            flags,
            text: text.into(),
            value: value.filter(|value| *value != text).map(Into::into),
            leading: leading.into_boxed_slice(),
            trailing: trailing.into_boxed_slice(),
            full_width,
            diagnostics: (!diagnostics.is_empty()).then(|| Arc::from(diagnostics)),
            annotations: None,
        }))
    }

    pub fn kind(&self) -> SyntaxKind {
        self.0.kind
    }

    /// Raw source text, without trivia
    pub fn text(&self) -> &str {
        &self.0.text
    }

    /// Decoded value (entities resolved); the raw text when nothing was decoded
    pub fn value_text(&self) -> &str {
        self.0.value.as_deref().unwrap_or(&self.0.text)
    }

    pub fn leading_trivia(&self) -> &[GreenTrivia] {
        &self.0.leading
    }

    pub fn trailing_trivia(&self) -> &[GreenTrivia] {
        &self.0.trailing
    }

    pub fn leading_trivia_width(&self) -> TextSize {
        trivia_width(&self.0.leading)
    }

    pub fn trailing_trivia_width(&self) -> TextSize {
        trivia_width(&self.0.trailing)
    }

    /// Width of the text alone
    pub fn width(&self) -> TextSize {
        text_size(self.0.text.len())
    }

    pub fn full_width(&self) -> TextSize {
        self.0.full_width
    }

    pub fn flags(&self) -> NodeFlags {
        self.0.flags
    }

    pub fn is_missing(&self) -> bool {
        self.0.flags.contains(NodeFlags::IS_MISSING)
    }

    /// Diagnostics stored on this token (not those inside structured trivia)
    pub fn diagnostics(&self) -> &[DiagnosticInfo] {
        self.0.diagnostics.as_deref().unwrap_or(&[])
    }

    pub fn annotations(&self) -> &[SyntaxAnnotation] {
        self.0.annotations.as_deref().unwrap_or(&[])
    }

    pub fn contains_diagnostics(&self) -> bool {
        self.0.flags.contains(NodeFlags::CONTAINS_DIAGNOSTICS)
    }

    pub fn ptr_eq(a: &GreenToken, b: &GreenToken) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    pub(crate) fn identity(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    /// Copy of this token with `trivia` inserted in front of its leading trivia
    pub fn with_prepended_trivia(&self, trivia: Vec<GreenTrivia>) -> GreenToken {
        if trivia.is_empty() {
            return self.clone();
        }
        let shift = trivia_width(&trivia);
        let mut leading = trivia;
        leading.extend(self.0.leading.iter().cloned());
        let diagnostics = self
            .diagnostics()
            .iter()
            .map(|diagnostic| diagnostic.shifted(shift))
            .collect();
        let mut token = Self::build(
            self.0.kind,
            &self.0.text,
            self.0.value.as_deref(),
            leading,
            self.0.trailing.to_vec(),
            diagnostics,
            self.is_missing(),
        );
        if let Some(annotations) = &self.0.annotations {
            token = token.with_annotations(annotations.to_vec());
        }
        token
    }

    /// Copy of this token with `trivia` appended to its trailing trivia
    pub fn with_appended_trivia(&self, trivia: Vec<GreenTrivia>) -> GreenToken {
        if trivia.is_empty() {
            return self.clone();
        }
        let mut trailing = self.0.trailing.to_vec();
        trailing.extend(trivia);
        let mut token = Self::build(
            self.0.kind,
            &self.0.text,
            self.0.value.as_deref(),
            self.0.leading.to_vec(),
            trailing,
            self.diagnostics().to_vec(),
            self.is_missing(),
        );
        if let Some(annotations) = &self.0.annotations {
            token = token.with_annotations(annotations.to_vec());
        }
        token
    }

    /// Copy of this token with additional diagnostics
    pub fn with_diagnostics(&self, extra: Vec<DiagnosticInfo>) -> GreenToken {
        if extra.is_empty() {
            return self.clone();
        }
        let mut diagnostics = self.diagnostics().to_vec();
        diagnostics.extend(extra);
        let mut token = Self::build(
            self.0.kind,
            &self.0.text,
            self.0.value.as_deref(),
            self.0.leading.to_vec(),
            self.0.trailing.to_vec(),
            diagnostics,
            self.is_missing(),
        );
        if let Some(annotations) = &self.0.annotations {
            token = token.with_annotations(annotations.to_vec());
        }
        token
    }

    /// Copy of this token carrying `annotations` instead of its current ones
    pub fn with_annotations(&self, annotations: Vec<SyntaxAnnotation>) -> GreenToken {
        let mut flags = self.0.flags.without(NodeFlags::CONTAINS_ANNOTATIONS);
        for trivia in self.0.leading.iter().chain(self.0.trailing.iter()) {
            flags |= trivia.flags();
        }
        if !annotations.is_empty() {
            flags |= NodeFlags::CONTAINS_ANNOTATIONS;
        }
        GreenToken(Arc::new(TokenData {
            kind: self.0.kind,
            flags,
            text: self.0.text.clone(),
            value: self.0.value.clone(),
            leading: self.0.leading.clone(),
            trailing: self.0.trailing.clone(),
            full_width: self.0.full_width,
            diagnostics: self.0.diagnostics.clone(),
            annotations: (!annotations.is_empty()).then(|| Arc::from(annotations)),
        }))
    }

    pub(crate) fn write_to(&self, out: &mut String) {
        for trivia in self.0.leading.iter() {
            trivia.write_to(out);
        }
        out.push_str(&self.0.text);
        for trivia in self.0.trailing.iter() {
            trivia.write_to(out);
        }
    }

    /// Text including trivia
    pub fn to_full_string(&self) -> String {
        let mut out = String::with_capacity(usize::from(self.0.full_width));
        self.write_to(&mut out);
        out
    }
}

impl fmt::Debug for GreenToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{:?}", self.0.kind, self.0.text)?;
        if self.is_missing() {
            f.write_str(" (missing)")?;
        }
        Ok(())
    }
}
