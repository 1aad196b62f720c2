use crate::text::{TextRange, TextSize};

use super::{ErrorCode, Severity};

/// A diagnostic stored on a green element
///
/// `offset` is relative to the full start (leading trivia included) of the
/// element that owns the entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DiagnosticInfo {
    code: ErrorCode,
    args: Box<[Box<str>]>,
    offset: TextSize,
    width: TextSize,
}

impl DiagnosticInfo {
    pub fn new(code: ErrorCode, offset: TextSize, width: TextSize) -> Self {
        Self {
            code,
            args: Box::default(),
            offset,
            width,
        }
    }

    /// Zero-width entry at the element's full start
    pub fn at_start(code: ErrorCode) -> Self {
        Self::new(code, TextSize::from(0), TextSize::from(0))
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Box<str>>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn args(&self) -> &[Box<str>] {
        &self.args
    }

    pub fn offset(&self) -> TextSize {
        self.offset
    }

    pub fn width(&self) -> TextSize {
        self.width
    }

    pub fn severity(&self) -> Severity {
        self.code.default_severity()
    }

    /// Range relative to the owning element
    pub fn relative_range(&self) -> TextRange {
        TextRange::at(self.offset, self.width)
    }

    /// Same entry with its offset moved by `delta`, used when trivia is
    /// prepended to the owning element
    pub(crate) fn shifted(&self, delta: TextSize) -> Self {
        Self {
            offset: self.offset + delta,
            ..self.clone()
        }
    }
}
