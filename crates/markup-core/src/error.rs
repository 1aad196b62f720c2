//! Error types for misuse of the parsing API.
//!
//! Malformed markup never produces a `MarkupError`; it produces diagnostics
//! attached to the syntax tree. These variants cover invalid arguments and
//! cancelled parses only.

use thiserror::Error;

/// Main error type for markup parsing operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MarkupError {
    /// The parse observed a cancellation request between grammar productions
    #[error("Parse was cancelled")]
    Cancelled,

    /// A span argument lies outside the text it refers to
    #[error("Span {start}..{end} is out of range for text of length {len}")]
    SpanOutOfRange { start: u32, end: u32, len: u32 },

    /// A span argument does not fall on a character boundary
    #[error("Offset {offset} is not on a character boundary")]
    NotCharBoundary { offset: u32 },

    /// Text changes overlap or are not sorted by start offset
    #[error("Invalid text change: {message}")]
    InvalidChange { message: String },

    /// A raw integer that does not encode any lexer state
    #[error("Invalid scanner state: {raw:#x}")]
    InvalidScannerState { raw: u32 },
}

impl MarkupError {
    pub fn invalid_change(message: impl Into<String>) -> Self {
        Self::InvalidChange {
            message: message.into(),
        }
    }

    /// Returns true when the caller can retry the same operation
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = MarkupError::SpanOutOfRange {
            start: 4,
            end: 12,
            len: 8,
        };
        assert_eq!(
            err.to_string(),
            "Span 4..12 is out of range for text of length 8"
        );
        assert_eq!(
            MarkupError::InvalidScannerState { raw: 0xff00 }.to_string(),
            "Invalid scanner state: 0xff00"
        );
    }

    #[test]
    fn test_cancellation_flag() {
        assert!(MarkupError::Cancelled.is_cancellation());
        assert!(!MarkupError::invalid_change("overlap").is_cancellation());
    }
}
