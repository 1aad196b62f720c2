//! Text changes and change ranges
//!
//! A [`TextChange`] carries replacement text and is used to build a new
//! [`SourceText`](super::SourceText). A [`TextChangeRange`] only records the
//! replaced span and the length of its replacement; it is what incremental
//! reparsing consumes.

use super::{TextRange, TextSize, text_size};

/// A text edit: replace `span` of the old text with `new_text`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChange {
    /// Range of the old text to replace
    pub span: TextRange,
    /// Replacement text
    pub new_text: String,
}

impl TextChange {
    pub fn new(span: TextRange, new_text: impl Into<String>) -> Self {
        Self {
            span,
            new_text: new_text.into(),
        }
    }

    /// Create a replacement edit from a byte range
    pub fn replace(range: std::ops::Range<usize>, new_text: impl Into<String>) -> Self {
        Self::new(
            TextRange::new(text_size(range.start), text_size(range.end)),
            new_text,
        )
    }

    /// Create an insertion edit
    pub fn insert(offset: TextSize, text: impl Into<String>) -> Self {
        Self::new(TextRange::empty(offset), text)
    }

    /// Create a deletion edit
    pub fn delete(span: TextRange) -> Self {
        Self::new(span, String::new())
    }

    pub fn is_insertion(&self) -> bool {
        self.span.is_empty() && !self.new_text.is_empty()
    }

    pub fn is_deletion(&self) -> bool {
        !self.span.is_empty() && self.new_text.is_empty()
    }

    /// Get the length change caused by this edit
    pub fn length_delta(&self) -> i64 {
        self.new_text.len() as i64 - i64::from(u32::from(self.span.len()))
    }

    /// The change range this edit produces
    pub fn change_range(&self) -> TextChangeRange {
        TextChangeRange::new(self.span, text_size(self.new_text.len()))
    }
}

/// The shape of a change: which old span was replaced, and by how much text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextChangeRange {
    /// Replaced range of the old text
    pub span: TextRange,
    /// Length of the replacement in the new text
    pub new_length: TextSize,
}

impl TextChangeRange {
    pub fn new(span: TextRange, new_length: TextSize) -> Self {
        Self { span, new_length }
    }

    /// Range covered by the replacement in the new text
    pub fn new_span(&self) -> TextRange {
        TextRange::at(self.span.start(), self.new_length)
    }

    pub fn length_delta(&self) -> i64 {
        i64::from(u32::from(self.new_length)) - i64::from(u32::from(self.span.len()))
    }

    /// Collapse several ordered, non-overlapping changes into one covering change
    pub fn collapse(changes: &[TextChangeRange]) -> Option<TextChangeRange> {
        let first = changes.first()?;
        let last = changes.last()?;
        let delta: i64 = changes.iter().map(TextChangeRange::length_delta).sum();
        let span = TextRange::new(first.span.start(), last.span.end());
        let new_length = i64::from(u32::from(span.len())) + delta;
        let new_length = u32::try_from(new_length).ok()?;
        Some(TextChangeRange::new(span, TextSize::from(new_length)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: u32, end: u32) -> TextRange {
        TextRange::new(start.into(), end.into())
    }

    #[test]
    fn test_edit_kinds() {
        let insert = TextChange::insert(3.into(), "abc");
        assert!(insert.is_insertion());
        assert_eq!(insert.length_delta(), 3);

        let delete = TextChange::delete(range(2, 6));
        assert!(delete.is_deletion());
        assert_eq!(delete.length_delta(), -4);

        let replace = TextChange::replace(1..3, "xyz");
        assert!(!replace.is_insertion() && !replace.is_deletion());
        assert_eq!(replace.change_range().new_span(), range(1, 4));
    }

    #[test]
    fn test_collapse_covers_all_changes() {
        let changes = [
            TextChangeRange::new(range(2, 4), 5.into()),
            TextChangeRange::new(range(10, 12), 0.into()),
        ];
        let collapsed = TextChangeRange::collapse(&changes).unwrap();
        assert_eq!(collapsed.span, range(2, 12));
        // 10 old bytes, +3 from the first change, -2 from the second
        assert_eq!(collapsed.new_length, TextSize::from(11));
        assert_eq!(TextChangeRange::collapse(&[]), None);
    }
}
