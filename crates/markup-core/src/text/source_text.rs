//! Immutable, shareable source text with a lazily built line map

use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use serde::Serialize;
use similar::{Algorithm, DiffTag, TextDiff};

use super::{TextChange, TextChangeRange, TextRange, TextSize, text_size};
use crate::error::MarkupError;
use crate::result::Result;

/// Middle sections larger than this are reported as one change without diffing.
const MAX_DIFF_BYTES: usize = 4 * 1024 * 1024;

/// Zero-based line and UTF-16 column
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct LinePosition {
    pub line: u32,
    pub character: u32,
}

/// Start and end positions of a span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct LineSpan {
    pub start: LinePosition,
    pub end: LinePosition,
}

/// Source text shared between syntax trees
///
/// Cloning is cheap. Two `SourceText`s are equal when their contents are;
/// [`SourceText::ptr_eq`] tests identity.
#[derive(Clone)]
pub struct SourceText {
    inner: Arc<Inner>,
}

struct Inner {
    text: Box<str>,
    line_starts: OnceLock<Box<[TextSize]>>,
}

impl SourceText {
    pub fn new(text: impl Into<String>) -> Self {
        let text: String = text.into();
        Self {
            inner: Arc::new(Inner {
                text: text.into_boxed_str(),
                line_starts: OnceLock::new(),
            }),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.inner.text
    }

    pub fn len(&self) -> TextSize {
        text_size(self.inner.text.len())
    }

    pub fn is_empty(&self) -> bool {
        self.inner.text.is_empty()
    }

    /// Identity comparison
    pub fn ptr_eq(a: &SourceText, b: &SourceText) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    /// Offsets at which each line starts; the first entry is always 0
    pub fn line_starts(&self) -> &[TextSize] {
        self.inner
            .line_starts
            .get_or_init(|| compute_line_starts(&self.inner.text))
    }

    pub fn line_count(&self) -> usize {
        self.line_starts().len()
    }

    /// Text of a range, validated against length and character boundaries
    pub fn slice(&self, range: TextRange) -> Result<&str> {
        self.check_range(range)?;
        Ok(&self.inner.text[usize::from(range.start())..usize::from(range.end())])
    }

    /// Line index containing `offset`
    pub fn line_index(&self, offset: TextSize) -> Result<usize> {
        self.check_offset(offset)?;
        let starts = self.line_starts();
        Ok(match starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        })
    }

    /// Map an offset to a line and UTF-16 column
    pub fn line_position(&self, offset: TextSize) -> Result<LinePosition> {
        let line = self.line_index(offset)?;
        let line_start = usize::from(self.line_starts()[line]);
        let prefix = &self.inner.text[line_start..usize::from(offset)];
        Ok(LinePosition {
            line: line as u32,
            character: prefix.encode_utf16().count() as u32,
        })
    }

    /// Map a span to start and end line positions
    pub fn line_span(&self, span: TextRange) -> Result<LineSpan> {
        self.check_range(span)?;
        Ok(LineSpan {
            start: self.line_position(span.start())?,
            end: self.line_position(span.end())?,
        })
    }

    /// Apply ordered, non-overlapping changes
    pub fn with_changes(&self, changes: &[TextChange]) -> Result<SourceText> {
        let mut result = String::with_capacity(self.inner.text.len());
        let mut copied = TextSize::from(0);
        for change in changes {
            self.check_range(change.span)?;
            if change.span.start() < copied {
                return Err(MarkupError::invalid_change(format!(
                    "change at {:?} overlaps or precedes an earlier change",
                    change.span
                )));
            }
            result.push_str(&self.inner.text[usize::from(copied)..usize::from(change.span.start())]);
            result.push_str(&change.new_text);
            copied = change.span.end();
        }
        result.push_str(&self.inner.text[usize::from(copied)..]);
        Ok(SourceText::new(result))
    }

    /// Compute the ranges of `old` that were replaced to produce `self`.
    ///
    /// Empty when the texts are identical. Common prefix and suffix are trimmed
    /// first; the remaining middle section is diffed by lines.
    pub fn change_ranges(&self, old: &SourceText) -> Vec<TextChangeRange> {
        if SourceText::ptr_eq(self, old) {
            return Vec::new();
        }
        let old_text = old.as_str();
        let new_text = self.as_str();
        if old_text == new_text {
            return Vec::new();
        }

        let prefix = common_prefix_len(old_text, new_text);
        let suffix = common_suffix_len(&old_text[prefix..], &new_text[prefix..]);
        let old_mid = &old_text[prefix..old_text.len() - suffix];
        let new_mid = &new_text[prefix..new_text.len() - suffix];

        let whole = TextChangeRange::new(
            TextRange::at(text_size(prefix), text_size(old_mid.len())),
            text_size(new_mid.len()),
        );
        if old_mid.is_empty() || new_mid.is_empty() || old_mid.len() + new_mid.len() > MAX_DIFF_BYTES
        {
            return vec![whole];
        }

        let ranges = diff_lines(old_mid, new_mid, prefix);
        if ranges.is_empty() { vec![whole] } else { ranges }
    }

    fn check_offset(&self, offset: TextSize) -> Result<()> {
        let len = self.len();
        if offset > len {
            return Err(MarkupError::SpanOutOfRange {
                start: offset.into(),
                end: offset.into(),
                len: len.into(),
            });
        }
        if !self.inner.text.is_char_boundary(usize::from(offset)) {
            return Err(MarkupError::NotCharBoundary {
                offset: offset.into(),
            });
        }
        Ok(())
    }

    fn check_range(&self, range: TextRange) -> Result<()> {
        if range.end() > self.len() {
            return Err(MarkupError::SpanOutOfRange {
                start: range.start().into(),
                end: range.end().into(),
                len: self.len().into(),
            });
        }
        self.check_offset(range.start())?;
        self.check_offset(range.end())
    }
}

fn compute_line_starts(text: &str) -> Box<[TextSize]> {
    let bytes = text.as_bytes();
    let mut starts = vec![TextSize::from(0)];
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\r' if bytes.get(i + 1) == Some(&b'\n') => {
                i += 2;
                starts.push(text_size(i));
            }
            b'\r' | b'\n' => {
                i += 1;
                starts.push(text_size(i));
            }
            _ => i += 1,
        }
    }
    starts.into_boxed_slice()
}

fn common_prefix_len(a: &str, b: &str) -> usize {
    let mut len = a
        .as_bytes()
        .iter()
        .zip(b.as_bytes())
        .take_while(|(x, y)| x == y)
        .count();
    while !a.is_char_boundary(len) {
        len -= 1;
    }
    len
}

fn common_suffix_len(a: &str, b: &str) -> usize {
    let mut len = a
        .as_bytes()
        .iter()
        .rev()
        .zip(b.as_bytes().iter().rev())
        .take_while(|(x, y)| x == y)
        .count();
    while !a.is_char_boundary(a.len() - len) {
        len -= 1;
    }
    len
}

/// Line diff of the middle section, merged into byte change ranges
fn diff_lines(old_mid: &str, new_mid: &str, base: usize) -> Vec<TextChangeRange> {
    let diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .timeout(Duration::from_millis(100))
        .diff_lines(old_mid, new_mid);

    let old_offsets = line_offsets(diff.old_slices());
    let new_offsets = line_offsets(diff.new_slices());

    let mut ranges: Vec<TextChangeRange> = Vec::new();
    for op in diff.ops() {
        if op.tag() == DiffTag::Equal {
            continue;
        }
        let old_range = op.old_range();
        let new_range = op.new_range();
        let old_start = base + old_offsets[old_range.start];
        let old_end = base + old_offsets[old_range.end];
        let new_len = new_offsets[new_range.end] - new_offsets[new_range.start];

        match ranges.last_mut() {
            Some(last) if usize::from(last.span.end()) == old_start => {
                last.span = TextRange::new(last.span.start(), text_size(old_end));
                last.new_length += text_size(new_len);
            }
            _ => ranges.push(TextChangeRange::new(
                TextRange::new(text_size(old_start), text_size(old_end)),
                text_size(new_len),
            )),
        }
    }
    ranges
}

/// Cumulative byte offsets: entry `i` is where line `i` starts, plus a final end entry
fn line_offsets(lines: &[&str]) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(lines.len() + 1);
    let mut acc = 0;
    offsets.push(0);
    for line in lines {
        acc += line.len();
        offsets.push(acc);
    }
    offsets
}

impl From<&str> for SourceText {
    fn from(text: &str) -> Self {
        SourceText::new(text)
    }
}

impl From<String> for SourceText {
    fn from(text: String) -> Self {
        SourceText::new(text)
    }
}

impl PartialEq for SourceText {
    fn eq(&self, other: &Self) -> bool {
        SourceText::ptr_eq(self, other) || self.as_str() == other.as_str()
    }
}

impl Eq for SourceText {}

impl fmt::Display for SourceText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for SourceText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceText")
            .field("len", &self.inner.text.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(old: &str, ranges: &[TextChangeRange], new: &str) -> String {
        // Rebuild the new text from the old one using only the change ranges
        let mut out = String::new();
        let mut old_pos = 0usize;
        let mut new_pos = 0usize;
        for change in ranges {
            let start = usize::from(change.span.start());
            out.push_str(&old[old_pos..start]);
            new_pos += start - old_pos;
            let new_len = usize::from(change.new_length);
            out.push_str(&new[new_pos..new_pos + new_len]);
            new_pos += new_len;
            old_pos = usize::from(change.span.end());
        }
        out.push_str(&old[old_pos..]);
        out
    }

    #[test]
    fn test_line_positions() {
        let text = SourceText::new("ab\r\ncd\nе€f\rg");
        assert_eq!(text.line_count(), 4);
        assert_eq!(
            text.line_position(TextSize::from(5)).unwrap(),
            LinePosition {
                line: 1,
                character: 1
            }
        );
        // 'е' is two bytes and '€' three, each one UTF-16 unit
        let f = text.as_str().find('f').unwrap();
        assert_eq!(
            text.line_position(text_size(f)).unwrap(),
            LinePosition {
                line: 2,
                character: 2
            }
        );
        assert_eq!(text.line_index(text.len()).unwrap(), 3);
    }

    #[test]
    fn test_out_of_range_and_boundaries() {
        let text = SourceText::new("a€b");
        assert!(matches!(
            text.line_position(TextSize::from(10)),
            Err(MarkupError::SpanOutOfRange { .. })
        ));
        assert!(matches!(
            text.slice(TextRange::new(0.into(), 2.into())),
            Err(MarkupError::NotCharBoundary { offset: 2 })
        ));
        assert_eq!(text.slice(TextRange::new(1.into(), 4.into())).unwrap(), "€");
    }

    #[test]
    fn test_with_changes() {
        let text = SourceText::new("<a>hello</a>");
        let changed = text
            .with_changes(&[
                TextChange::replace(1..2, "b"),
                TextChange::replace(10..11, "b"),
            ])
            .unwrap();
        assert_eq!(changed.as_str(), "<b>hello</b>");

        let overlapping = text.with_changes(&[
            TextChange::replace(1..5, "x"),
            TextChange::replace(3..4, "y"),
        ]);
        assert!(matches!(
            overlapping,
            Err(MarkupError::InvalidChange { .. })
        ));
    }

    #[test]
    fn test_change_ranges_identity_and_equal_content() {
        let text = SourceText::new("<a/>");
        assert!(text.change_ranges(&text.clone()).is_empty());
        assert!(text.change_ranges(&SourceText::new("<a/>")).is_empty());
    }

    #[test]
    fn test_change_ranges_single_edit() {
        let old = SourceText::new("<root><a>1</a><b>2</b></root>");
        let new = SourceText::new("<root><a>1</a><b>3</b></root>");
        let ranges = new.change_ranges(&old);
        assert_eq!(
            ranges,
            vec![TextChangeRange::new(
                TextRange::new(17.into(), 18.into()),
                1.into()
            )]
        );
    }

    #[test]
    fn test_change_ranges_rebuild_new_text() {
        let old = "<r>\n  <a>1</a>\n  <b>2</b>\n  <c>3</c>\n</r>\n";
        let new = "<r>\n  <a>one</a>\n  <b>2</b>\n  <c>three</c>\n  <d/>\n</r>\n";
        let ranges = SourceText::new(new).change_ranges(&SourceText::new(old));
        assert!(!ranges.is_empty());
        for pair in ranges.windows(2) {
            assert!(pair[0].span.end() <= pair[1].span.start());
        }
        assert_eq!(apply(old, &ranges, new), new);
    }

    #[test]
    fn test_change_ranges_pure_insertion() {
        let old = SourceText::new("<a></a>");
        let new = SourceText::new("<a>text</a>");
        assert_eq!(
            new.change_ranges(&old),
            vec![TextChangeRange::new(TextRange::empty(3.into()), 4.into())]
        );
    }
}
