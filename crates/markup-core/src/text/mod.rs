//! Source text, line mapping and text changes.

mod change;
mod source_text;

pub use biome_text_size::{TextRange, TextSize};
pub use change::{TextChange, TextChangeRange};
pub use source_text::{LinePosition, LineSpan, SourceText};

/// Convert a byte length into a `TextSize`.
///
/// Texts are limited to `u32::MAX` bytes; larger lengths saturate.
#[inline]
pub(crate) fn text_size(len: usize) -> TextSize {
    TextSize::from(u32::try_from(len).unwrap_or(u32::MAX))
}
