use std::fmt;

use crate::error::MarkupError;
use crate::result::Result;

/// Quote family of an open attribute value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuoteKind {
    Double,
    Single,
    /// Opened with a typographic double quote
    SmartDouble,
    /// Opened with a typographic single quote
    SmartSingle,
}

impl QuoteKind {
    pub(crate) fn from_char(c: char) -> Option<QuoteKind> {
        match c {
            '"' => Some(QuoteKind::Double),
            '\'' => Some(QuoteKind::Single),
            '\u{201C}' | '\u{201D}' | '\u{201E}' => Some(QuoteKind::SmartDouble),
            '\u{2018}' | '\u{2019}' => Some(QuoteKind::SmartSingle),
            _ => None,
        }
    }

    /// Whether `c` closes a value opened with this quote
    pub(crate) fn closes_with(self, c: char) -> bool {
        match self {
            QuoteKind::Double => c == '"',
            QuoteKind::Single => c == '\'',
            QuoteKind::SmartDouble => matches!(c, '"' | '\u{201C}' | '\u{201D}' | '\u{201E}'),
            QuoteKind::SmartSingle => matches!(c, '\'' | '\u{2018}' | '\u{2019}'),
        }
    }

    pub fn is_smart(self) -> bool {
        matches!(self, QuoteKind::SmartDouble | QuoteKind::SmartSingle)
    }

    fn to_bits(self) -> u32 {
        match self {
            QuoteKind::Double => 0,
            QuoteKind::Single => 1,
            QuoteKind::SmartDouble => 2,
            QuoteKind::SmartSingle => 3,
        }
    }

    fn from_bits(bits: u32) -> QuoteKind {
        match bits {
            1 => QuoteKind::Single,
            2 => QuoteKind::SmartDouble,
            3 => QuoteKind::SmartSingle,
            _ => QuoteKind::Double,
        }
    }
}

/// Coarse lexer mode; the lexer drives transitions itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LexMode {
    /// Document level, outside the root element
    Misc,
    /// Element content
    Content,
    /// Between `<` and `>`
    Tag,
    AttributeValue(QuoteKind),
    Comment,
    CData,
    ProcessingInstructionTarget,
    ProcessingInstructionBody,
}

impl LexMode {
    /// Whitespace and line breaks are trivia only in these modes
    pub fn admits_trivia(self) -> bool {
        matches!(self, LexMode::Misc | LexMode::Tag)
    }

    /// The kind of multi-line construct this mode is inside, if any
    pub fn multi_line_token(self) -> MultiLineToken {
        match self {
            LexMode::AttributeValue(_) => MultiLineToken::String,
            LexMode::Comment => MultiLineToken::Comment,
            LexMode::CData => MultiLineToken::CData,
            LexMode::ProcessingInstructionTarget | LexMode::ProcessingInstructionBody => {
                MultiLineToken::ProcessingInstruction
            }
            LexMode::Misc | LexMode::Content | LexMode::Tag => MultiLineToken::None,
        }
    }

    fn to_bits(self) -> u32 {
        match self {
            LexMode::Misc => 0,
            LexMode::Content => 1,
            LexMode::Tag => 2,
            LexMode::AttributeValue(_) => 3,
            LexMode::Comment => 4,
            LexMode::CData => 5,
            LexMode::ProcessingInstructionTarget => 6,
            LexMode::ProcessingInstructionBody => 7,
        }
    }
}

/// Construct left open at the end of a line scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MultiLineToken {
    None,
    String,
    Comment,
    CData,
    ProcessingInstruction,
}

impl MultiLineToken {
    fn to_bits(self) -> u32 {
        match self {
            MultiLineToken::None => 0,
            MultiLineToken::String => 1,
            MultiLineToken::Comment => 2,
            MultiLineToken::CData => 3,
            MultiLineToken::ProcessingInstruction => 4,
        }
    }
}

const MODE_MASK: u32 = 0b1111;
const QUOTE_SHIFT: u32 = 4;
const QUOTE_MASK: u32 = 0b111;
const OUTER_BIT: u32 = 1 << 7;
const MULTI_LINE_SHIFT: u32 = 8;
const MULTI_LINE_MASK: u32 = 0b111;
const VALID_BITS: u32 = 0x7FF;

/// Resumable lexer state
///
/// Packs the current mode, the quote of an open attribute value, the mode a
/// comment/CDATA/processing instruction returns to, and the multi-line
/// construct still open. Round-trips through `u32` so editors can store one
/// value per line.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScannerState {
    mode: LexMode,
    outer: LexMode,
}

impl Default for ScannerState {
    fn default() -> Self {
        Self::initial()
    }
}

impl ScannerState {
    /// State at the start of a document
    pub const fn initial() -> ScannerState {
        ScannerState {
            mode: LexMode::Misc,
            outer: LexMode::Misc,
        }
    }

    pub(crate) fn new(mode: LexMode, outer: LexMode) -> ScannerState {
        let outer = match outer {
            LexMode::Content => LexMode::Content,
            _ => LexMode::Misc,
        };
        ScannerState { mode, outer }
    }

    pub fn mode(&self) -> LexMode {
        self.mode
    }

    /// Mode restored once the open comment, CDATA section or processing
    /// instruction ends
    pub fn return_mode(&self) -> LexMode {
        self.outer
    }

    pub fn multi_line_token(&self) -> MultiLineToken {
        self.mode.multi_line_token()
    }

    pub fn is_inside_multi_line_token(&self) -> bool {
        self.multi_line_token() != MultiLineToken::None
    }

    pub fn into_raw(self) -> u32 {
        let quote = match self.mode {
            LexMode::AttributeValue(quote) => quote.to_bits(),
            _ => 0,
        };
        let outer = if self.outer == LexMode::Content {
            OUTER_BIT
        } else {
            0
        };
        self.mode.to_bits()
            | (quote << QUOTE_SHIFT)
            | outer
            | (self.multi_line_token().to_bits() << MULTI_LINE_SHIFT)
    }

    /// Decodes a value produced by [`ScannerState::into_raw`]
    pub fn from_raw(raw: u32) -> Result<ScannerState> {
        let invalid = || MarkupError::InvalidScannerState { raw };
        if raw & !VALID_BITS != 0 {
            return Err(invalid());
        }
        let quote_bits = (raw >> QUOTE_SHIFT) & QUOTE_MASK;
        if quote_bits > 3 {
            return Err(invalid());
        }
        let mode = match raw & MODE_MASK {
            0 => LexMode::Misc,
            1 => LexMode::Content,
            2 => LexMode::Tag,
            3 => LexMode::AttributeValue(QuoteKind::from_bits(quote_bits)),
            4 => LexMode::Comment,
            5 => LexMode::CData,
            6 => LexMode::ProcessingInstructionTarget,
            7 => LexMode::ProcessingInstructionBody,
            _ => return Err(invalid()),
        };
        if quote_bits != 0 && !matches!(mode, LexMode::AttributeValue(_)) {
            return Err(invalid());
        }
        let outer = if raw & OUTER_BIT != 0 {
            LexMode::Content
        } else {
            LexMode::Misc
        };
        let state = ScannerState { mode, outer };
        let multi_line = (raw >> MULTI_LINE_SHIFT) & MULTI_LINE_MASK;
        if multi_line != state.multi_line_token().to_bits() {
            return Err(invalid());
        }
        Ok(state)
    }
}

impl fmt::Debug for ScannerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScannerState")
            .field("mode", &self.mode)
            .field("return_mode", &self.outer)
            .field("multi_line_token", &self.multi_line_token())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_zero() {
        assert_eq!(ScannerState::initial().into_raw(), 0);
        assert_eq!(ScannerState::from_raw(0).unwrap(), ScannerState::initial());
    }

    #[test]
    fn test_raw_round_trip() {
        let states = [
            ScannerState::new(LexMode::Tag, LexMode::Content),
            ScannerState::new(LexMode::AttributeValue(QuoteKind::SmartSingle), LexMode::Misc),
            ScannerState::new(LexMode::Comment, LexMode::Content),
            ScannerState::new(LexMode::ProcessingInstructionBody, LexMode::Misc),
        ];
        for state in states {
            assert_eq!(ScannerState::from_raw(state.into_raw()).unwrap(), state);
        }
    }

    #[test]
    fn test_multi_line_token_tracks_mode() {
        let state = ScannerState::new(LexMode::CData, LexMode::Content);
        assert_eq!(state.multi_line_token(), MultiLineToken::CData);
        assert!(state.is_inside_multi_line_token());
        assert!(!ScannerState::new(LexMode::Tag, LexMode::Misc).is_inside_multi_line_token());
    }

    #[test]
    fn test_from_raw_rejects_invalid_encodings() {
        // mode 9 does not exist
        assert!(ScannerState::from_raw(9).is_err());
        // high bits set
        assert!(ScannerState::from_raw(1 << 20).is_err());
        // quote bits outside attribute values
        assert!(ScannerState::from_raw(2 | (1 << QUOTE_SHIFT)).is_err());
        // comment mode without the matching multi-line marker
        assert!(matches!(
            ScannerState::from_raw(4),
            Err(MarkupError::InvalidScannerState { raw: 4 })
        ));
    }

    #[test]
    fn test_smart_quotes_close_on_either_family_member() {
        assert!(QuoteKind::SmartDouble.closes_with('"'));
        assert!(QuoteKind::SmartDouble.closes_with('\u{201D}'));
        assert!(!QuoteKind::Double.closes_with('\u{201D}'));
        assert_eq!(QuoteKind::from_char('\u{2019}'), Some(QuoteKind::SmartSingle));
    }
}
