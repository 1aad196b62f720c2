//! Syntax kind enumeration for the markup syntax tree
//!
//! Every green and red element carries one of these kinds. The numeric
//! ranges group kinds by category so that classification is a range check.

use std::fmt;

/// Syntax kind for markup language elements
///
/// This enum covers:
/// - Trivia (whitespace, end of line, comments, skipped tokens)
/// - Punctuation tokens (`<`, `</`, `>`, `/>`, `=`, quotes, ...)
/// - Text-carrying tokens (names, text literals, comment text, ...)
/// - Structural nodes (elements, tags, attributes, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum SyntaxKind {
    // ==================
    // Trivia (0-9)
    // ==================
    /// Spaces and tabs
    WhitespaceTrivia = 0,
    /// `\n`, `\r\n` or `\r`
    EndOfLineTrivia = 1,
    /// `<!-- ... -->` kept as trivia when documentation comments are not parsed
    CommentTrivia = 2,
    /// Tokens the parser could not place, wrapped in a `SkippedTokens` structure
    SkippedTokensTrivia = 3,

    // ==================
    // Punctuation (10-49)
    // ==================
    /// `<`
    LessThanToken = 10,
    /// `</`
    LessThanSlashToken = 11,
    /// `>`
    GreaterThanToken = 12,
    /// `/>`
    SlashGreaterThanToken = 13,
    /// `=`
    EqualsToken = 14,
    /// `:`
    ColonToken = 15,
    /// `"` (or a double smart quote look-alike)
    DoubleQuoteToken = 16,
    /// `'` (or a single smart quote look-alike)
    SingleQuoteToken = 17,
    /// `<!--`
    CommentStartToken = 18,
    /// `-->`
    CommentEndToken = 19,
    /// `<![CDATA[`
    CDataStartToken = 20,
    /// `]]>`
    CDataEndToken = 21,
    /// `<?`
    ProcessingInstructionStartToken = 22,
    /// `?>`
    ProcessingInstructionEndToken = 23,

    // ==================
    // Text tokens (50-69)
    // ==================
    /// Element, attribute or prefix name
    NameToken = 50,
    /// Element content or attribute value text, entity-decoded value
    TextToken = 51,
    /// Body of a comment
    CommentTextToken = 52,
    /// Body of a CDATA section
    CDataTextToken = 53,
    /// Body of a processing instruction
    ProcessingInstructionTextToken = 54,
    /// Unrecognized input inside a tag
    BadToken = 55,
    /// Zero-width end of input, owns trailing document trivia
    EndOfFileToken = 56,

    // ==================
    // Nodes (100-199)
    // ==================
    /// Document root
    Body = 100,
    /// Variable-arity child list
    List = 101,
    /// `<name ...>content</name>`
    Element = 102,
    /// `<name ...>`
    StartTag = 103,
    /// `</name>`
    EndTag = 104,
    /// `<name .../>`
    EmptyElement = 105,
    /// Optional prefix and local name
    Name = 106,
    /// `prefix:`
    Prefix = 107,
    /// `name="value"`
    Attribute = 108,
    /// Quoted attribute value
    AttributeValue = 109,
    /// Character data inside an element
    Text = 110,
    /// `<!-- ... -->` as a node
    Comment = 111,
    /// `<![CDATA[ ... ]]>`
    CData = 112,
    /// `<?target ... ?>`
    ProcessingInstruction = 113,
    /// Structure of skipped-token trivia
    SkippedTokens = 114,
}

impl SyntaxKind {
    /// All kinds, in declaration order
    pub const ALL: &'static [SyntaxKind] = &[
        Self::WhitespaceTrivia,
        Self::EndOfLineTrivia,
        Self::CommentTrivia,
        Self::SkippedTokensTrivia,
        Self::LessThanToken,
        Self::LessThanSlashToken,
        Self::GreaterThanToken,
        Self::SlashGreaterThanToken,
        Self::EqualsToken,
        Self::ColonToken,
        Self::DoubleQuoteToken,
        Self::SingleQuoteToken,
        Self::CommentStartToken,
        Self::CommentEndToken,
        Self::CDataStartToken,
        Self::CDataEndToken,
        Self::ProcessingInstructionStartToken,
        Self::ProcessingInstructionEndToken,
        Self::NameToken,
        Self::TextToken,
        Self::CommentTextToken,
        Self::CDataTextToken,
        Self::ProcessingInstructionTextToken,
        Self::BadToken,
        Self::EndOfFileToken,
        Self::Body,
        Self::List,
        Self::Element,
        Self::StartTag,
        Self::EndTag,
        Self::EmptyElement,
        Self::Name,
        Self::Prefix,
        Self::Attribute,
        Self::AttributeValue,
        Self::Text,
        Self::Comment,
        Self::CData,
        Self::ProcessingInstruction,
        Self::SkippedTokens,
    ];

    /// Check if this is a trivia kind
    pub const fn is_trivia(self) -> bool {
        (self as u16) < 10
    }

    /// Check if this is a token kind (punctuation or text)
    pub const fn is_token(self) -> bool {
        (self as u16) >= 10 && (self as u16) < 100
    }

    /// Check if this is punctuation with fixed text
    pub const fn is_punct(self) -> bool {
        (self as u16) >= 10 && (self as u16) < 50
    }

    /// Check if this is a structural node
    pub const fn is_node(self) -> bool {
        (self as u16) >= 100
    }

    pub const fn is_list(self) -> bool {
        matches!(self, Self::List)
    }

    /// Element-like nodes, the unit of incremental reuse
    pub const fn is_element(self) -> bool {
        matches!(self, Self::Element | Self::EmptyElement)
    }

    pub const fn is_quote(self) -> bool {
        matches!(self, Self::DoubleQuoteToken | Self::SingleQuoteToken)
    }

    /// Get the fixed text of punctuation tokens
    ///
    /// Quote kinds report their ASCII spelling even though the lexer also
    /// produces them for smart-quote look-alikes.
    pub const fn token_text(self) -> Option<&'static str> {
        match self {
            Self::LessThanToken => Some("<"),
            Self::LessThanSlashToken => Some("</"),
            Self::GreaterThanToken => Some(">"),
            Self::SlashGreaterThanToken => Some("/>"),
            Self::EqualsToken => Some("="),
            Self::ColonToken => Some(":"),
            Self::DoubleQuoteToken => Some("\""),
            Self::SingleQuoteToken => Some("'"),
            Self::CommentStartToken => Some("<!--"),
            Self::CommentEndToken => Some("-->"),
            Self::CDataStartToken => Some("<![CDATA["),
            Self::CDataEndToken => Some("]]>"),
            Self::ProcessingInstructionStartToken => Some("<?"),
            Self::ProcessingInstructionEndToken => Some("?>"),
            _ => None,
        }
    }

    /// Convert a raw discriminant back into a kind
    pub fn from_raw(raw: u16) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| *kind as u16 == raw)
    }
}

impl From<SyntaxKind> for u16 {
    fn from(kind: SyntaxKind) -> u16 {
        kind as u16
    }
}

impl fmt::Display for SyntaxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.token_text() {
            Some(text) => write!(f, "'{text}'"),
            None => write!(f, "{self:?}"),
        }
    }
}
