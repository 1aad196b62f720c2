//! Error codes, severities and default message templates

use std::fmt;

use serde::{Serialize, Serializer};

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

/// Every condition the lexer or parser can report
///
/// `ML1xxx` codes are lexical, `ML2xxx` codes are syntactic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorCode {
    // Lexical
    UnterminatedAttributeValue,
    UnterminatedComment,
    UnterminatedCData,
    UnterminatedProcessingInstruction,
    IllegalCharacter,
    BadDecimalDigit,
    BadHexDigit,
    EntityValueOverflow,
    InvalidUnicodeValue,
    UnknownEntity,
    MissingEntitySemicolon,
    DoubleHyphenInComment,

    // Syntactic
    UnexpectedToken,
    ExpectedName,
    ExpectedQuote,
    ExpectedWhitespace,
    ExpectedToken,
    EndTagMismatch,
    UnmatchedEndTag,
    MissingEndTag,
    DuplicateAttribute,
    MaxDepthExceeded,
    EmptyDocument,
    MultipleRootElements,
    TextOutsideRoot,
    SmartQuote,
}

impl ErrorCode {
    /// Stable identifier, e.g. `ML2006`
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UnterminatedAttributeValue => "ML1001",
            Self::UnterminatedComment => "ML1002",
            Self::UnterminatedCData => "ML1003",
            Self::UnterminatedProcessingInstruction => "ML1004",
            Self::IllegalCharacter => "ML1005",
            Self::BadDecimalDigit => "ML1006",
            Self::BadHexDigit => "ML1007",
            Self::EntityValueOverflow => "ML1008",
            Self::InvalidUnicodeValue => "ML1009",
            Self::UnknownEntity => "ML1010",
            Self::MissingEntitySemicolon => "ML1011",
            Self::DoubleHyphenInComment => "ML1012",
            Self::UnexpectedToken => "ML2001",
            Self::ExpectedName => "ML2002",
            Self::ExpectedQuote => "ML2003",
            Self::ExpectedWhitespace => "ML2004",
            Self::ExpectedToken => "ML2005",
            Self::EndTagMismatch => "ML2006",
            Self::UnmatchedEndTag => "ML2007",
            Self::MissingEndTag => "ML2008",
            Self::DuplicateAttribute => "ML2009",
            Self::MaxDepthExceeded => "ML2010",
            Self::EmptyDocument => "ML2011",
            Self::MultipleRootElements => "ML2012",
            Self::TextOutsideRoot => "ML2013",
            Self::SmartQuote => "ML2014",
        }
    }

    pub const fn is_lexical(self) -> bool {
        matches!(
            self,
            Self::UnterminatedAttributeValue
                | Self::UnterminatedComment
                | Self::UnterminatedCData
                | Self::UnterminatedProcessingInstruction
                | Self::IllegalCharacter
                | Self::BadDecimalDigit
                | Self::BadHexDigit
                | Self::EntityValueOverflow
                | Self::InvalidUnicodeValue
                | Self::UnknownEntity
                | Self::MissingEntitySemicolon
                | Self::DoubleHyphenInComment
        )
    }

    pub const fn default_severity(self) -> Severity {
        match self {
            Self::DoubleHyphenInComment => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// English message template; `{0}`, `{1}` are replaced by arguments
    pub const fn template(self) -> &'static str {
        match self {
            Self::UnterminatedAttributeValue => "Attribute value is not terminated",
            Self::UnterminatedComment => "Comment is not terminated, expected '-->'",
            Self::UnterminatedCData => "CDATA section is not terminated, expected ']]>'",
            Self::UnterminatedProcessingInstruction => {
                "Processing instruction is not terminated, expected '?>'"
            }
            Self::IllegalCharacter => "Character '{0}' is not allowed here",
            Self::BadDecimalDigit => "Invalid decimal digit '{0}' in character reference",
            Self::BadHexDigit => "Invalid hexadecimal digit '{0}' in character reference",
            Self::EntityValueOverflow => "Character reference value is too large",
            Self::InvalidUnicodeValue => "Character reference '{0}' is not a valid Unicode value",
            Self::UnknownEntity => "No such named entity '&{0};'",
            Self::MissingEntitySemicolon => "Entity reference must end with ';'",
            Self::DoubleHyphenInComment => "'--' is not allowed inside a comment",
            Self::UnexpectedToken => "Unexpected '{0}'",
            Self::ExpectedName => "Name expected",
            Self::ExpectedQuote => "Quoted attribute value expected",
            Self::ExpectedWhitespace => "Whitespace expected before attribute '{0}'",
            Self::ExpectedToken => "'{0}' expected",
            Self::EndTagMismatch => "End tag '</{0}>' does not match start tag '<{1}>'",
            Self::UnmatchedEndTag => "End tag '</{0}>' has no matching start tag",
            Self::MissingEndTag => "Element '<{0}>' is missing its end tag",
            Self::DuplicateAttribute => "Attribute '{0}' is already defined on this element",
            Self::MaxDepthExceeded => "Maximum element nesting depth of {0} reached",
            Self::EmptyDocument => "Document has no root element",
            Self::MultipleRootElements => "Document can only have one root element",
            Self::TextOutsideRoot => "Text is not allowed outside the root element",
            Self::SmartQuote => "Non-ASCII quotation mark '{0}' used instead of a straight quote",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

/// Fill `{n}` placeholders with arguments; missing arguments render as empty
pub(crate) fn format_template(template: &str, args: &[Box<str>]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                match after[..close].parse::<usize>() {
                    Ok(index) => out.push_str(args.get(index).map(|a| &**a).unwrap_or("")),
                    Err(_) => out.push_str(&rest[open..open + close + 2]),
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_template() {
        let args: Vec<Box<str>> = vec!["a".into(), "b".into()];
        assert_eq!(
            format_template(ErrorCode::EndTagMismatch.template(), &args),
            "End tag '</a>' does not match start tag '<b>'"
        );
        assert_eq!(format_template("{x} and {0", &args), "{x} and {0");
        assert_eq!(format_template("{3}!", &args), "!");
    }

    #[test]
    fn test_codes_are_unique() {
        let codes = [
            ErrorCode::UnterminatedAttributeValue,
            ErrorCode::UnknownEntity,
            ErrorCode::DoubleHyphenInComment,
            ErrorCode::UnexpectedToken,
            ErrorCode::SmartQuote,
        ];
        let mut seen = std::collections::HashSet::new();
        for code in codes {
            assert!(seen.insert(code.as_str()));
            assert_eq!(code.is_lexical(), code.as_str().starts_with("ML1"));
        }
    }

    #[test]
    fn test_severity_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Severity::Warning).unwrap(),
            "\"warning\""
        );
        assert_eq!(
            serde_json::to_string(&ErrorCode::DuplicateAttribute).unwrap(),
            "\"ML2009\""
        );
    }
}
