use std::fmt;

use serde::{Serialize, Serializer};

use super::{DiagnosticInfo, ErrorCode, Severity, format_template};
use crate::text::{TextRange, TextSize};

/// Maps error codes to message text and severity
///
/// The default methods render the built-in English templates. Hosts that
/// localize messages or promote warnings override them.
pub trait MessageProvider: Send + Sync {
    fn message(&self, code: ErrorCode, args: &[Box<str>]) -> String {
        format_template(code.template(), args)
    }

    fn severity(&self, code: ErrorCode) -> Severity {
        code.default_severity()
    }
}

/// Built-in English messages
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultMessageProvider;

impl MessageProvider for DefaultMessageProvider {}

/// A diagnostic with an absolute position in the source text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub code: ErrorCode,
    pub severity: Severity,
    #[serde(serialize_with = "serialize_text_range")]
    pub range: TextRange,
    pub message: String,
}

fn serialize_text_range<S: Serializer>(range: &TextRange, s: S) -> Result<S::Ok, S::Error> {
    use serde::ser::SerializeStruct;
    let mut state = s.serialize_struct("TextRange", 2)?;
    state.serialize_field("start", &u32::from(range.start()))?;
    state.serialize_field("end", &u32::from(range.end()))?;
    state.end()
}

impl Diagnostic {
    /// Position a stored entry whose owner starts at `owner_full_start`
    pub fn from_info(
        info: &DiagnosticInfo,
        owner_full_start: TextSize,
        provider: &dyn MessageProvider,
    ) -> Self {
        Self {
            code: info.code(),
            severity: provider.severity(info.code()),
            range: TextRange::at(owner_full_start + info.offset(), info.width()),
            message: provider.message(info.code(), info.args()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} at {}..{}: {}",
            self.severity,
            self.code,
            u32::from(self.range.start()),
            u32::from(self.range.end()),
            self.message
        )
    }
}
