//! Diagnostics attached to green elements and surfaced through the red tree.
//!
//! Green nodes and tokens store [`DiagnosticInfo`] entries whose offsets are
//! relative to the element's full start. Red-tree queries turn them into
//! positioned [`Diagnostic`] values using a [`MessageProvider`].

mod code;
mod diagnostic;
mod info;

pub use code::{ErrorCode, Severity};
pub use diagnostic::{DefaultMessageProvider, Diagnostic, MessageProvider};
pub use info::DiagnosticInfo;

pub(crate) use code::format_template;
