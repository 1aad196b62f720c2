//! Result type alias for markup parsing operations

use crate::error::MarkupError;

/// Standard Result type for markup parsing operations
pub type Result<T> = std::result::Result<T, MarkupError>;
