//! Diagnostics with source location tracking.
//!
//! All errors in the yar compiler carry a [`Span`] indicating where in the
//! source text the problem occurred. Phase-specific error types (parse,
//! check, load) convert into [`Diagnostic`] at the pipeline boundary, where
//! the file name is known and `file:line` rendering happens.
//!
//! # Example
//!
//! ```
//! use yar_base::{Diagnostic, Pos, Span, Result};
//!
//! fn reject(name: &str) -> Result<()> {
//!     Err(Diagnostic::new(
//!         format!("undefined name '{}'", name),
//!         Span::at(Pos::new(3, 5, 20)),
//!     ))
//! }
//!
//! let err = reject("frobnicate").unwrap_err();
//! assert!(err.to_string().contains("undefined name"));
//! assert_eq!(err.line(), 3);
//! ```

use crate::span::Span;
use std::fmt;

/// An error annotated with its source location.
///
/// Implements [`std::error::Error`] and [`fmt::Display`]. The display format
/// is `line {line}: {message}`; callers that know the file prepend it.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Human-readable description of the problem.
    pub message: String,
    /// Location in source where the problem occurred.
    pub span: Span,
}

impl Diagnostic {
    /// Creates a diagnostic with the given message and source location.
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }

    /// The 1-based source line the diagnostic starts on.
    pub fn line(&self) -> u32 {
        self.span.start.line
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.span.start.line, self.message)
    }
}

impl std::error::Error for Diagnostic {}

/// Alias for `std::result::Result<T, Diagnostic>`.
pub type Result<T> = std::result::Result<T, Diagnostic>;
