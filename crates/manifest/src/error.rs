//! Manifest Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A manifest error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for manifest operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// Every variant means the same thing to a scanner: this one file cannot be
/// trusted, skip it.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The manifest file could not be read from disk.
    #[display("unable to read manifest: {}", _0.display())]
    Io(#[error(not(source))] PathBuf),
    /// The document is not valid KeyValues text.
    #[display("malformed KeyValues document (line {line}): {reason}")]
    Syntax {
        /// One-based line number where parsing stopped.
        line: usize,
        /// What the parser expected to find.
        reason: &'static str,
    },
    /// A required key could not be found in the document.
    #[display("missing required field: {_0}")]
    MissingField(#[error(not(source))] &'static str),
    /// A key was found but its value could not be interpreted.
    #[display("failed to parse field '{field}', found value: {value}")]
    InvalidField {
        /// The field that failed to parse.
        field: &'static str,
        /// The offending value.
        value: String,
    },
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Steam may be halfway through rewriting the file.
        matches!(self, Self::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::MissingField("appid").to_string(), "missing required field: appid");
        assert_eq!(
            ErrorKind::Syntax { line: 3, reason: "unbalanced braces" }.to_string(),
            "malformed KeyValues document (line 3): unbalanced braces"
        );
    }

    #[test]
    fn error_kind_retryable() {
        assert!(ErrorKind::Io(PathBuf::from("appmanifest_1.acf")).is_retryable());
        assert!(!ErrorKind::MissingField("appid").is_retryable());
    }
}
