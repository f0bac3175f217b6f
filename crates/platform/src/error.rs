//! Platform Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A platform error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for platform operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// None of these are fatal to a sync pass: a platform that can't be read
/// contributes no installed games.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The platform client is not installed or not configured on this host.
    #[display("platform integration not available: {_0}")]
    Unavailable(#[error(not(source))] String),
    /// A manifest directory exists but could not be listed.
    #[display("unable to list directory: {}", _0.display())]
    Io(#[error(not(source))] PathBuf),
    /// A single manifest could not be parsed.
    #[display("invalid manifest: {}", _0.display())]
    Manifest(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}
