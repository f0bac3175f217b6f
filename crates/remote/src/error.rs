//! Remote Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A remote error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for remote operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// Every fetch failure is recoverable for a sync pass: the catalog is treated
/// as empty and the pass continues.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The client could not be built from its configuration.
    #[display("invalid remote configuration: {_0}")]
    InvalidConfig(#[error(not(source))] String),
    /// The request never produced a response.
    #[display("network error")]
    Network,
    /// The service answered with a non-success status.
    #[display("unexpected response status: {_0}")]
    Status(#[error(not(source))] u16),
    /// The response body was not a catalog document.
    #[display("invalid catalog response")]
    InvalidResponse,
    #[display("request timed out")]
    Timeout,
    /// A downloaded media file could not be written.
    #[display("unable to write media file: {}", _0.display())]
    Io(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network | Self::Timeout => true,
            Self::Status(code) => *code == 429 || *code >= 500,
            Self::InvalidConfig(_) | Self::InvalidResponse | Self::Io(_) => false,
        }
    }
}
