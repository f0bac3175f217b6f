//! Sync Error Types
//!
//! Only failures that abort a pass surface here. An unreachable catalog, a
//! missing platform client or an unreadable manifest is logged and recovered
//! inside the pass instead.

use derive_more::{Display, Error};

/// A sync error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for sync operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Reading from or writing to the local store failed; the pass stopped
    /// at the first failing write.
    #[display("local store operation failed")]
    Store,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Usually another process holding the SQLite write lock.
        matches!(self, Self::Store)
    }
}
