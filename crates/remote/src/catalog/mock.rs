//! In-memory catalog for testing.

use crate::catalog::RemoteCatalog;
use crate::error::{ErrorKind, Result};
use crate::models::RemoteEntry;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

enum Response {
    Entries(Vec<RemoteEntry>),
    Fail(ErrorKind),
    Hang,
}

/// In-memory catalog for testing.
///
/// Serves a fixed library, a fixed failure, or never answers at all. The
/// response can be swapped between passes with [`set_entries`](Self::set_entries).
///
/// # Examples
///
/// ```
/// use ludex_remote::{MockCatalog, RemoteCatalog, error::ErrorKind};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let catalog = MockCatalog::failing(ErrorKind::Status(502));
/// assert!(catalog.fetch_library().await.is_err());
/// assert_eq!(catalog.fetch_count(), 1);
/// # }
/// ```
pub struct MockCatalog {
    response: RwLock<Response>,
    fetches: AtomicUsize,
}

impl MockCatalog {
    fn new(response: Response) -> Self {
        Self {
            response: RwLock::new(response),
            fetches: AtomicUsize::new(0),
        }
    }

    /// A catalog serving `entries`.
    pub fn with_entries(entries: impl IntoIterator<Item = RemoteEntry>) -> Self {
        Self::new(Response::Entries(entries.into_iter().collect()))
    }

    /// A catalog whose every fetch fails with `kind`.
    pub fn failing(kind: ErrorKind) -> Self {
        Self::new(Response::Fail(kind))
    }

    /// A catalog whose fetches never complete.
    pub fn hanging() -> Self {
        Self::new(Response::Hang)
    }

    /// Replace the served library.
    pub async fn set_entries(&self, entries: impl IntoIterator<Item = RemoteEntry>) {
        *self.response.write().await = Response::Entries(entries.into_iter().collect());
    }

    /// Number of times [`fetch_library`](RemoteCatalog::fetch_library) was called.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteCatalog for MockCatalog {
    async fn fetch_library(&self) -> Result<Vec<RemoteEntry>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        match &*self.response.read().await {
            Response::Entries(entries) => Ok(entries.clone()),
            Response::Fail(kind) => exn::bail!(kind.clone()),
            Response::Hang => std::future::pending().await,
        }
    }
}
