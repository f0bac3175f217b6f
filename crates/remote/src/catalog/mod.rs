//! Remote catalog trait and implementations.

mod http;
#[cfg(feature = "mock")]
mod mock;

pub use self::http::HttpCatalog;
#[cfg(feature = "mock")]
pub use self::mock::MockCatalog;
use crate::error::Result;
use crate::models::RemoteEntry;
use async_trait::async_trait;
use std::sync::Arc;

/// Shared, type-erased catalog.
pub type CatalogHandle = Arc<dyn RemoteCatalog + Send + Sync>;

/// The service that knows which games a user owns.
///
/// # Examples
///
/// ```
/// use ludex_remote::{NoCatalog, RemoteCatalog};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> ludex_remote::error::Result<()> {
/// let catalog = NoCatalog;
/// assert!(catalog.fetch_library().await?.is_empty());
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait RemoteCatalog: Send + Sync {
    /// Fetch every game in the user's remote library.
    async fn fetch_library(&self) -> Result<Vec<RemoteEntry>>;
}

/// Catalog for users without a remote account: always empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCatalog;

#[async_trait]
impl RemoteCatalog for NoCatalog {
    async fn fetch_library(&self) -> Result<Vec<RemoteEntry>> {
        Ok(Vec::new())
    }
}
