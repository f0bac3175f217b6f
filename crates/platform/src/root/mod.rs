//! Platform roots.
//!
//! This module defines the `PlatformRoot` trait, the seam between the sync
//! engine and whatever layout a platform client uses on disk.

mod steam;

pub use self::steam::SteamRoot;
use crate::error::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

/// Shared, type-erased platform root.
pub type RootHandle = Arc<dyn PlatformRoot + Send + Sync>;

/// Where a platform client keeps its installation manifests.
///
/// # Examples
///
/// ```no_run
/// use ludex_platform::{PlatformRoot, SteamRoot};
///
/// # async fn example() -> ludex_platform::error::Result<()> {
/// let root = SteamRoot::native("steam", "/home/me/.local/share/Steam");
/// if root.is_present().await {
///     for directory in root.manifest_directories().await? {
///         println!("{}: {}", root.runner(), directory.display());
///     }
/// }
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait PlatformRoot: Send + Sync {
    /// Runner name this root answers for (taken from the integration table).
    fn runner(&self) -> &str;

    /// Whether the platform client is installed and configured on this host.
    async fn is_present(&self) -> bool;

    /// Every directory that may contain app manifests.
    ///
    /// Returns [`Unavailable`](crate::error::ErrorKind::Unavailable) when the
    /// client is not present. Listed directories are not guaranteed to exist.
    async fn manifest_directories(&self) -> Result<Vec<PathBuf>>;
}
