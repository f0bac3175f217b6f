//! Banner and icon refresh.
//!
//! Refreshing media never blocks or fails a sync pass: downloads run as
//! background tasks and failures are only logged.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinSet;

/// Shared, type-erased media refresher.
pub type MediaHandle = Arc<dyn MediaRefresh + Send + Sync>;

/// Fire-and-forget refresh of a game's artwork.
pub trait MediaRefresh: Send + Sync {
    /// Start replacing the banner and icon of `slug` with the latest remote
    /// copies. Returns immediately.
    fn refresh_media(&self, slug: &str);
}

/// Media refresh that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMedia;

impl MediaRefresh for NoMedia {
    fn refresh_media(&self, _slug: &str) {}
}

#[derive(Debug, Clone)]
struct Target {
    url: String,
    path: PathBuf,
}

/// Downloads `<media_url>/games/banners/<slug>.jpg` and
/// `<media_url>/games/icons/<slug>.png` into local directories, overwriting
/// existing files.
///
/// Must be used from within a Tokio runtime.
pub struct HttpMedia {
    client: reqwest::Client,
    media_url: String,
    banner_dir: PathBuf,
    icon_dir: PathBuf,
    tasks: Mutex<JoinSet<()>>,
}

impl HttpMedia {
    pub fn new(
        media_url: impl AsRef<str>,
        banner_dir: impl AsRef<Path>,
        icon_dir: impl AsRef<Path>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .or_raise(|| ErrorKind::InvalidConfig("unable to build HTTP client".to_string()))?;
        Ok(Self {
            client,
            media_url: media_url.as_ref().trim_end_matches('/').to_string(),
            banner_dir: banner_dir.as_ref().to_path_buf(),
            icon_dir: icon_dir.as_ref().to_path_buf(),
            tasks: Mutex::new(JoinSet::new()),
        })
    }

    /// Download targets for `slug`, or `None` when the slug can't be used as
    /// a file name inside the media directories.
    fn targets(&self, slug: &str) -> Option<[Target; 2]> {
        if !is_safe_file_stem(slug) {
            return None;
        }
        Some([
            Target {
                url: format!("{}/games/banners/{slug}.jpg", self.media_url),
                path: self.banner_dir.join(format!("{slug}.jpg")),
            },
            Target {
                url: format!("{}/games/icons/{slug}.png", self.media_url),
                path: self.icon_dir.join(format!("{slug}.png")),
            },
        ])
    }

    /// Wait for every refresh started so far to finish.
    pub async fn finish(&self) {
        let mut tasks = std::mem::take(&mut *self.tasks.lock().unwrap_or_else(PoisonError::into_inner));
        while let Some(result) = tasks.join_next().await {
            if let Err(err) = result {
                tracing::warn!(error = %err, "media refresh task failed");
            }
        }
    }
}

impl MediaRefresh for HttpMedia {
    fn refresh_media(&self, slug: &str) {
        let Some(targets) = self.targets(slug) else {
            tracing::warn!(%slug, "slug is not a safe file name, skipping media refresh");
            return;
        };
        let client = self.client.clone();
        let slug = slug.to_string();
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        tasks.spawn(async move {
            for target in targets {
                if let Err(err) = download(&client, &target.url, &target.path).await {
                    tracing::warn!(%slug, url = %target.url, error = %err, "media download failed");
                }
            }
        });
    }
}

// Catalog slugs are normally `[a-z0-9-]`; anything that could leave the
// target directory is refused.
fn is_safe_file_stem(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('.')
        && slug.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

async fn download(client: &reqwest::Client, url: &str, path: &Path) -> Result<()> {
    let response = client.get(url).send().await.or_raise(|| ErrorKind::Network)?;
    let status = response.status();
    if !status.is_success() {
        exn::bail!(ErrorKind::Status(status.as_u16()));
    }
    let data = response.bytes().await.or_raise(|| ErrorKind::Network)?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.or_raise(|| ErrorKind::Io(parent.to_path_buf()))?;
    }
    tokio::fs::write(path, &data).await.or_raise(|| ErrorKind::Io(path.to_path_buf()))?;
    tracing::debug!(path = %path.display(), bytes = data.len(), "media downloaded");
    Ok(())
}

/// Media refresh that records requested slugs, for testing.
#[cfg(feature = "mock")]
#[derive(Debug, Default)]
pub struct RecordingMedia {
    slugs: Mutex<Vec<String>>,
}

#[cfg(feature = "mock")]
impl RecordingMedia {
    /// Slugs refreshed so far, in request order.
    pub fn refreshed(&self) -> Vec<String> {
        self.slugs.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[cfg(feature = "mock")]
impl MediaRefresh for RecordingMedia {
    fn refresh_media(&self, slug: &str) {
        self.slugs.lock().unwrap_or_else(PoisonError::into_inner).push(slug.to_string());
    }
}
