//! Installed-game scanning.
//!
//! Scanning never fails as a whole. A missing client, a library folder on an
//! unmounted drive or a half-written manifest each remove only their own
//! contribution to the result.

use crate::error::{Error, ErrorKind};
use crate::root::PlatformRoot;
use async_stream::stream;
use futures::{Stream, StreamExt};
use ludex_manifest::{ManifestRecord, is_manifest_file_name, read_manifest};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tokio::fs;
use tracing::instrument;

type ScanEventStream<'a> = Pin<Box<dyn Stream<Item = ScanEvent> + Send + 'a>>;

/// Progress of a scan, one event per directory problem or manifest file.
#[derive(Debug)]
pub enum ScanEvent {
    /// The platform client is not present; no other events follow.
    Unavailable(Error),
    /// A manifest directory does not exist (for example a library folder on an
    /// unmounted drive).
    DirectoryMissing { path: PathBuf },
    /// A manifest directory exists but could not be listed.
    DirectoryUnreadable { path: PathBuf, error: Error },
    /// A manifest was parsed; it may or may not describe an installed app.
    ManifestRead { path: PathBuf, record: ManifestRecord },
    /// A file named like a manifest could not be read or parsed.
    ManifestSkipped {
        path: PathBuf,
        error: ludex_manifest::error::Error,
    },
}

/// Streams scan events for every manifest under `root`.
///
/// Files within a directory are visited in name order; directories in the
/// order the root reports them.
///
/// # Examples
///
/// ```no_run
/// use futures::StreamExt;
/// use ludex_platform::{ScanEvent, SteamRoot, scan_stream};
///
/// # async fn example() {
/// let root = SteamRoot::native("steam", "/home/me/.local/share/Steam");
/// let mut events = scan_stream(&root);
/// while let Some(event) = events.next().await {
///     if let ScanEvent::ManifestRead { record, .. } = event {
///         println!("{} installed={}", record.platform_id, record.installed);
///     }
/// }
/// # }
/// ```
pub fn scan_stream<'a>(root: &'a dyn PlatformRoot) -> ScanEventStream<'a> {
    Box::pin(stream! {
        let directories = match root.manifest_directories().await {
            Ok(directories) => directories,
            Err(error) => {
                yield ScanEvent::Unavailable(error);
                return;
            },
        };
        for directory in directories {
            let names = match manifest_file_names(&directory).await {
                Ok(names) => names,
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                    yield ScanEvent::DirectoryMissing { path: directory };
                    continue;
                },
                Err(err) => {
                    let error = exn::Exn::from(err).raise(ErrorKind::Io(directory.clone()));
                    yield ScanEvent::DirectoryUnreadable { path: directory, error };
                    continue;
                },
            };
            for name in names {
                let path = directory.join(name);
                match read_manifest(&path).await {
                    Ok(record) => yield ScanEvent::ManifestRead { path, record },
                    Err(error) => yield ScanEvent::ManifestSkipped { path, error },
                }
            }
        }
    })
}

/// Returns the platform IDs of every fully installed app under `root`.
///
/// An absent client yields an empty set. Directories that can't be listed and
/// manifests that can't be parsed are logged and contribute nothing.
#[instrument(skip_all, fields(runner = root.runner()))]
pub async fn scan_installed(root: &dyn PlatformRoot) -> BTreeSet<String> {
    let mut installed = BTreeSet::new();
    let mut events = scan_stream(root);
    while let Some(event) = events.next().await {
        match event {
            ScanEvent::Unavailable(error) => tracing::debug!(%error, "platform root unavailable"),
            ScanEvent::DirectoryMissing { path } => {
                tracing::warn!(path = %path.display(), "manifest directory missing")
            },
            ScanEvent::DirectoryUnreadable { path, error } => {
                tracing::warn!(path = %path.display(), %error, "manifest directory unreadable")
            },
            ScanEvent::ManifestSkipped { path, error } => {
                tracing::warn!(path = %path.display(), %error, "skipping manifest")
            },
            ScanEvent::ManifestRead { record, .. } if record.installed => {
                installed.insert(record.platform_id);
            },
            ScanEvent::ManifestRead { path, record } => {
                tracing::trace!(path = %path.display(), flags = record.flags.0, "not fully installed")
            },
        }
    }
    tracing::debug!(count = installed.len(), "scan complete");
    installed
}

async fn manifest_file_names(directory: &Path) -> std::io::Result<Vec<String>> {
    let mut entries = fs::read_dir(directory).await?;
    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        // Non-UTF-8 names can't match the manifest convention anyway.
        if let Some(name) = entry.file_name().to_str()
            && is_manifest_file_name(name)
        {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}
