//! Steam, either installed natively or inside a Wine prefix.

use crate::consts::WINDOWS_PATH_REGEX;
use crate::error::{ErrorKind, Result};
use crate::root::PlatformRoot;
use async_trait::async_trait;
use ludex_manifest::parse_library_folders;
use std::path::{Path, PathBuf};
use tokio::fs;

const LIBRARY_FOLDERS_FILE: &str = "libraryfolders.vdf";
// Older clients (and most Windows installs) capitalise the directory.
const STEAMAPPS_DIRS: [&str; 2] = ["steamapps", "SteamApps"];
const WINE_STEAM_DIRS: [&str; 2] = ["drive_c/Program Files (x86)/Steam", "drive_c/Program Files/Steam"];

#[derive(Debug, Clone)]
enum Layout {
    /// Path to the Steam installation itself (the directory holding `steamapps`).
    Native(PathBuf),
    /// Path to the Wine prefix (the directory holding `drive_c`).
    Wine(PathBuf),
}

/// Steam client installation.
///
/// The primary `steamapps` directory and every additional library folder
/// listed in `libraryfolders.vdf` are searched for manifests.
///
/// # Examples
///
/// ```
/// use ludex_platform::{PlatformRoot, SteamRoot};
///
/// let native = SteamRoot::native("steam", "/home/me/.local/share/Steam");
/// let wine = SteamRoot::wine("winesteam", "/home/me/.wine");
/// assert_eq!(native.runner(), "steam");
/// assert_eq!(wine.runner(), "winesteam");
/// ```
#[derive(Debug, Clone)]
pub struct SteamRoot {
    runner: String,
    layout: Layout,
}

impl SteamRoot {
    /// Steam installed for the host OS, rooted at `root` (for example
    /// `~/.local/share/Steam`).
    pub fn native(runner: impl Into<String>, root: impl AsRef<Path>) -> Self {
        Self {
            runner: runner.into(),
            layout: Layout::Native(root.as_ref().to_path_buf()),
        }
    }

    /// Windows Steam installed inside the Wine prefix at `prefix`.
    pub fn wine(runner: impl Into<String>, prefix: impl AsRef<Path>) -> Self {
        Self {
            runner: runner.into(),
            layout: Layout::Wine(prefix.as_ref().to_path_buf()),
        }
    }

    /// Resolves the Steam installation directory, if one exists.
    async fn steam_dir(&self) -> Option<PathBuf> {
        match &self.layout {
            Layout::Native(root) => is_dir(root).await.then(|| root.clone()),
            Layout::Wine(prefix) => {
                for candidate in WINE_STEAM_DIRS {
                    let dir = prefix.join(candidate);
                    if is_dir(&dir).await {
                        return Some(dir);
                    }
                }
                None
            },
        }
    }

    /// Maps a library folder path, as written by the Steam client, onto the
    /// host filesystem.
    fn host_path(&self, raw: &str) -> PathBuf {
        match &self.layout {
            Layout::Native(_) => PathBuf::from(raw),
            Layout::Wine(prefix) => translate_windows_path(prefix, raw),
        }
    }

    async fn library_folders(&self, steamapps: &Path) -> Vec<PathBuf> {
        let path = steamapps.join(LIBRARY_FOLDERS_FILE);
        let data = match fs::read(&path).await {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "unable to read library folders");
                return Vec::new();
            },
        };
        match parse_library_folders(data) {
            Ok(folders) => folders.iter().map(|folder| self.host_path(folder)).collect(),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "ignoring malformed library folders");
                Vec::new()
            },
        }
    }
}

#[async_trait]
impl PlatformRoot for SteamRoot {
    fn runner(&self) -> &str {
        &self.runner
    }

    async fn is_present(&self) -> bool {
        self.steam_dir().await.is_some()
    }

    async fn manifest_directories(&self) -> Result<Vec<PathBuf>> {
        let Some(steam_dir) = self.steam_dir().await else {
            exn::bail!(ErrorKind::Unavailable(self.runner.clone()));
        };
        let primary = steamapps_of(&steam_dir).await;
        let mut directories = vec![primary.clone()];
        for folder in self.library_folders(&primary).await {
            let steamapps = steamapps_of(&folder).await;
            // Modern clients list the main installation as folder "0".
            if !directories.contains(&steamapps) {
                directories.push(steamapps);
            }
        }
        Ok(directories)
    }
}

async fn is_dir(path: &Path) -> bool {
    fs::metadata(path).await.map(|meta| meta.is_dir()).unwrap_or(false)
}

/// Picks whichever casing of `steamapps` exists under `dir`, defaulting to
/// lowercase.
async fn steamapps_of(dir: &Path) -> PathBuf {
    for name in STEAMAPPS_DIRS {
        let candidate = dir.join(name);
        if is_dir(&candidate).await {
            return candidate;
        }
    }
    dir.join(STEAMAPPS_DIRS[0])
}

/// `C:\Games` becomes `<prefix>/drive_c/Games`; any other drive goes through
/// the prefix's `dosdevices` symlinks. Paths without a drive letter are
/// returned untouched.
fn translate_windows_path(prefix: &Path, raw: &str) -> PathBuf {
    let Some(captures) = WINDOWS_PATH_REGEX.captures(raw) else {
        return PathBuf::from(raw);
    };
    let letter = captures[1].to_ascii_lowercase();
    let mut path = if letter == "c" {
        prefix.join("drive_c")
    } else {
        prefix.join("dosdevices").join(format!("{letter}:"))
    };
    for component in captures[2].split(['\\', '/']).filter(|c| !c.is_empty()) {
        path.push(component);
    }
    path
}
