use directories::{BaseDirs, ProjectDirs};
use ludex_store::BackfillField;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://lutris.net";
const DEFAULT_MEDIA_URL: &str = "https://lutris.net/media";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub(crate) fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("net", "ludex", "ludex")
}

fn data_dir() -> PathBuf {
    project_dirs().map(|dirs| dirs.data_dir().to_path_buf()).unwrap_or_else(|| PathBuf::from("."))
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub remote: RemoteConfig,
    pub media: MediaConfig,
    pub sync: SyncConfig,
    /// Runner integrations, primary first. Order decides which runner claims
    /// a game installed in more than one place.
    pub integrations: Vec<IntegrationConfig>,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            remote: RemoteConfig::default(),
            media: MediaConfig::default(),
            sync: SyncConfig::default(),
            integrations: default_integrations(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}
impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: data_dir().join("library.db"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub base_url: String,
    /// Without a username the remote catalog is skipped.
    pub username: Option<String>,
    pub token: Option<String>,
    pub timeout_secs: u64,
    pub media_url: String,
}
impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            username: None,
            token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            media_url: DEFAULT_MEDIA_URL.to_string(),
        }
    }
}
impl RemoteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    pub enabled: bool,
    pub banner_dir: PathBuf,
    pub icon_dir: PathBuf,
}
impl Default for MediaConfig {
    fn default() -> Self {
        let data_dir = data_dir();
        Self {
            enabled: true,
            banner_dir: data_dir.join("banners"),
            icon_dir: data_dir.join("icons"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Fields filled in on existing entries when empty locally.
    pub backfill_fields: Vec<BackfillField>,
}
impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            backfill_fields: BackfillField::ALL.to_vec(),
        }
    }
}

/// How a runner's platform client is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegrationKind {
    /// `root` is the Steam installation directory.
    Native,
    /// `root` is a Wine prefix containing a Windows Steam installation.
    Wine,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationConfig {
    pub runner: String,
    pub kind: IntegrationKind,
    pub root: PathBuf,
    /// Entries without a config path are never marked installed for this runner.
    #[serde(default)]
    pub requires_config_path: bool,
}

fn native_steam_root() -> PathBuf {
    let Some(base) = BaseDirs::new() else {
        return PathBuf::from(".steam/steam");
    };
    let candidates = [base.home_dir().join(".steam/steam"), base.data_dir().join("Steam")];
    candidates.iter().find(|path| path.is_dir()).unwrap_or(&candidates[1]).clone()
}

fn default_integrations() -> Vec<IntegrationConfig> {
    vec![
        IntegrationConfig {
            runner: "steam".to_string(),
            kind: IntegrationKind::Native,
            root: native_steam_root(),
            requires_config_path: false,
        },
        IntegrationConfig {
            runner: "winesteam".to_string(),
            kind: IntegrationKind::Wine,
            root: data_dir().join("runners/winesteam/prefix"),
            requires_config_path: true,
        },
    ]
}
