//! App manifest (`appmanifest_<id>.acf`) extraction.

use exn::{OptionExt, ResultExt};
use std::path::Path;
use tracing::instrument;

use crate::consts;
use crate::error::{ErrorKind, Result};
use crate::models::{ManifestRecord, StateFlags};
use crate::vdf::{self, Block};

/// Returns `true` if `file_name` follows Steam's manifest naming convention.
///
/// ```
/// use ludex_manifest::is_manifest_file_name;
/// assert!(is_manifest_file_name("appmanifest_220.acf"));
/// assert!(!is_manifest_file_name("appmanifest_220.acf.tmp"));
/// assert!(!is_manifest_file_name("libraryfolders.vdf"));
/// ```
pub fn is_manifest_file_name(file_name: &str) -> bool {
    consts::MANIFEST_FILE_REGEX.is_match(file_name)
}

/// Reads and parses the manifest at `path`.
#[instrument(level = "debug", skip_all, fields(path = %path.as_ref().display()))]
pub async fn read_manifest(path: impl AsRef<Path>) -> Result<ManifestRecord> {
    let path = path.as_ref();
    let data = tokio::fs::read(path).await.or_raise(|| ErrorKind::Io(path.to_path_buf()))?;
    parse_manifest(data)
}

/// Parses the contents of an app manifest.
///
/// Accepts raw bytes; Steam writes UTF-8 but a game name with stray Latin-1
/// bytes should not make the whole manifest unreadable, so invalid sequences
/// are replaced with U+FFFD.
///
/// Every document either fails or yields a definite `installed` value: a
/// manifest without `StateFlags` has never finished installing.
///
/// # Examples
///
/// ```
/// use ludex_manifest::parse_manifest;
///
/// let record = parse_manifest(r#"
///     "AppState"
///     {
///         "appid"       "220"
///         "name"        "Half-Life 2"
///         "StateFlags"  "4"
///     }
/// "#).unwrap();
/// assert_eq!(record.platform_id, "220");
/// assert!(record.installed);
/// ```
pub fn parse_manifest(data: impl AsRef<[u8]>) -> Result<ManifestRecord> {
    let text = String::from_utf8_lossy(data.as_ref());
    let document = vdf::parse(&text)?;
    let state = document.get_block("AppState").ok_or_raise(|| ErrorKind::MissingField("AppState"))?;
    let flags = self::state_flags(state)?;
    Ok(ManifestRecord {
        platform_id: self::app_id(state)?,
        installed: flags.is_installed(),
        flags,
        name: optional(state, "name"),
        install_dir: optional(state, "installdir"),
    })
}

fn app_id(state: &Block) -> Result<String> {
    let value = state.get_str("appid").ok_or_raise(|| ErrorKind::MissingField("appid"))?.trim();
    if !consts::APP_ID_REGEX.is_match(value) {
        exn::bail!(ErrorKind::InvalidField {
            field: "appid",
            value: value.to_string(),
        });
    }
    Ok(value.to_string())
}

fn state_flags(state: &Block) -> Result<StateFlags> {
    match state.get_str("StateFlags") {
        Some(value) => value.parse(),
        None => Ok(StateFlags::default()),
    }
}

fn optional(state: &Block, key: &str) -> Option<String> {
    state.get_str(key).map(str::trim).filter(|s| !s.is_empty()).map(String::from)
}
