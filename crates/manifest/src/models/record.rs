use crate::models::StateFlags;

/// What a single app manifest says about one installation.
///
/// Built fresh for every manifest read during a scan; nothing here is
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestRecord {
    /// Steam app ID, kept as the decimal string Steam writes.
    pub platform_id: String,
    /// Derived from [`StateFlags::is_installed`].
    pub installed: bool,
    pub flags: StateFlags,
    pub name: Option<String>,
    pub install_dir: Option<String>,
}
