//! Marking entries installed or uninstalled from what the platform clients
//! report on disk.

use crate::error::{ErrorKind, Result};
use crate::snapshot::Snapshot;
use exn::ResultExt;
use ludex_platform::{RootHandle, scan_installed};
use ludex_store::{EntryId, LibraryEntry, Repository};
use std::collections::{BTreeSet, HashSet};
use tracing::instrument;

/// Per-runner install rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerProfile {
    pub runner: String,
    /// Only entries that already have a config path may be marked installed
    /// for this runner.
    pub requires_config_path: bool,
}

/// A runner and the platform client whose manifests decide what it has
/// installed.
#[derive(Clone)]
pub struct Integration {
    pub profile: RunnerProfile,
    pub root: RootHandle,
}

impl Integration {
    pub fn new(root: RootHandle, requires_config_path: bool) -> Self {
        Self {
            profile: RunnerProfile {
                runner: root.runner().to_string(),
                requires_config_path,
            },
            root,
        }
    }

    pub fn runner(&self) -> &str {
        &self.profile.runner
    }
}

impl std::fmt::Debug for Integration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Integration").field("profile", &self.profile).finish_non_exhaustive()
    }
}

/// Runner integrations in priority order. When a game is installed under
/// several runners, the first one listed claims it.
#[derive(Debug, Clone, Default)]
pub struct Integrations(Vec<Integration>);

impl Integrations {
    pub fn new(integrations: impl IntoIterator<Item = Integration>) -> Self {
        Self(integrations.into_iter().collect())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Integration> {
        self.0.iter()
    }

    pub fn get(&self, runner: &str) -> Option<&Integration> {
        self.0.iter().find(|integration| integration.runner() == runner)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Integration> for Integrations {
    fn from_iter<T: IntoIterator<Item = Integration>>(iter: T) -> Self {
        Self::new(iter)
    }
}

/// What one integration reported during this pass.
struct Scan<'a> {
    integration: &'a Integration,
    present: bool,
    installed: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Transition<'a> {
    Install { runner: &'a str, platform_id: &'a str },
    Uninstall,
}

/// Bring the installed state of every entry in `snapshot` in line with the
/// manifests of `integrations`.
///
/// Each integration is scanned once. Returns the IDs of the entries marked
/// installed and of those marked uninstalled. Any store failure aborts the
/// pass.
#[instrument(skip_all, fields(entries = snapshot.len(), integrations = integrations.len()))]
pub async fn sync_local(
    repo: &Repository,
    snapshot: &Snapshot,
    integrations: &Integrations,
) -> Result<(BTreeSet<EntryId>, BTreeSet<EntryId>)> {
    let scans = scan_all(integrations).await;
    let mut claimed = HashSet::new();
    let mut installed = BTreeSet::new();
    let mut uninstalled = BTreeSet::new();

    for entry in snapshot.entries() {
        match plan(entry, snapshot, &scans, &mut claimed) {
            Some(Transition::Install { runner, platform_id }) => {
                let config_path =
                    repo.mark_installed(entry, runner, platform_id).await.or_raise(|| ErrorKind::Store)?;
                tracing::info!(slug = %entry.slug, %runner, %platform_id, %config_path, "marked installed");
                installed.insert(entry.id);
            },
            Some(Transition::Uninstall) => {
                repo.mark_uninstalled(entry).await.or_raise(|| ErrorKind::Store)?;
                tracing::info!(slug = %entry.slug, runner = ?entry.runner, "marked uninstalled");
                uninstalled.insert(entry.id);
            },
            None => {},
        }
    }

    tracing::debug!(installed = installed.len(), uninstalled = uninstalled.len(), "local pass complete");
    Ok((installed, uninstalled))
}

async fn scan_all(integrations: &Integrations) -> Vec<Scan<'_>> {
    let mut scans = Vec::with_capacity(integrations.len());
    for integration in integrations.iter() {
        let present = integration.root.is_present().await;
        let installed = if present { scan_installed(integration.root.as_ref()).await } else { BTreeSet::new() };
        tracing::debug!(runner = %integration.runner(), present, installed = installed.len(), "scanned integration");
        scans.push(Scan {
            integration,
            present,
            installed,
        });
    }
    scans
}

fn plan<'a>(
    entry: &'a LibraryEntry,
    snapshot: &Snapshot,
    scans: &'a [Scan<'a>],
    claimed: &mut HashSet<(&'a str, &'a str)>,
) -> Option<Transition<'a>> {
    let platform_id = entry.platform_id.as_deref()?;
    let owner = match entry.runner.as_deref() {
        Some(runner) => Some(scans.iter().find(|scan| scan.integration.runner() == runner)?),
        None => None,
    };

    if !entry.installed {
        // First integration in table order that has the game and may claim it.
        let mut holders = scans.iter().filter(|scan| scan.installed.contains(platform_id)).peekable();
        holders.peek()?;
        let eligible = holders
            .find(|scan| !scan.integration.profile.requires_config_path || entry.config_path.is_some());
        let Some(scan) = eligible else {
            tracing::debug!(slug = %entry.slug, %platform_id, "installed but has no config path, skipping");
            return None;
        };
        let runner = scan.integration.runner();
        let taken = snapshot.owner_of(runner, platform_id).is_some_and(|owner| owner != entry.slug);
        if taken || !claimed.insert((runner, platform_id)) {
            tracing::warn!(slug = %entry.slug, %runner, %platform_id, "platform ID already claimed by another entry");
            return None;
        }
        return Some(Transition::Install { runner, platform_id });
    }

    // An installed entry always has an owning runner; one without is left
    // alone, as is one whose client can't be seen right now.
    let owner = owner?;
    let anywhere = scans.iter().any(|scan| scan.installed.contains(platform_id));
    (!anywhere && owner.present).then_some(Transition::Uninstall)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ludex_platform::PlatformRoot;
    use std::path::PathBuf;
    use std::sync::Arc;

    /// A root that reports presence without touching the filesystem.
    struct FixedRoot {
        runner: &'static str,
        present: bool,
    }

    #[async_trait]
    impl PlatformRoot for FixedRoot {
        fn runner(&self) -> &str {
            self.runner
        }

        async fn is_present(&self) -> bool {
            self.present
        }

        async fn manifest_directories(&self) -> ludex_platform::error::Result<Vec<PathBuf>> {
            Ok(Vec::new())
        }
    }

    fn entry(slug: &str, runner: Option<&str>, platform_id: Option<&str>, installed: bool) -> LibraryEntry {
        LibraryEntry {
            id: EntryId(slug.len() as i64),
            slug: slug.to_string(),
            name: slug.to_string(),
            runner: runner.map(str::to_string),
            platform_id: platform_id.map(str::to_string),
            installed,
            config_path: None,
            updated_at: None,
            year: None,
        }
    }

    fn integration(runner: &'static str, requires_config_path: bool) -> Integration {
        Integration::new(Arc::new(FixedRoot { runner, present: true }), requires_config_path)
    }

    fn scanned<'a>(integration: &'a Integration, present: bool, installed: &[&str]) -> Scan<'a> {
        Scan {
            integration,
            present,
            installed: installed.iter().map(|id| id.to_string()).collect(),
        }
    }

    #[test]
    fn test_install_prefers_first_integration() {
        let steam = integration("steam", false);
        let wine = integration("winesteam", true);
        let scans = [scanned(&steam, true, &["400"]), scanned(&wine, true, &["400"])];
        let portal = entry("portal", None, Some("400"), false);
        let snapshot = Snapshot::from_entries([portal.clone()]);
        let transition = plan(&portal, &snapshot, &scans, &mut HashSet::new());
        assert_eq!(
            transition,
            Some(Transition::Install {
                runner: "steam",
                platform_id: "400"
            })
        );
    }

    #[test]
    fn test_install_requires_config_path() {
        let steam = integration("steam", false);
        let wine = integration("winesteam", true);
        let scans = [scanned(&steam, true, &[]), scanned(&wine, true, &["400"])];
        let mut portal = entry("portal", None, Some("400"), false);
        let snapshot = Snapshot::from_entries([portal.clone()]);
        assert_eq!(plan(&portal, &snapshot, &scans, &mut HashSet::new()), None);

        portal.config_path = Some("portal-1".to_string());
        assert!(matches!(
            plan(&portal, &snapshot, &scans, &mut HashSet::new()),
            Some(Transition::Install { runner: "winesteam", .. })
        ));
    }

    #[test]
    fn test_install_falls_through_to_runner_without_config_requirement() {
        let wine = integration("winesteam", true);
        let steam = integration("steam", false);
        let scans = [scanned(&wine, true, &["400"]), scanned(&steam, true, &["400"])];
        let mut portal = entry("portal", None, Some("400"), false);
        let snapshot = Snapshot::from_entries([portal.clone()]);
        assert_eq!(
            plan(&portal, &snapshot, &scans, &mut HashSet::new()),
            Some(Transition::Install {
                runner: "steam",
                platform_id: "400"
            })
        );

        // With a config path the first listed runner wins again.
        portal.config_path = Some("portal-1".to_string());
        assert!(matches!(
            plan(&portal, &snapshot, &scans, &mut HashSet::new()),
            Some(Transition::Install { runner: "winesteam", .. })
        ));
    }

    #[test]
    fn test_install_skips_owned_platform_id() {
        let steam = integration("steam", false);
        let scans = [scanned(&steam, true, &["400"])];
        let owner = entry("portal", Some("steam"), Some("400"), true);
        let rival = entry("portal-goty", None, Some("400"), false);
        let snapshot = Snapshot::from_entries([owner, rival.clone()]);
        assert_eq!(plan(&rival, &snapshot, &scans, &mut HashSet::new()), None);
    }

    #[test]
    fn test_install_claims_once_per_pass() {
        let steam = integration("steam", false);
        let scans = [scanned(&steam, true, &["400"])];
        let first = entry("portal", None, Some("400"), false);
        let second = entry("portal-goty", None, Some("400"), false);
        let snapshot = Snapshot::from_entries([first.clone(), second.clone()]);
        let mut claimed = HashSet::new();
        assert!(plan(&first, &snapshot, &scans, &mut claimed).is_some());
        assert_eq!(plan(&second, &snapshot, &scans, &mut claimed), None);
    }

    #[test]
    fn test_foreign_runner_is_never_touched() {
        let steam = integration("steam", false);
        let scans = [scanned(&steam, true, &["400"])];
        let snapshot = Snapshot::default();
        let not_installed = entry("portal", Some("linux"), Some("400"), false);
        assert_eq!(plan(&not_installed, &snapshot, &scans, &mut HashSet::new()), None);
        let installed = entry("quake", Some("linux"), Some("2310"), true);
        assert_eq!(plan(&installed, &snapshot, &scans, &mut HashSet::new()), None);
    }

    #[test]
    fn test_uninstall_needs_owner_present() {
        let steam = integration("steam", false);
        let wine = integration("winesteam", true);
        let scans = [scanned(&steam, true, &[]), scanned(&wine, false, &[])];
        let snapshot = Snapshot::default();

        let portal = entry("portal", Some("steam"), Some("400"), true);
        assert_eq!(plan(&portal, &snapshot, &scans, &mut HashSet::new()), Some(Transition::Uninstall));
        let quake = entry("quake", Some("winesteam"), Some("2310"), true);
        assert_eq!(plan(&quake, &snapshot, &scans, &mut HashSet::new()), None);
    }

    #[test]
    fn test_installed_elsewhere_is_not_uninstalled() {
        let steam = integration("steam", false);
        let wine = integration("winesteam", true);
        let scans = [scanned(&steam, true, &[]), scanned(&wine, true, &["400"])];
        let portal = entry("portal", Some("steam"), Some("400"), true);
        assert_eq!(plan(&portal, &Snapshot::default(), &scans, &mut HashSet::new()), None);
    }

    #[test]
    fn test_no_platform_id_is_never_touched() {
        let steam = integration("steam", false);
        let scans = [scanned(&steam, true, &["400"])];
        let portal = entry("portal", Some("steam"), None, true);
        assert_eq!(plan(&portal, &Snapshot::default(), &scans, &mut HashSet::new()), None);
    }

    #[tokio::test]
    async fn test_absent_integration_is_not_scanned() {
        let root = FixedRoot {
            runner: "steam",
            present: false,
        };
        let integrations = Integrations::new([Integration::new(Arc::new(root), false)]);
        let scans = super::scan_all(&integrations).await;
        assert!(!scans[0].present);
        assert!(scans[0].installed.is_empty());
    }

    #[test]
    fn test_integrations_lookup() {
        let integrations: Integrations = [integration("steam", false), integration("winesteam", true)].into_iter().collect();
        assert_eq!(integrations.len(), 2);
        assert!(integrations.get("winesteam").is_some_and(|i| i.profile.requires_config_path));
        assert!(integrations.get("linux").is_none());
    }
}
