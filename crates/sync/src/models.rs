use ludex_store::{BackfillField, EntryId};
use std::collections::BTreeSet;
use std::time::Duration;

/// Default limit on a catalog fetch.
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(30);

/// Tunables for a sync pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPolicy {
    /// A catalog fetch still running after this long counts as failed.
    pub remote_timeout: Duration,
    /// Fields filled in on existing entries when empty locally.
    pub backfill: BTreeSet<BackfillField>,
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self {
            remote_timeout: DEFAULT_REMOTE_TIMEOUT,
            backfill: BackfillField::ALL.into_iter().collect(),
        }
    }
}

/// Entries changed by one full pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncResult {
    /// Created from the remote catalog.
    pub added: BTreeSet<EntryId>,
    /// Pre-existing entries that took remote metadata.
    pub updated: BTreeSet<EntryId>,
    pub installed: BTreeSet<EntryId>,
    pub uninstalled: BTreeSet<EntryId>,
}

impl SyncResult {
    /// `true` if the pass changed nothing.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.installed.is_empty() && self.uninstalled.is_empty()
    }
}
