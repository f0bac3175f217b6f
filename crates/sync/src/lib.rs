//! Reconciliation of the local game library.
//!
//! A full pass runs in two halves, each against a fresh [`Snapshot`] of the
//! store:
//!
//! 1. [`sync_from_remote`]: create entries the remote catalog has and the
//!    library lacks, and merge newer or missing metadata into the rest.
//! 2. [`sync_local`]: mark entries installed or uninstalled from the app
//!    manifests of each runner integration.
//!
//! Unavailable sources (catalog offline, platform client missing, unreadable
//! manifests) are logged and treated as empty. Store failures abort the pass.

pub mod error;
mod local;
mod models;
mod remote;
mod snapshot;

pub use crate::local::{Integration, Integrations, RunnerProfile, sync_local};
pub use crate::models::{DEFAULT_REMOTE_TIMEOUT, SyncPolicy, SyncResult};
pub use crate::remote::sync_from_remote;
pub use crate::snapshot::Snapshot;

use crate::error::Result;
use ludex_remote::{CatalogHandle, MediaHandle};
use ludex_store::{EntryId, Repository};
use std::collections::BTreeSet;
use tracing::instrument;

/// Runs sync passes against one library.
///
/// Every operation takes `&mut self`, so a single `Sync` never runs two passes
/// at once.
pub struct Sync {
    repo: Repository,
    catalog: CatalogHandle,
    media: MediaHandle,
    integrations: Integrations,
    policy: SyncPolicy,
    snapshot: Snapshot,
}

impl Sync {
    pub fn new(
        repo: Repository,
        catalog: CatalogHandle,
        media: MediaHandle,
        integrations: Integrations,
        policy: SyncPolicy,
    ) -> Self {
        Self {
            repo,
            catalog,
            media,
            integrations,
            policy,
            snapshot: Snapshot::default(),
        }
    }

    /// The library as of the most recent store read.
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn integrations(&self) -> &Integrations {
        &self.integrations
    }

    async fn reload(&mut self) -> Result<()> {
        self.snapshot = Snapshot::load(&self.repo).await?;
        Ok(())
    }

    /// Remote pass followed by local pass.
    ///
    /// The snapshot is reloaded between the two whenever the remote pass
    /// wrote anything, so the local pass sees new entries and freshly merged
    /// platform IDs.
    #[instrument(skip_all)]
    pub async fn run_full_sync(&mut self) -> Result<SyncResult> {
        self.reload().await?;
        let (added, updated) = self.remote_pass().await?;
        if !added.is_empty() || !updated.is_empty() {
            self.reload().await?;
        }
        let (installed, uninstalled) = self.local_pass().await?;
        let result = SyncResult {
            added,
            updated,
            installed,
            uninstalled,
        };
        tracing::info!(
            added = result.added.len(),
            updated = result.updated.len(),
            installed = result.installed.len(),
            uninstalled = result.uninstalled.len(),
            "sync complete"
        );
        Ok(result)
    }

    /// Remote pass only. Returns the added and updated entry IDs.
    pub async fn sync_from_remote(&mut self) -> Result<(BTreeSet<EntryId>, BTreeSet<EntryId>)> {
        self.reload().await?;
        self.remote_pass().await
    }

    /// Local pass only. Returns the installed and uninstalled entry IDs.
    pub async fn sync_local_only(&mut self) -> Result<(BTreeSet<EntryId>, BTreeSet<EntryId>)> {
        self.reload().await?;
        self.local_pass().await
    }

    async fn remote_pass(&self) -> Result<(BTreeSet<EntryId>, BTreeSet<EntryId>)> {
        sync_from_remote(&self.repo, &self.snapshot, self.catalog.as_ref(), self.media.as_ref(), &self.policy).await
    }

    async fn local_pass(&self) -> Result<(BTreeSet<EntryId>, BTreeSet<EntryId>)> {
        sync_local(&self.repo, &self.snapshot, &self.integrations).await
    }
}
