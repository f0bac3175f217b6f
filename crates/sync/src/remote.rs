//! Merging the remote catalog into the local library.
//!
//! Games the catalog knows and the library doesn't are created in one batch.
//! Games both know about are then updated in one of two ways:
//!
//! - **Stale**: the catalog entry was modified after the local copy. Its
//!   metadata replaces the local metadata (except a non-empty local name) and
//!   the artwork is refreshed.
//! - **Backfill**: the local copy is current, but some allowlisted fields are
//!   empty locally and known remotely. Only those fields are filled in; the
//!   artwork is left alone.

use crate::error::{ErrorKind, Result};
use crate::models::SyncPolicy;
use crate::snapshot::Snapshot;
use exn::ResultExt;
use ludex_remote::{MediaRefresh, RemoteCatalog, RemoteEntry};
use ludex_store::{BackfillField, EntryFields, EntryId, LibraryEntry, NewEntry, Repository};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::time::Duration;
use tracing::instrument;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UpdateKind {
    Stale,
    Backfill,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Update {
    slug: String,
    kind: UpdateKind,
    fields: EntryFields,
}

/// Apply the remote catalog to the library described by `snapshot`.
///
/// Returns the IDs of the entries created and of the entries updated. The two
/// sets are disjoint: only slugs already in `snapshot` are considered for
/// updates.
///
/// A catalog that fails or outlasts [`SyncPolicy::remote_timeout`] is treated
/// as empty. Any store failure aborts the pass; entries created before it
/// stay created.
#[instrument(skip_all, fields(local = snapshot.len()))]
pub async fn sync_from_remote(
    repo: &Repository,
    snapshot: &Snapshot,
    catalog: &dyn RemoteCatalog,
    media: &dyn MediaRefresh,
    policy: &SyncPolicy,
) -> Result<(BTreeSet<EntryId>, BTreeSet<EntryId>)> {
    let remote = fetch_remote(catalog, policy.remote_timeout).await;
    if remote.is_empty() {
        return Ok(Default::default());
    }

    let missing = plan_inserts(snapshot, &remote);
    let added: BTreeSet<EntryId> =
        repo.insert_many(&missing).await.or_raise(|| ErrorKind::Store)?.into_iter().collect();
    for entry in &missing {
        tracing::info!(slug = %entry.slug, "added from remote catalog");
    }

    let mut updated = BTreeSet::new();
    for update in plan_updates(snapshot, &remote, &policy.backfill) {
        let id = repo.upsert(&update.slug, &update.fields).await.or_raise(|| ErrorKind::Store)?;
        updated.insert(id);
        match update.kind {
            UpdateKind::Stale => {
                tracing::info!(slug = %update.slug, "updated from remote catalog");
                media.refresh_media(&update.slug);
            },
            UpdateKind::Backfill => tracing::info!(slug = %update.slug, "backfilled from remote catalog"),
        }
    }

    tracing::debug!(added = added.len(), updated = updated.len(), "remote pass complete");
    Ok((added, updated))
}

async fn fetch_remote(catalog: &dyn RemoteCatalog, timeout: Duration) -> Vec<RemoteEntry> {
    match tokio::time::timeout(timeout, catalog.fetch_library()).await {
        Ok(Ok(entries)) => {
            tracing::debug!(remote = entries.len(), "fetched remote catalog");
            entries
        },
        Ok(Err(err)) => {
            tracing::warn!(error = ?err, retryable = err.is_retryable(), "remote catalog unavailable, skipping");
            Vec::new()
        },
        Err(_) => {
            tracing::warn!(timeout_secs = timeout.as_secs_f64(), "remote catalog timed out, skipping");
            Vec::new()
        },
    }
}

/// One new entry per slug missing from `snapshot`; the first remote entry for
/// a slug wins.
fn plan_inserts(snapshot: &Snapshot, remote: &[RemoteEntry]) -> Vec<NewEntry> {
    let mut seen = HashSet::new();
    remote
        .iter()
        .filter(|entry| !snapshot.contains(&entry.slug) && seen.insert(entry.slug.as_str()))
        .map(|entry| NewEntry {
            slug: entry.slug.clone(),
            fields: EntryFields {
                name: Some(entry.name.clone()).filter(|name| !name.is_empty()),
                year: entry.year,
                updated_at: entry.updated_at,
                platform_id: entry.platform_id.clone(),
            },
        })
        .collect()
}

/// Updates for slugs already in `snapshot`, in slug order.
fn plan_updates(snapshot: &Snapshot, remote: &[RemoteEntry], backfill: &BTreeSet<BackfillField>) -> Vec<Update> {
    newest_by_slug(remote)
        .into_iter()
        .filter_map(|(slug, remote)| {
            let local = snapshot.get(slug)?;
            decide(local, remote, backfill)
        })
        .collect()
}

/// Collapse entries sharing a slug to the most recently modified one. Ties go
/// to the earliest.
fn newest_by_slug(remote: &[RemoteEntry]) -> BTreeMap<&str, &RemoteEntry> {
    let mut newest: BTreeMap<&str, &RemoteEntry> = BTreeMap::new();
    for entry in remote {
        newest
            .entry(entry.slug.as_str())
            .and_modify(|current| {
                if entry.updated_at > current.updated_at {
                    *current = entry;
                }
            })
            .or_insert(entry);
    }
    newest
}

fn decide(local: &LibraryEntry, remote: &RemoteEntry, backfill: &BTreeSet<BackfillField>) -> Option<Update> {
    // `None` orders before any timestamp, so a remote timestamp always beats
    // a missing local one.
    if remote.updated_at > local.updated_at {
        let fields = EntryFields {
            name: (local.name.is_empty() && !remote.name.is_empty()).then(|| remote.name.clone()),
            year: remote.year,
            updated_at: remote.updated_at,
            platform_id: remote.platform_id.clone(),
        };
        return Some(Update {
            slug: local.slug.clone(),
            kind: UpdateKind::Stale,
            fields,
        });
    }

    let mut fields = EntryFields::default();
    for field in backfill {
        match field {
            BackfillField::Name if local.name.is_empty() && !remote.name.is_empty() => {
                fields.name = Some(remote.name.clone());
            },
            BackfillField::Year if local.year.is_none() => fields.year = remote.year,
            BackfillField::PlatformId if local.platform_id.is_none() => {
                fields.platform_id = remote.platform_id.clone();
            },
            BackfillField::UpdatedAt if local.updated_at.is_none() => fields.updated_at = remote.updated_at,
            _ => {},
        }
    }
    (!fields.is_empty()).then(|| Update {
        slug: local.slug.clone(),
        kind: UpdateKind::Backfill,
        fields,
    })
}
