//! Point-in-time view of the local library.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use ludex_store::{LibraryEntry, Repository};
use std::collections::{BTreeMap, BTreeSet};

/// Every library entry as of one store read, keyed two ways: by slug, and by
/// the `(runner, platform_id)` pair that identifies an installation.
///
/// A snapshot never changes after it is built. Passes that mutate the store
/// reload it rather than patching it.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    by_slug: BTreeMap<String, LibraryEntry>,
    by_platform: BTreeMap<(String, String), String>,
}

impl Snapshot {
    /// Read the whole library from `repo`.
    pub async fn load(repo: &Repository) -> Result<Self> {
        let entries = repo.list_entries().await.or_raise(|| ErrorKind::Store)?;
        Ok(Self::from_entries(entries))
    }

    /// Index `entries`, keeping the first entry for any repeated slug or
    /// `(runner, platform_id)` pair.
    pub fn from_entries(entries: impl IntoIterator<Item = LibraryEntry>) -> Self {
        let mut snapshot = Self::default();
        for entry in entries {
            if snapshot.by_slug.contains_key(&entry.slug) {
                tracing::warn!(slug = %entry.slug, "duplicate slug in library, ignoring later entry");
                continue;
            }
            if let (Some(runner), Some(platform_id)) = (&entry.runner, &entry.platform_id) {
                let key = (runner.clone(), platform_id.clone());
                match snapshot.by_platform.get(&key) {
                    Some(owner) => tracing::warn!(
                        %runner,
                        %platform_id,
                        %owner,
                        slug = %entry.slug,
                        "platform ID already owned by another entry"
                    ),
                    None => {
                        snapshot.by_platform.insert(key, entry.slug.clone());
                    },
                }
            }
            snapshot.by_slug.insert(entry.slug.clone(), entry);
        }
        snapshot
    }

    pub fn get(&self, slug: &str) -> Option<&LibraryEntry> {
        self.by_slug.get(slug)
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.by_slug.contains_key(slug)
    }

    pub fn slugs(&self) -> BTreeSet<&str> {
        self.by_slug.keys().map(String::as_str).collect()
    }

    /// Entries in slug order.
    pub fn entries(&self) -> impl Iterator<Item = &LibraryEntry> {
        self.by_slug.values()
    }

    /// Slug of the entry installed by `runner` as `platform_id`, if any.
    pub fn owner_of(&self, runner: &str, platform_id: &str) -> Option<&str> {
        self.by_platform.get(&(runner.to_string(), platform_id.to_string())).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_slug.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_slug.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ludex_store::{Database, EntryFields, EntryId, NewEntry};

    fn entry(id: i64, slug: &str, runner: Option<&str>, platform_id: Option<&str>) -> LibraryEntry {
        LibraryEntry {
            id: EntryId(id),
            slug: slug.to_string(),
            name: slug.to_string(),
            runner: runner.map(str::to_string),
            platform_id: platform_id.map(str::to_string),
            installed: runner.is_some(),
            config_path: None,
            updated_at: None,
            year: None,
        }
    }

    #[test]
    fn test_indexes() {
        let snapshot = Snapshot::from_entries([
            entry(1, "portal", Some("steam"), Some("400")),
            entry(2, "quake", None, Some("2310")),
            entry(3, "doom", Some("winesteam"), Some("400")),
        ]);
        assert_eq!(snapshot.len(), 3);
        assert!(snapshot.contains("quake"));
        assert_eq!(snapshot.get("doom").map(|e| e.id), Some(EntryId(3)));
        assert_eq!(snapshot.slugs().into_iter().collect::<Vec<_>>(), vec!["doom", "portal", "quake"]);
        assert_eq!(snapshot.owner_of("steam", "400"), Some("portal"));
        assert_eq!(snapshot.owner_of("winesteam", "400"), Some("doom"));
        // No runner, so nothing owns it.
        assert_eq!(snapshot.owner_of("steam", "2310"), None);
    }

    #[test]
    fn test_duplicate_platform_keeps_first() {
        let snapshot = Snapshot::from_entries([
            entry(1, "portal", Some("steam"), Some("400")),
            entry(2, "portal-goty", Some("steam"), Some("400")),
        ]);
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.owner_of("steam", "400"), Some("portal"));
    }

    #[test]
    fn test_empty() {
        let snapshot = Snapshot::default();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.entries().count(), 0);
        assert!(snapshot.get("portal").is_none());
    }

    #[tokio::test]
    async fn test_load() {
        let db = Database::connect_in_memory().await.unwrap();
        let repo = Repository::from(&db);
        let new = |slug: &str| NewEntry {
            slug: slug.to_string(),
            fields: EntryFields::default(),
        };
        repo.insert_many(&[new("portal"), new("quake")]).await.unwrap();

        let snapshot = Snapshot::load(&repo).await.unwrap();
        assert_eq!(snapshot.slugs().into_iter().collect::<Vec<_>>(), vec!["portal", "quake"]);
    }

    #[tokio::test]
    async fn test_load_from_closed_store() {
        let db = Database::connect_in_memory().await.unwrap();
        let repo = Repository::from(&db);
        db.close().await;
        let err = Snapshot::load(&repo).await.unwrap_err();
        assert_eq!(*err, ErrorKind::Store);
    }
}
