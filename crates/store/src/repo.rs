//! Repository for library entries.
//!
//! Every method is a single atomic operation against the store; the sync
//! engine decides *what* to change, this only decides *how*.

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::models::{EntryFields, EntryId, EntryRow, LibraryEntry, NewEntry};
use exn::ResultExt;
use sqlx::SqlitePool;
use time::UtcDateTime;
use tracing::instrument;

/// Repository for reading and mutating [`LibraryEntry`] rows.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}
impl From<&Database> for Repository {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}
impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Read
    // =========================================================================

    /// All entries in the library, oldest first.
    pub async fn list_entries(&self) -> Result<Vec<LibraryEntry>> {
        let rows: Vec<EntryRow> = sqlx::query_as(include_str!("../queries/list_entries.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(LibraryEntry::try_from).collect()
    }

    /// The entry with the given slug, if any.
    pub async fn find_by_slug(&self, slug: impl AsRef<str>) -> Result<Option<LibraryEntry>> {
        let row: Option<EntryRow> = sqlx::query_as(include_str!("../queries/find_by_slug.sql"))
            .bind(slug.as_ref())
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(LibraryEntry::try_from).transpose()
    }

    // =========================================================================
    // Write
    // =========================================================================

    /// Create every entry in one transaction.
    ///
    /// Slugs that already exist are left untouched and contribute no ID, so
    /// the returned IDs are exactly the rows created. If any insert fails,
    /// nothing is created.
    #[instrument(skip_all, fields(count = entries.len()))]
    pub async fn insert_many(&self, entries: &[NewEntry]) -> Result<Vec<EntryId>> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        let mut ids = Vec::with_capacity(entries.len());
        for entry in entries {
            let id: Option<(i64,)> = sqlx::query_as(include_str!("../queries/insert_entry.sql"))
                .bind(&entry.slug)
                .bind(entry.fields.name.as_deref())
                .bind(entry.fields.year)
                .bind(entry.fields.updated_at.map(UtcDateTime::unix_timestamp))
                .bind(entry.fields.platform_id.as_deref())
                .fetch_optional(&mut *tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
            match id {
                Some((id,)) => ids.push(EntryId(id)),
                None => tracing::debug!(slug = %entry.slug, "entry already exists, not inserted"),
            }
        }
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        Ok(ids)
    }

    /// Apply `fields` to the entry with `slug`, creating it if needed.
    ///
    /// Fields that are `None` keep their stored value.
    pub async fn upsert(&self, slug: impl AsRef<str>, fields: &EntryFields) -> Result<EntryId> {
        let (id,): (i64,) = sqlx::query_as(include_str!("../queries/upsert_entry.sql"))
            .bind(slug.as_ref())
            .bind(fields.name.as_deref())
            .bind(fields.year)
            .bind(fields.updated_at.map(UtcDateTime::unix_timestamp))
            .bind(fields.platform_id.as_deref())
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(EntryId(id))
    }

    /// Record that `entry` is installed by `runner` as `platform_id`.
    ///
    /// Keeps the entry's existing `config_path`, or assigns
    /// `<slug>-<unix seconds>` when it has none. Returns the config path.
    pub async fn mark_installed(
        &self,
        entry: &LibraryEntry,
        runner: impl AsRef<str>,
        platform_id: impl AsRef<str>,
    ) -> Result<String> {
        let config_path = entry
            .config_path
            .clone()
            .unwrap_or_else(|| format!("{}-{}", entry.slug, UtcDateTime::now().unix_timestamp()));
        let result = sqlx::query(include_str!("../queries/mark_installed.sql"))
            .bind(entry.id.0)
            .bind(runner.as_ref())
            .bind(platform_id.as_ref())
            .bind(&config_path)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        if result.rows_affected() == 0 {
            exn::bail!(ErrorKind::NotFound(entry.slug.clone()));
        }
        Ok(config_path)
    }

    /// Record that `entry` is no longer installed, releasing its runner.
    pub async fn mark_uninstalled(&self, entry: &LibraryEntry) -> Result<()> {
        let result = sqlx::query(include_str!("../queries/mark_uninstalled.sql"))
            .bind(entry.id.0)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        if result.rows_affected() == 0 {
            exn::bail!(ErrorKind::NotFound(entry.slug.clone()));
        }
        Ok(())
    }
}
