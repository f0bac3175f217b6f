//! Opening the library database.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use sqlx::SqliteConnection;
use sqlx::sqlite::{
    SqliteAutoVacuum, SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::path::Path;
use std::time::Duration;
use tracing::instrument;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

// A sync pass is sequential; the spare connections let `ludex list` read
// while another process writes.
const FILE_CONNECTIONS: u32 = 3;
// A desktop client may hold the write lock while it saves a game.
const BUSY_TIMEOUT: Duration = Duration::from_millis(1500);

/// Settings sqlx has no builder method for. Run on every new connection.
const CONNECTION_PRAGMAS: &str = "
    PRAGMA wal_autocheckpoint = 400;
    PRAGMA cache_size = -2048;
    PRAGMA temp_store = MEMORY;
";

/// Connection pool for the library store, migrated to the current schema.
///
/// Queries go through [`Repository`](crate::Repository).
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open the library at `path`, creating the file and its parent
    /// directory if needed.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.or_raise(|| ErrorKind::Database)?;
        }
        let options = connect_options().filename(path).create_if_missing(true);
        Self::open(options, FILE_CONNECTIONS).await
    }

    /// Open a private in-memory library. Not gated on `cfg(test)` so other
    /// crates' tests can use it.
    pub async fn connect_in_memory() -> Result<Self> {
        // Every connection to ":memory:" is its own database, so the pool
        // must never hold more than one.
        Self::open(connect_options().filename(":memory:"), 1).await
    }

    async fn open(options: SqliteConnectOptions, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .after_connect(|conn, _meta| Box::pin(async move { apply_pragmas(conn).await }))
            .connect_with(options)
            .await
            .or_raise(|| ErrorKind::Database)?;
        MIGRATOR.run(&pool).await.or_raise(|| ErrorKind::Migration)?;
        tracing::debug!(max_connections, "library database ready");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close every connection. The database must not be used afterwards;
    /// repositories created from it fail with [`ErrorKind::Database`].
    pub async fn close(&self) {
        _ = sqlx::query("PRAGMA optimize").execute(&self.pool).await;
        self.pool.close().await;
    }
}

fn connect_options() -> SqliteConnectOptions {
    SqliteConnectOptions::new()
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        .busy_timeout(BUSY_TIMEOUT)
        // Rows are rewritten on every sync but almost never deleted.
        .auto_vacuum(SqliteAutoVacuum::None)
}

async fn apply_pragmas(conn: &mut SqliteConnection) -> sqlx::Result<()> {
    sqlx::Executor::execute(&mut *conn, sqlx::raw_sql(CONNECTION_PRAGMAS)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::foreign_keys("PRAGMA foreign_keys", 1)]
    #[case::checkpoint("PRAGMA wal_autocheckpoint", 400)]
    #[case::cache("PRAGMA cache_size", -2048)]
    #[tokio::test]
    async fn test_connection_settings(#[case] pragma: &str, #[case] expected: i64) {
        let db = Database::connect_in_memory().await.unwrap();
        let (value,): (i64,) = sqlx::query_as(pragma).fetch_one(db.pool()).await.unwrap();
        assert_eq!(value, expected);
    }

    #[tokio::test]
    async fn test_file_database_uses_wal() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db = Database::connect(temp_dir.path().join("library.db")).await.unwrap();
        let (mode,): (String,) = sqlx::query_as("PRAGMA journal_mode").fetch_one(db.pool()).await.unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
        db.close().await;
    }

    #[tokio::test]
    async fn test_connect_creates_parent_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested/data/library.db");
        let db = Database::connect(&path).await.unwrap();
        assert!(path.is_file());
        let (games,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM games").fetch_one(db.pool()).await.unwrap();
        assert_eq!(games, 0);
        db.close().await;
    }

    #[tokio::test]
    async fn test_library_survives_reopen() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("library.db");
        let db = Database::connect(&path).await.unwrap();
        sqlx::query("INSERT INTO games (slug, name) VALUES ('quake', 'Quake')").execute(db.pool()).await.unwrap();
        db.close().await;

        // Reopening reruns the migrator against an up-to-date schema.
        let db = Database::connect(&path).await.unwrap();
        let (name,): (String,) =
            sqlx::query_as("SELECT name FROM games WHERE slug = 'quake'").fetch_one(db.pool()).await.unwrap();
        assert_eq!(name, "Quake");
        db.close().await;
    }

    #[tokio::test]
    async fn test_closed_database_rejects_queries() {
        let db = Database::connect_in_memory().await.unwrap();
        db.close().await;
        assert!(db.pool().is_closed());
        assert!(sqlx::query("SELECT 1").execute(db.pool()).await.is_err());
    }
}
