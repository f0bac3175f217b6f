use crate::error::{Error, ErrorKind};
use crate::models::{EntryId, LibraryEntry};
use exn::ResultExt;
use time::UtcDateTime;

#[derive(sqlx::FromRow)]
pub(crate) struct EntryRow {
    id: i64,
    slug: String,
    name: String,
    runner: Option<String>,
    platform_id: Option<String>,
    installed: bool,
    config_path: Option<String>,
    updated_at: Option<i64>,
    year: Option<i64>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl TryFrom<EntryRow> for LibraryEntry {
    type Error = Error;
    fn try_from(row: EntryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: EntryId(row.id),
            slug: row.slug,
            name: row.name,
            runner: non_empty(row.runner),
            platform_id: non_empty(row.platform_id),
            installed: row.installed,
            config_path: non_empty(row.config_path),
            updated_at: row
                .updated_at
                .map(UtcDateTime::from_unix_timestamp)
                .transpose()
                .or_raise(|| ErrorKind::InvalidData("updated_at"))?,
            year: row.year.map(i32::try_from).transpose().or_raise(|| ErrorKind::InvalidData("year"))?,
        })
    }
}
