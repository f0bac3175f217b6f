use derive_more::Display;
use serde::{Deserialize, Serialize};
use time::UtcDateTime;

/// Store-assigned identifier of a library entry.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryId(pub i64);

/// A game in the local library.
///
/// Optional text columns are normalised on read: an empty `runner`,
/// `platform_id` or `config_path` is reported as `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryEntry {
    pub id: EntryId,
    /// Unique across the library.
    pub slug: String,
    pub name: String,
    /// Runner integration that owns the installation.
    pub runner: Option<String>,
    /// Identifier in the owning platform's namespace.
    pub platform_id: Option<String>,
    pub installed: bool,
    pub config_path: Option<String>,
    /// Last catalog modification merged into this entry (whole seconds).
    pub updated_at: Option<UtcDateTime>,
    pub year: Option<i32>,
}

/// Catalog fields carried by inserts and upserts.
///
/// On upsert, `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryFields {
    pub name: Option<String>,
    pub year: Option<i32>,
    pub updated_at: Option<UtcDateTime>,
    pub platform_id: Option<String>,
}

impl EntryFields {
    /// `true` if applying these fields would change nothing.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.year.is_none() && self.updated_at.is_none() && self.platform_id.is_none()
    }
}

/// A catalog field that may be filled in on an existing entry when it is
/// empty locally and known remotely.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackfillField {
    #[display("name")]
    Name,
    #[display("year")]
    Year,
    #[display("platform_id")]
    PlatformId,
    #[display("updated_at")]
    UpdatedAt,
}

impl BackfillField {
    pub const ALL: [Self; 4] = [Self::Name, Self::Year, Self::PlatformId, Self::UpdatedAt];
}

/// A library entry to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub slug: String,
    pub fields: EntryFields,
}
