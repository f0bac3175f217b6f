//! Catalog wire format.
//!
//! The service answers with `{"games": [...]}`. Each game carries `slug`,
//! `name`, `year`, `updated` (RFC 3339) and `steamid`, any of which may be
//! `null` or absent.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use rslug::slugify;
use serde::Deserialize;
use time::{OffsetDateTime, UtcDateTime};

/// One game as described by the remote catalog.
///
/// Several entries may share a slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub slug: String,
    pub name: String,
    pub year: Option<i32>,
    /// Last modification on the service, truncated to whole seconds.
    pub updated_at: Option<UtcDateTime>,
    pub platform_id: Option<String>,
}

// Games are decoded one by one so a single malformed game can't take the
// whole library down with it.
#[derive(Deserialize)]
struct LibraryDocument {
    games: Vec<serde_json::Value>,
}

#[derive(Deserialize)]
struct WireGame {
    #[serde(default)]
    slug: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    year: Option<i32>,
    #[serde(default, alias = "updated_at", with = "time::serde::rfc3339::option")]
    updated: Option<OffsetDateTime>,
    #[serde(default, alias = "platform_id")]
    steamid: Option<WireId>,
}

// The service has sent app IDs both as numbers and as strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireId {
    Number(u64),
    Text(String),
}

impl WireGame {
    fn decode(value: serde_json::Value) -> Option<Self> {
        let slug = value.get("slug").and_then(serde_json::Value::as_str).unwrap_or_default().to_string();
        match serde_json::from_value(value) {
            Ok(game) => Some(game),
            Err(err) => {
                tracing::warn!(%slug, error = %err, "dropping malformed catalog entry");
                None
            },
        }
    }

    fn into_entry(self) -> Option<RemoteEntry> {
        let name = self.name.map(|n| n.trim().to_string()).unwrap_or_default();
        let slug = match self.slug.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()) {
            Some(slug) => slug,
            None if !name.is_empty() => slugify!(&name),
            None => {
                tracing::warn!("dropping catalog entry without slug or name");
                return None;
            },
        };
        let platform_id = match self.steamid {
            Some(WireId::Number(0)) | None => None,
            Some(WireId::Number(id)) => Some(id.to_string()),
            Some(WireId::Text(id)) => Some(id.trim().to_string()).filter(|id| !id.is_empty()),
        };
        Some(RemoteEntry {
            slug,
            name,
            year: self.year.filter(|year| *year > 0),
            // Stored timestamps have no sub-second part; compare like with like.
            updated_at: self.updated.and_then(|at| at.to_utc().replace_nanosecond(0).ok()),
            platform_id,
        })
    }
}

/// Parses a catalog response body.
///
/// ```
/// use ludex_remote::parse_library;
///
/// let entries = parse_library(br#"{"games": [
///     {"slug": "half-life-2", "name": "Half-Life 2", "year": 2004,
///      "updated": "2023-11-14T22:13:20.5Z", "steamid": 220}
/// ]}"#).unwrap();
/// assert_eq!(entries[0].platform_id.as_deref(), Some("220"));
/// assert_eq!(entries[0].updated_at.unwrap().unix_timestamp(), 1_700_000_000);
/// ```
pub fn parse_library(body: &[u8]) -> Result<Vec<RemoteEntry>> {
    let document: LibraryDocument = serde_json::from_slice(body).or_raise(|| ErrorKind::InvalidResponse)?;
    Ok(document.games.into_iter().filter_map(WireGame::decode).filter_map(WireGame::into_entry).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_full_entry() {
        let entries = parse_library(
            br#"{"games": [{
                "slug": "portal",
                "name": "Portal",
                "year": 2007,
                "updated": "2024-01-01T00:00:00+01:00",
                "steamid": "400"
            }]}"#,
        )
        .unwrap();
        assert_eq!(
            entries,
            vec![RemoteEntry {
                slug: "portal".to_string(),
                name: "Portal".to_string(),
                year: Some(2007),
                updated_at: Some(UtcDateTime::from_unix_timestamp(1_704_063_600).unwrap()),
                platform_id: Some("400".to_string()),
            }]
        );
    }

    #[test]
    fn test_nulls_and_missing_fields() {
        let entries =
            parse_library(br#"{"games": [{"slug": "doom", "name": null, "year": null, "updated": null}]}"#).unwrap();
        assert_eq!(entries[0].name, "");
        assert_eq!(entries[0].year, None);
        assert_eq!(entries[0].updated_at, None);
        assert_eq!(entries[0].platform_id, None);
    }

    #[test]
    fn test_slug_derived_from_name() {
        let entries = parse_library(br#"{"games": [{"slug": "", "name": "Half-Life 2"}]}"#).unwrap();
        assert_eq!(entries[0].slug, "half-life-2");
    }

    #[test]
    fn test_nameless_slugless_entries_are_dropped() {
        let entries = parse_library(br#"{"games": [{"slug": " ", "name": ""}, {"slug": "quake"}]}"#).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].slug, "quake");
    }

    #[rstest]
    #[case::bad_timestamp(r#"{"slug": "x", "updated": "yesterday"}"#)]
    #[case::year_out_of_range(r#"{"slug": "x", "year": 99999999999}"#)]
    #[case::wrong_type(r#"{"slug": "x", "name": ["Portal"]}"#)]
    #[case::not_an_object(r#""x""#)]
    fn test_malformed_game_is_dropped_alone(#[case] game: &str) {
        let body = format!(r#"{{"games": [{game}, {{"slug": "quake", "year": 1996}}]}}"#);
        let entries = parse_library(body.as_bytes()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].slug, "quake");
        assert_eq!(entries[0].year, Some(1996));
    }

    #[test]
    fn test_duplicate_slugs_are_kept() {
        let entries = parse_library(br#"{"games": [{"slug": "quake"}, {"slug": "quake", "year": 1996}]}"#).unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[rstest]
    #[case::zero("0", None)]
    #[case::number("220", Some("220"))]
    #[case::string(r#""220""#, Some("220"))]
    #[case::empty_string(r#""""#, None)]
    fn test_platform_ids(#[case] raw: &str, #[case] expected: Option<&str>) {
        let body = format!(r#"{{"games": [{{"slug": "x", "steamid": {raw}}}]}}"#);
        let entries = parse_library(body.as_bytes()).unwrap();
        assert_eq!(entries[0].platform_id.as_deref(), expected);
    }

    #[test]
    fn test_alternative_field_names() {
        let entries = parse_library(
            br#"{"games": [{"slug": "x", "updated_at": "2023-11-14T22:13:20Z", "platform_id": "70"}]}"#,
        )
        .unwrap();
        assert_eq!(entries[0].updated_at.unwrap().unix_timestamp(), 1_700_000_000);
        assert_eq!(entries[0].platform_id.as_deref(), Some("70"));
    }

    #[rstest]
    #[case::not_json(b"<html>maintenance</html>".as_slice())]
    #[case::wrong_shape(br#"[{"slug": "x"}]"#.as_slice())]
    #[case::games_not_a_list(br#"{"games": {"slug": "x"}}"#.as_slice())]
    fn test_invalid_documents(#[case] body: &[u8]) {
        let err = parse_library(body).unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidResponse);
    }
}
