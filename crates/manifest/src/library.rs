//! `libraryfolders.vdf` parsing.
//!
//! Steam lets users spread installations across several "library folders";
//! the list lives in `steamapps/libraryfolders.vdf`. Two layouts exist in the
//! wild:
//!
//! ```text
//! "LibraryFolders"                "libraryfolders"
//! {                               {
//!     "TimeNextStatsReport" "..."     "0" { "path" "/home/me/.steam" ... }
//!     "1"  "/mnt/games"               "1" { "path" "/mnt/games" ... }
//! }                               }
//! ```
//!
//! Only the numbered entries are folders; everything else is bookkeeping.

use exn::OptionExt;

use crate::error::{ErrorKind, Result};
use crate::vdf::{self, Value};

/// Returns the library folder paths listed in a `libraryfolders.vdf`, in file
/// order, exactly as Steam wrote them (no path translation).
///
/// # Examples
///
/// ```
/// use ludex_manifest::parse_library_folders;
///
/// let folders = parse_library_folders(r#"
///     "libraryfolders"
///     {
///         "0" { "path" "/home/me/.local/share/Steam" }
///         "1" { "path" "/mnt/games" }
///     }
/// "#).unwrap();
/// assert_eq!(folders, vec!["/home/me/.local/share/Steam", "/mnt/games"]);
/// ```
pub fn parse_library_folders(data: impl AsRef<[u8]>) -> Result<Vec<String>> {
    let text = String::from_utf8_lossy(data.as_ref());
    let document = vdf::parse(&text)?;
    let root = document
        .get_block("libraryfolders")
        .ok_or_raise(|| ErrorKind::MissingField("libraryfolders"))?;
    let mut folders = Vec::new();
    for (key, value) in root.iter() {
        if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }
        let path = match value {
            Value::String(path) => Some(path.as_str()),
            Value::Block(block) => block.get_str("path"),
        };
        match path.map(str::trim).filter(|p| !p.is_empty()) {
            Some(path) => folders.push(path.to_string()),
            None => tracing::debug!(key, "library folder entry without a path"),
        }
    }
    Ok(folders)
}
