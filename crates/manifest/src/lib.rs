//! Parsing of the files Steam writes to describe its installations.
//!
//! The scanner only needs one fact per manifest (is this app installed?), but
//! the answer hinges on a loosely specified text format, so parsing lives in
//! its own crate with no knowledge of where files come from.

mod consts;
pub mod error;
mod library;
mod manifest;
pub mod models;
pub mod vdf;

pub use crate::library::parse_library_folders;
pub use crate::manifest::{is_manifest_file_name, parse_manifest, read_manifest};
pub use crate::models::ManifestRecord;
