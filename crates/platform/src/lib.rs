//! Discovery of installed games on the local machine.
//!
//! A [`PlatformRoot`] knows where a platform client keeps its manifests; the
//! [`scan`] functions turn those directories into the set of platform IDs that
//! are fully installed right now.

mod consts;
pub mod error;
mod root;
pub mod scan;

pub use crate::root::{PlatformRoot, RootHandle, SteamRoot};
pub use crate::scan::{ScanEvent, scan_installed, scan_stream};
