//! The remote half of the library: the catalog service that knows which games
//! a user owns, and the media (banners, icons) that go with them.

mod catalog;
pub mod error;
mod media;
mod models;

#[cfg(feature = "mock")]
pub use crate::catalog::MockCatalog;
pub use crate::catalog::{CatalogHandle, HttpCatalog, NoCatalog, RemoteCatalog};
#[cfg(feature = "mock")]
pub use crate::media::RecordingMedia;
pub use crate::media::{HttpMedia, MediaHandle, MediaRefresh, NoMedia};
pub use crate::models::{RemoteEntry, parse_library};
