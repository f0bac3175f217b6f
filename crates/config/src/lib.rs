//! Configuration for ludex.
//!
//! Sources, lowest precedence first:
//!
//! 1. built-in defaults (platform-specific paths from `directories`),
//! 2. `config.toml`, `config.yaml` and `config.json` in the project config
//!    directory, or a single explicitly named file,
//! 3. `LUDEX_`-prefixed environment variables, with `__` separating nested
//!    keys (`LUDEX_REMOTE__USERNAME=gordon`).

pub mod error;
mod load;
mod models;

pub use crate::load::ENV_PREFIX;
pub use crate::models::{
    Config, DatabaseConfig, IntegrationConfig, IntegrationKind, MediaConfig, RemoteConfig, SyncConfig,
};
pub use ludex_store::BackfillField;
