mod record;
mod state;

pub use self::record::ManifestRecord;
pub use self::state::{AppState, StateFlags};
