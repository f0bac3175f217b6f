use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::error::{Error, ErrorKind};
use exn::ResultExt;

/// A single bit of Steam's `StateFlags` bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppState {
    Uninstalled,
    UpdateRequired,
    FullyInstalled,
    Encrypted,
    Locked,
    FilesMissing,
    AppRunning,
    FilesCorrupt,
    UpdateRunning,
    UpdatePaused,
    UpdateStarted,
    Uninstalling,
    BackupRunning,
    Reconfiguring,
    Validating,
    AddingFiles,
    Preallocating,
    Downloading,
    Staging,
    Committing,
    UpdateStopping,
}
impl AppState {
    pub const ALL: [AppState; 21] = [
        AppState::Uninstalled,
        AppState::UpdateRequired,
        AppState::FullyInstalled,
        AppState::Encrypted,
        AppState::Locked,
        AppState::FilesMissing,
        AppState::AppRunning,
        AppState::FilesCorrupt,
        AppState::UpdateRunning,
        AppState::UpdatePaused,
        AppState::UpdateStarted,
        AppState::Uninstalling,
        AppState::BackupRunning,
        AppState::Reconfiguring,
        AppState::Validating,
        AppState::AddingFiles,
        AppState::Preallocating,
        AppState::Downloading,
        AppState::Staging,
        AppState::Committing,
        AppState::UpdateStopping,
    ];

    /// The bit this state occupies in `StateFlags`.
    pub fn bit(&self) -> u32 {
        match self {
            AppState::Uninstalled => 1,
            AppState::UpdateRequired => 1 << 1,
            AppState::FullyInstalled => 1 << 2,
            AppState::Encrypted => 1 << 3,
            AppState::Locked => 1 << 4,
            AppState::FilesMissing => 1 << 5,
            AppState::AppRunning => 1 << 6,
            AppState::FilesCorrupt => 1 << 7,
            AppState::UpdateRunning => 1 << 8,
            AppState::UpdatePaused => 1 << 9,
            AppState::UpdateStarted => 1 << 10,
            AppState::Uninstalling => 1 << 11,
            AppState::BackupRunning => 1 << 12,
            // Bits 13 to 15 are unused.
            AppState::Reconfiguring => 1 << 16,
            AppState::Validating => 1 << 17,
            AppState::AddingFiles => 1 << 18,
            AppState::Preallocating => 1 << 19,
            AppState::Downloading => 1 << 20,
            AppState::Staging => 1 << 21,
            AppState::Committing => 1 << 22,
            AppState::UpdateStopping => 1 << 23,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AppState::Uninstalled => "Uninstalled",
            AppState::UpdateRequired => "Update Required",
            AppState::FullyInstalled => "Fully Installed",
            AppState::Encrypted => "Encrypted",
            AppState::Locked => "Locked",
            AppState::FilesMissing => "Files Missing",
            AppState::AppRunning => "App Running",
            AppState::FilesCorrupt => "Files Corrupt",
            AppState::UpdateRunning => "Update Running",
            AppState::UpdatePaused => "Update Paused",
            AppState::UpdateStarted => "Update Started",
            AppState::Uninstalling => "Uninstalling",
            AppState::BackupRunning => "Backup Running",
            AppState::Reconfiguring => "Reconfiguring",
            AppState::Validating => "Validating",
            AppState::AddingFiles => "Adding Files",
            AppState::Preallocating => "Preallocating",
            AppState::Downloading => "Downloading",
            AppState::Staging => "Staging",
            AppState::Committing => "Committing",
            AppState::UpdateStopping => "Update Stopping",
        }
    }
}
impl Display for AppState {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// The raw `StateFlags` bitmask of an app manifest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateFlags(pub u32);
impl StateFlags {
    pub fn contains(&self, state: AppState) -> bool {
        self.0 & state.bit() != 0
    }

    /// Every known state whose bit is set, in bit order.
    pub fn states(&self) -> Vec<AppState> {
        AppState::ALL.into_iter().filter(|s| self.contains(*s)).collect()
    }

    /// Whether the game can be launched from disk right now.
    ///
    /// Steam keeps `FullyInstalled` set while patching, so an installed game
    /// with an update in flight still counts; one being removed does not.
    pub fn is_installed(&self) -> bool {
        self.contains(AppState::FullyInstalled) && !self.contains(AppState::Uninstalling)
    }
}
impl FromStr for StateFlags {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u32>().map(StateFlags).or_raise(|| ErrorKind::InvalidField {
            field: "StateFlags",
            value: s.to_string(),
        })
    }
}
