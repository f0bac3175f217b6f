use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ludex", version, about = "Keep a local game library in step with a remote catalog and installed games")]
pub struct Cli {
    /// Configuration file (TOML, YAML or JSON). Defaults to `config.*` in the
    /// user configuration directory.
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// More logging; repeat for trace output. Overrides `RUST_LOG`.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Reconcile the library with the remote catalog and installed games
    Sync(SyncArgs),
    /// Print the platform IDs one runner integration has installed
    Scan {
        /// Runner name, as configured under `integrations`
        runner: String,
    },
    /// Print every game in the local library
    List,
}

#[derive(Args)]
pub struct SyncArgs {
    /// Only update install state from local manifests
    #[arg(long, conflicts_with = "remote_only")]
    pub local_only: bool,

    /// Only merge the remote catalog
    #[arg(long)]
    pub remote_only: bool,
}

impl Cli {
    /// Log filter implied by `--verbose`, if given.
    pub fn log_level(&self) -> Option<&'static str> {
        match self.verbose {
            0 => None,
            1 => Some("debug"),
            _ => Some("trace"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rstest::rstest;

    #[test]
    fn test_definition() {
        Cli::command().debug_assert();
    }

    #[rstest]
    #[case(&["ludex", "sync"], false, false)]
    #[case(&["ludex", "sync", "--local-only"], true, false)]
    #[case(&["ludex", "-v", "sync", "--remote-only"], false, true)]
    fn test_sync_flags(#[case] args: &[&str], #[case] local_only: bool, #[case] remote_only: bool) {
        let cli = Cli::try_parse_from(args).unwrap();
        let Command::Sync(sync) = cli.command else { panic!("expected sync") };
        assert_eq!(sync.local_only, local_only);
        assert_eq!(sync.remote_only, remote_only);
    }

    #[test]
    fn test_sync_modes_conflict() {
        assert!(Cli::try_parse_from(["ludex", "sync", "--local-only", "--remote-only"]).is_err());
    }

    #[rstest]
    #[case(&["ludex", "list"], None)]
    #[case(&["ludex", "-v", "list"], Some("debug"))]
    #[case(&["ludex", "list", "-vvv"], Some("trace"))]
    fn test_log_level(#[case] args: &[&str], #[case] expected: Option<&str>) {
        assert_eq!(Cli::try_parse_from(args).unwrap().log_level(), expected);
    }

    #[test]
    fn test_scan_and_config() {
        let cli = Cli::try_parse_from(["ludex", "scan", "steam", "--config", "/etc/ludex.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/ludex.toml")));
        assert!(matches!(cli.command, Command::Scan { runner } if runner == "steam"));
    }
}
