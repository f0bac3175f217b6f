mod cli;

use crate::cli::{Cli, Command, SyncArgs};
use clap::Parser;
use ludex_config::{Config, IntegrationConfig, IntegrationKind};
use ludex_platform::{RootHandle, SteamRoot, scan_installed};
use ludex_remote::{CatalogHandle, HttpCatalog, HttpMedia, MediaHandle, NoCatalog, NoMedia};
use ludex_store::{Database, Repository};
use ludex_sync::{Integration, Integrations, SyncPolicy};
use miette::Result;
use std::fmt::Debug;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// `exn` errors carry their whole context tree in `Debug`.
fn report<E: Debug>(err: E) -> miette::Report {
    miette::miette!("{err:?}")
}

fn init_tracing(cli: &Cli) {
    let filter = match cli.log_level() {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn root_for(integration: &IntegrationConfig) -> RootHandle {
    match integration.kind {
        IntegrationKind::Native => Arc::new(SteamRoot::native(&integration.runner, &integration.root)),
        IntegrationKind::Wine => Arc::new(SteamRoot::wine(&integration.runner, &integration.root)),
    }
}

fn integrations(config: &Config) -> Integrations {
    config
        .integrations
        .iter()
        .map(|integration| Integration::new(root_for(integration), integration.requires_config_path))
        .collect()
}

fn catalog(config: &Config) -> Result<CatalogHandle> {
    let remote = &config.remote;
    let Some(username) = remote.username.as_deref() else {
        tracing::info!("no remote username configured, skipping remote catalog");
        return Ok(Arc::new(NoCatalog));
    };
    let catalog = HttpCatalog::new(&remote.base_url, username, remote.token.clone(), remote.timeout()).map_err(report)?;
    Ok(Arc::new(catalog))
}

async fn open_library(config: &Config) -> Result<(Database, Repository)> {
    let db = Database::connect(&config.database.path).await.map_err(report)?;
    let repo = Repository::from(&db);
    Ok((db, repo))
}

async fn run_sync(config: &Config, args: &SyncArgs) -> Result<()> {
    let (db, repo) = open_library(config).await?;
    let http_media = if config.media.enabled {
        let media = HttpMedia::new(
            &config.remote.media_url,
            &config.media.banner_dir,
            &config.media.icon_dir,
            config.remote.timeout(),
        )
        .map_err(report)?;
        Some(Arc::new(media))
    } else {
        None
    };
    let media: MediaHandle = match &http_media {
        Some(media) => media.clone() as MediaHandle,
        None => Arc::new(NoMedia),
    };
    let policy = SyncPolicy {
        remote_timeout: config.remote.timeout(),
        backfill: config.sync.backfill_fields.iter().copied().collect(),
    };
    let mut sync = ludex_sync::Sync::new(repo, catalog(config)?, media, integrations(config), policy);

    let outcome = if args.local_only {
        sync.sync_local_only().await.map(|(installed, uninstalled)| {
            println!("installed: {}", installed.len());
            println!("uninstalled: {}", uninstalled.len());
        })
    } else if args.remote_only {
        sync.sync_from_remote().await.map(|(added, updated)| {
            println!("added: {}", added.len());
            println!("updated: {}", updated.len());
        })
    } else {
        sync.run_full_sync().await.map(|result| {
            println!("added: {}", result.added.len());
            println!("updated: {}", result.updated.len());
            println!("installed: {}", result.installed.len());
            println!("uninstalled: {}", result.uninstalled.len());
        })
    };

    if let Some(media) = http_media {
        media.finish().await;
    }
    db.close().await;
    outcome.map_err(report)
}

async fn run_scan(config: &Config, runner: &str) -> Result<()> {
    let Some(integration) = config.integrations.iter().find(|integration| integration.runner == runner) else {
        miette::bail!("no integration configured for runner {runner:?}");
    };
    let root = root_for(integration);
    if !root.is_present().await {
        tracing::warn!(%runner, root = %integration.root.display(), "platform client not found");
    }
    for platform_id in scan_installed(root.as_ref()).await {
        println!("{platform_id}");
    }
    Ok(())
}

async fn run_list(config: &Config) -> Result<()> {
    let (db, repo) = open_library(config).await?;
    let entries = repo.list_entries().await.map_err(report);
    db.close().await;
    for entry in entries? {
        let state = match (&entry.runner, entry.installed) {
            (Some(runner), true) => format!("installed ({runner})"),
            _ => "-".to_string(),
        };
        let platform_id = entry.platform_id.as_deref().unwrap_or("-");
        let year = entry.year.map(|year| year.to_string()).unwrap_or_else(|| "-".to_string());
        println!("{}\t{}\t{year}\t{platform_id}\t{state}", entry.slug, entry.name);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);
    let config = Config::load(cli.config.as_deref()).map_err(report)?;
    tracing::debug!(database = %config.database.path.display(), integrations = config.integrations.len(), "configuration loaded");

    match &cli.command {
        Command::Sync(args) => run_sync(&config, args).await,
        Command::Scan { runner } => run_scan(&config, runner).await,
        Command::List => run_list(&config).await,
    }
}
