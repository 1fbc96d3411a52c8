mod cli;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use sha2::{Digest, Sha256};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lenscat_core::{
    create_oracle, load_config, validate_config, BatchOrchestrator, CatalogStore, Config,
    FileEventLog, FsOrganizer, ImageDecodeValidator, JsonCatalogStore, RunSettings,
    SanitizedConfig,
};

use cli::{Cli, Commands};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    if let Err(e) = run(cli).await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run => run_engine(&cli.config).await,
        Commands::Stats => print_stats(&cli.config),
    }
}

fn load(config_path: &Path) -> Result<Config> {
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    Ok(config)
}

async fn run_engine(config_path: &Path) -> Result<()> {
    let config = load(config_path)?;
    validate_config(&config).context("Configuration validation failed")?;

    // Hash the redacted form so the key never influences what gets logged
    let sanitized = SanitizedConfig::from(&config);
    let config_json = serde_json::to_string(&sanitized).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    let config_hash_short = &config_hash[..16];

    info!("lenscat {} starting", VERSION);
    info!("Configuration: {}", config_json);
    info!("Source directory: {:?}", config.paths.source_dir);
    info!("Output directory: {:?}", config.paths.output_dir);

    let oracle = create_oracle(&config.oracle).context("Failed to create oracle")?;
    info!("Using oracle: {}", oracle.name());

    let events = Arc::new(
        FileEventLog::new(&config.paths.event_log_file).context("Failed to open event log")?,
    );
    let catalog = Arc::new(JsonCatalogStore::new(&config.paths.catalog_file));
    let organizer = Arc::new(FsOrganizer::new(config.organizer.clone()));
    let validator = Arc::new(ImageDecodeValidator::new());

    let token = CancellationToken::new();
    let orchestrator = BatchOrchestrator::new(
        RunSettings::from(&config),
        catalog,
        validator,
        oracle,
        organizer,
        events,
    )
    .with_cancellation(token.clone())
    .with_config_hash(config_hash_short);

    let signal_token = token.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Interrupt received, finishing current batch before stopping");
        signal_token.cancel();
    });

    let summary = orchestrator.run().await.context("Run failed")?;

    info!(
        batches = summary.batches,
        merged = summary.merged,
        no_key = summary.no_key,
        oracle_failed = summary.oracle_failed,
        empty_reference = summary.empty_reference,
        internal = summary.internal,
        corrupt_items = summary.corrupt_items,
        files_organized = summary.files_organized,
        files_already_present = summary.files_already_present,
        "Run {} finished: {:?}",
        summary.run_id,
        summary.stop_reason
    );
    Ok(())
}

fn print_stats(config_path: &Path) -> Result<()> {
    let config = load(config_path)?;
    let store = JsonCatalogStore::new(&config.paths.catalog_file);
    let catalog = store.inspect().context("Failed to read catalog")?;
    let stats = catalog.stats();

    println!("Catalog:      {}", store.path().display());
    println!("References:   {}", stats.entries);
    println!("Color groups: {}", stats.color_groups);
    println!("Files:        {}", stats.files);
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
