//! Parley server - web front end for a hosted assistant with local history.

use anyhow::Result;
use clap::Parser;
use parley_server::{config, logging, routes, state};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use config::{Config, Provider};
use logging::{LogConfig, LogFormat};
use state::AppState;

#[derive(Parser, Debug)]
#[command(name = "parley-server")]
#[command(about = "Web front end for a hosted conversational assistant")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override port from config
    #[arg(short, long)]
    port: Option<u16>,

    /// Override database path from config
    #[arg(long, value_name = "FILE")]
    db: Option<PathBuf>,

    /// Answer with the offline mock assistant instead of the remote service
    #[arg(long)]
    mock: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable trace logging
    #[arg(long)]
    trace: bool,

    /// Quiet mode (WARN and ERROR only)
    #[arg(short, long)]
    quiet: bool,

    /// Set log level for specific targets (e.g., "gateway=debug").
    /// Targets are prefixed with "parley::" automatically.
    #[arg(long = "log", value_name = "TARGET=LEVEL")]
    log_overrides: Vec<String>,

    /// Log output format
    #[arg(long = "log-format", value_name = "FORMAT", default_value = "text")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Loaded before logging so RUST_LOG in .env applies. A missing file is fine.
    let dotenv_path = dotenvy::dotenv().ok();

    let log_config = LogConfig::from_cli(
        cli.verbose,
        cli.debug,
        cli.trace,
        cli.quiet,
        cli.log_overrides,
        cli.log_format,
    );
    logging::init(&log_config);

    if let Some(path) = dotenv_path {
        tracing::debug!(target: "parley::startup", "Loaded environment from {:?}", path);
    }

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if cli.mock {
        config.assistant.provider = Provider::Mock;
    }

    tracing::info!(
        target: "parley::startup",
        "Loaded configuration (port: {}, db: {:?}, provider: {:?})",
        config.port,
        config.db_path,
        config.assistant.provider
    );

    let state = Arc::new(AppState::new(config.clone())?);
    tracing::info!(target: "parley::startup", "Initialized application state");

    let app = routes::router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!(target: "parley::startup", "Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
