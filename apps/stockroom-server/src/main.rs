mod app;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use inventory::{InventoryConfig, InventoryModule};
use mimalloc::MiMalloc;
use stockroom_bootstrap::{AppConfig, CliArgs, init_logging, shutdown_signal};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Stockroom Server - inventory API backed by a flat file
#[derive(Parser)]
#[command(name = "stockroom-server")]
#[command(about = "Stockroom Server - inventory API backed by a flat file")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port override for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Inventory data file (overrides modules.inventory.config.data_file)
    #[arg(long)]
    data_file: Option<PathBuf>,

    /// Print effective configuration (JSON) and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Validate configuration and exit
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.clone(),
        port: cli.port,
        verbose: cli.verbose,
    };

    // 1) defaults -> 2) YAML (if provided) -> 3) env (STOCKROOM__*) -> 4) CLI overrides
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);
    if let Some(path) = &cli.data_file {
        config.set_module_config_value(
            InventoryModule::NAME,
            "data_file",
            serde_json::Value::String(path.display().to_string()),
        );
    }

    init_logging(&config.logging)?;

    if cli.print_config {
        println!("{}", config.to_pretty_json()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config).await,
        Commands::Check => check_config(&config),
    }
}

fn inventory_config(config: &AppConfig) -> Result<InventoryConfig> {
    Ok(config.module_config_or_default(InventoryModule::NAME)?)
}

fn check_config(config: &AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");
    config.server.socket_addr()?;
    stockroom_http::build_cors_layer(&config.cors).context("invalid CORS configuration")?;
    let inventory = inventory_config(config)?;
    anyhow::ensure!(
        inventory.capacity > 0,
        "modules.inventory.config.capacity must be at least 1"
    );

    println!("Configuration is valid");
    println!("{}", config.to_pretty_json()?);
    Ok(())
}

async fn run_server(config: AppConfig) -> Result<()> {
    tracing::info!("Stockroom Server starting");

    let addr = config.server.socket_addr()?;
    let inventory = InventoryModule::init(&inventory_config(&config)?)?;
    let router = app::build_router(&config, &inventory)?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "HTTP server bound");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    tracing::info!("Stockroom Server stopped");
    Ok(())
}
