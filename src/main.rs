//! VLAN Manager
//!
//! REST service for VLAN configuration records, persisted to a local JSON
//! file.

use anyhow::Context;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vlan_manager::{ApiServer, ApiServerConfig, FileStore, FileStoreConfig, VlanService};

// =============================================================================
// CLI Arguments
// =============================================================================

/// VLAN Manager - validated VLAN configuration registry
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// REST API bind address
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8000")]
    bind_addr: SocketAddr,

    /// Path of the JSON data file
    #[arg(long, env = "DATA_FILE_PATH", default_value = "vlans.json")]
    data_file: PathBuf,

    /// Maximum request body size in bytes
    #[arg(long, env = "MAX_BODY_BYTES", default_value_t = 1024 * 1024)]
    max_body_bytes: usize,

    /// Request timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    request_timeout_secs: u64,

    /// Skip fsync on save (faster, not crash-safe)
    #[arg(long, env = "NO_FSYNC")]
    no_fsync: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args)?;

    info!("Starting VLAN Manager");
    info!("  Version: {}", vlan_manager::VERSION);
    info!("  REST API: {}", args.bind_addr);
    info!("  Data file: {}", args.data_file.display());

    if args.no_fsync {
        warn!("fsync disabled; saves are not crash-safe");
    }

    let store = FileStore::with_config(FileStoreConfig {
        path: args.data_file.clone(),
        sync_writes: !args.no_fsync,
    })
    .context("invalid data file configuration")?;

    let service = VlanService::new(Arc::new(store)).context("failed to create VLAN service")?;

    // Fail early on an unreadable data file rather than on the first request
    let records = service.list().await.context("failed to load VLAN records")?;
    info!("Loaded {} VLAN records", records.len());

    let api_config = ApiServerConfig {
        bind_addr: args.bind_addr,
        request_timeout_secs: args.request_timeout_secs,
        max_body_size: args.max_body_bytes,
    };
    let server = Arc::new(ApiServer::new(api_config, service));

    // Stop on ctrl-c
    {
        let server = server.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Received shutdown signal"),
                Err(e) => error!("Failed to listen for shutdown signal: {}", e),
            }
            server.shutdown();
        });
    }

    server.run().await?;

    info!("VLAN Manager shutdown complete");
    Ok(())
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) -> anyhow::Result<()> {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(level.into())
        .add_directive("hyper=warn".parse()?)
        .add_directive("tower=warn".parse()?)
        .add_directive("tower_http=info".parse()?)
        .add_directive("axum=info".parse()?);

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    }

    Ok(())
}
