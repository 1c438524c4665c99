//! Control point engine binary.
//!
//! Loads the configuration, starts the engine and its sentinels and runs
//! until SIGINT/SIGTERM or a fatal engine error.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

use sentinel_engine::config::load_config;
use sentinel_engine::lifecycle::{shutdown_signal, Orchestrator};
use sentinel_engine::observability::{init_logging, init_metrics};

#[derive(Parser)]
#[command(name = "sentinel-engine")]
#[command(about = "Serves control points and hot-reloads them from watched sources", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, env = "SENTINEL_CONFIG", default_value = "sentinel.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    init_logging(&config.observability)?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        "sentinel-engine starting"
    );

    tracing::info!(
        bind_address = %config.engine.http.bind_address,
        file_sentinel = config.sentinel.file.enabled,
        watch_dir = %config.sentinel.file.dir.display(),
        remote_sentinel = config.sentinel.remote.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        init_metrics(addr)?;
    }

    Orchestrator::new(config).run(shutdown_signal()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
