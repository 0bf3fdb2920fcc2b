//! Social relay server: real-time presence, messaging and notification relay.
//!
//! Main entry point that wires all crates together and starts the server.

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use relay_core::config::AppConfig;
use relay_core::error::AppError;

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "relay-server", version, about = "Real-time social presence relay")]
struct Args {
    /// Directory holding `default.toml` and per-environment overlays.
    #[arg(long, default_value = "config", env = "RELAY_CONFIG_DIR")]
    config_dir: String,

    /// Environment overlay to apply (`{config_dir}/{env}.toml`).
    #[arg(long, default_value = "development", env = "RELAY_ENV")]
    env: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();

    let config = match AppConfig::load(&args.config_dir, &args.env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(
        config_dir = %args.config_dir,
        env = %args.env,
        "Loaded configuration"
    );

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting social relay v{}", env!("CARGO_PKG_VERSION"));

    let backend = relay_upstream::build_backend(&config.upstream)?;
    tracing::info!(
        provider = backend.provider_name(),
        base_url = %config.upstream.base_url,
        "Upstream backend ready"
    );

    relay_gateway::run_server(config, backend).await
}
