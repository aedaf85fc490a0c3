//! chat-hub server
//!
//! Run with: cargo run -- [--config PATH] [--host HOST] [--port PORT]
//!
//! # Configuration
//!
//! Settings come from the `--config` file, else the first of
//! `~/.config/chat-hub/config.toml`, `/etc/chat-hub/config.toml`,
//! `./config.toml`, else built-in defaults. Environment variables
//! (`CHAT_HUB_*`) override the file and `--host`/`--port` override both.
//! `RUST_LOG` takes precedence over the configured log level.

use anyhow::Context;
use chat_hub::config::{generate_default_config, Config, ConfigLoad, LoggingConfig};
use chat_hub::{serve, AppState};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "chat-hub")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Real-time chat fan-out hub over Server-Sent Events")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Host to bind to (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides config)
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the server (default)
    Serve,

    /// Print or write the default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::Config { output }) = &cli.command {
        return write_default_config(output.as_ref());
    }

    let (mut config, outcome) = match &cli.config {
        Some(path) => {
            let config = Config::load_with_env(path)
                .with_context(|| format!("loading config from {}", path.display()))?;
            let outcome = ConfigLoad {
                source: Some(path.clone()),
                skipped: Vec::new(),
            };
            (config, outcome)
        }
        None => Config::load_default(),
    };
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    init_tracing(&config.logging);
    outcome.log();

    tracing::info!("Starting chat-hub v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        history_capacity = config.hub.history_capacity,
        keepalive_secs = config.hub.keepalive_interval_secs,
        "Hub configured"
    );

    let state = AppState::with_hub_config(config.hub.to_hub_config(), config.server);
    serve(state).await.context("server failed")?;

    tracing::info!("chat-hub stopped");
    Ok(())
}

/// Initialize tracing from the logging config
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.filter_directive()));

    let registry = tracing_subscriber::registry().with(filter);
    if logging.is_json() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn write_default_config(output: Option<&PathBuf>) -> anyhow::Result<()> {
    let content = generate_default_config();
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("writing config to {}", path.display()))?;
            println!("Wrote default config to {}", path.display());
        }
        None => print!("{}", content),
    }
    Ok(())
}
