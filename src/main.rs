//! Point-cloud viewer development server.
//!
//! # Architecture Overview
//!
//! ```text
//!                              ┌──────────────────────────────────────────────┐
//!                              │                 DEV SERVER                   │
//!     Browser Request          │  ┌─────────┐    ┌──────────────┐             │
//!     ─────────────────────────┼─▶│  http   │───▶│    proxy     │─────────────┼──▶ Backend
//!                              │  │ server  │    │ ^/api → :8000│             │    (:8000)
//!                              │  └────┬────┘    └──────────────┘             │
//!                              │       │ no rule matched                      │
//!                              │       ▼                                      │
//!                              │  ┌──────────┐   ┌──────────┐   ┌──────────┐  │
//!     Document                 │  │  views   │──▶│ routing  │──▶│  loader  │  │
//!     ◀────────────────────────┼──│ (history │   │  table   │   │ (cached  │  │
//!                              │  │ fallback)│   └──────────┘   │  modules)│  │
//!                              │  └──────────┘                  └──────────┘  │
//!                              │                                              │
//!                              │  config · observability · lifecycle          │
//!                              └──────────────────────────────────────────────┘
//! ```

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use viewer_devserver::build_flags::BuildFlags;
use viewer_devserver::config::{self, watcher::ConfigWatcher, DevServerConfig};
use viewer_devserver::lifecycle::{signals, Shutdown};
use viewer_devserver::observability::{logging, metrics};
use viewer_devserver::routing::RouteTable;
use viewer_devserver::DevServer;

#[derive(Parser)]
#[command(name = "viewer-devserver")]
#[command(about = "Development server for the point-cloud viewer frontend", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults are used when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the listen port.
    #[arg(short, long, global = true)]
    port: Option<u16>,

    /// Override the listen host.
    #[arg(long, global = true)]
    host: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the dev server (default)
    Serve,
    /// Print the route table as JSON
    Routes,
    /// Print the build flags as JSON
    Flags,
    /// Validate configuration and exit
    Check,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init();

    let mut config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => config::load_default()?,
    };
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(host) = cli.host.clone() {
        config.server.host = host;
    }

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config, cli.config).await,
        Commands::Routes => {
            let table = RouteTable::from_config(&config.routes, Path::new(&config.root_dir))?;
            println!("{}", serde_json::to_string_pretty(&table.describe())?);
            Ok(())
        }
        Commands::Flags => {
            let flags = BuildFlags::from_config(&config.build);
            println!("{}", serde_json::to_string_pretty(&flags)?);
            Ok(())
        }
        Commands::Check => {
            DevServer::new(config)?;
            println!("configuration ok");
            Ok(())
        }
    }
}

async fn serve(
    config: DevServerConfig,
    config_path: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("viewer-devserver v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.bind_address(),
        base_path = %config.base_path,
        mode = ?config.build.mode,
        routes = config.routes.len(),
        proxy_rules = config.proxy.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // The watcher handle must outlive the server.
    let (_watcher, config_updates) = match config_path {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(&path);
            match watcher.run() {
                Ok(handle) => (Some(handle), updates),
                Err(e) => {
                    tracing::warn!(error = %e, "Config hot reload unavailable");
                    (None, updates)
                }
            }
        }
        None => (None, mpsc::unbounded_channel().1),
    };

    let listener = TcpListener::bind(config.bind_address()).await?;
    let server = DevServer::new(config)?;

    let shutdown = Shutdown::new();
    tokio::spawn(signals::shutdown_on_signal(shutdown.clone()));

    server.run(listener, config_updates, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
