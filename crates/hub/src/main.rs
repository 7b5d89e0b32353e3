//! Beacon hub — WebSocket relay between the beacon phone and dashboards.
//!
//! Optional env: HOST, PORT, PING_INTERVAL_SECS, COLOR_MAP_PATH, RUST_LOG

mod cli;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use hub::api::{self, AppState};
use hub::colormap::ColorMapHandler;
use hub::config::Config;
use hub::handler::{BeaconHandler, LoggingHandler};
use hub::relay::Hub;
use hub::{keyboard, netinfo};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = cli::Cli::parse();

    match cli.command.unwrap_or_default() {
        cli::Commands::Serve {
            host,
            port,
            color_map,
            interactive,
            any_key_red,
        } => {
            let mut config = Config::from_env();
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(path) = color_map {
                config.color_map_path =
                    Some(PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).as_ref()));
            }
            serve(config, interactive, any_key_red).await?;
        }
        cli::Commands::Addresses { port } => print_addresses(port),
    }

    Ok(())
}

async fn serve(config: Config, interactive: bool, any_key_red: bool) -> anyhow::Result<()> {
    let handler: Arc<dyn BeaconHandler> = match &config.color_map_path {
        Some(path) => {
            tracing::info!("Using colour map {}", path.display());
            Arc::new(ColorMapHandler::new(path.clone()))
        }
        None => Arc::new(LoggingHandler),
    };
    let hub = Arc::new(Hub::with_handler(handler));

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!("Hub listening on ws://{}", listener.local_addr()?);
    print_addresses(config.port);
    if interactive {
        if any_key_red {
            println!("Press any key to send RED (when the dashboard enables any_key_red); q to quit.");
        } else {
            println!("Press g / r / b to push GREEN / RED / BLUE; q to quit.");
        }
    }

    let app = api::router(AppState {
        hub: hub.clone(),
        ping_interval: config.ping_interval,
    });
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(hub, interactive, any_key_red))
        .await?;

    Ok(())
}

/// Resolves on Ctrl+C, or when the operator console quits. Hangs up every client first.
async fn shutdown_signal(hub: Arc<Hub>, interactive: bool, any_key_red: bool) {
    if interactive {
        tokio::select! {
            res = keyboard::run_console(&hub, any_key_red) => {
                if let Err(e) = res {
                    tracing::warn!("Console stopped: {}", e);
                }
            }
            _ = tokio::signal::ctrl_c() => {}
        }
    } else if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl+C: {}", e);
    }
    hub.close_all();
}

fn print_addresses(port: u16) {
    let addrs = netinfo::host_ipv4_addresses();
    if addrs.is_empty() {
        println!("Host IPv4 addresses: (not detected)");
        return;
    }
    println!("Host IPv4 addresses (use one in the phone app):");
    for addr in addrs {
        println!("  - {}  (ws://{}:{})", addr, addr, port);
    }
}
