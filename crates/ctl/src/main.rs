//! Beacon hub control client.
//!
//! Optional env: HUB_WS_URL, RUST_LOG

use std::env;

use clap::Parser;
use ctl::{cli, relay_client};
use tracing_subscriber::EnvFilter;

const DEFAULT_URL: &str = "ws://localhost:8765/ws";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = cli::Cli::parse();
    let url = cli
        .url
        .clone()
        .or_else(|| env::var("HUB_WS_URL").ok())
        .unwrap_or_else(|| DEFAULT_URL.to_string());

    match cli::message_for(&cli.command).await? {
        Some(msg) => relay_client::send_once(&url, &msg).await?,
        None => relay_client::run_watch(&url).await?,
    }

    Ok(())
}
