//! CLI argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "hub")]
#[command(about = "Beacon hub — relays colour state and barcode scans between phone and dashboards")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the WebSocket hub [default]
    Serve {
        /// Interface to bind (overrides HOST)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (overrides PORT)
        #[arg(long)]
        port: Option<u16>,

        /// JSON file of barcode -> colour, re-read on every scan (overrides COLOR_MAP_PATH)
        #[arg(long, value_name = "PATH")]
        color_map: Option<PathBuf>,

        /// Read g / r / b / q from stdin to drive the beacon
        #[arg(long)]
        interactive: bool,

        /// With --interactive: any key sends RED while the dashboard has any_key_red enabled
        #[arg(long, requires = "interactive")]
        any_key_red: bool,
    },

    /// Print this host's IPv4 addresses to configure phones with
    Addresses {
        /// Port shown in the printed URLs
        #[arg(long, default_value_t = hub::config::DEFAULT_PORT)]
        port: u16,
    },
}

impl Default for Commands {
    fn default() -> Self {
        Self::Serve {
            host: None,
            port: None,
            color_map: None,
            interactive: false,
            any_key_red: false,
        }
    }
}
