//! CLI argument parsing and the message each command sends.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};

use shared::{BeaconMessage, ColorState, InteractiveMode};

/// `source` stamped on messages this client originates.
pub const CLIENT_SOURCE: &str = "ctl";

#[derive(Parser)]
#[command(name = "ctl")]
#[command(about = "Beacon hub control client")]
pub struct Cli {
    /// Hub WebSocket URL (default: $HUB_WS_URL or ws://localhost:8765/ws)
    #[arg(long, global = true)]
    pub url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print every message the hub relays, reconnecting on failure
    Watch,

    /// Change the beacon colour (relayed to every other client)
    State {
        #[arg(value_name = "COLOR")]
        color: String,
    },

    /// Assign a barcode to a colour, or clear it with no STATE / "none"
    Assign {
        #[arg(value_name = "CODE")]
        code: String,

        #[arg(value_name = "STATE")]
        state: Option<String>,
    },

    /// Replace every assignment with the contents of a JSON {"code": "COLOR"} file
    Sync {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Set the interactive mode: stopped, passive or any_key_red
    Mode {
        #[arg(value_name = "MODE")]
        mode: String,
    },

    /// Send a generic key event (forces RED in any_key_red mode)
    Key,

    /// Report a barcode scan as if the phone had made it
    Scan {
        #[arg(value_name = "CODE")]
        code: String,

        #[arg(long, default_value = "")]
        symbology: String,

        #[arg(long, default_value_t = 1.0)]
        confidence: f64,

        #[arg(long, default_value = "phone")]
        source: String,
    },
}

/// The single message a one-shot command sends; `None` for `watch`.
pub async fn message_for(command: &Commands) -> anyhow::Result<Option<BeaconMessage>> {
    let msg = match command {
        Commands::Watch => return Ok(None),
        Commands::State { color } => {
            BeaconMessage::state_update(ColorState::parse_loose(color)?, CLIENT_SOURCE)
        }
        Commands::Assign { code, state } => {
            let code = code.trim();
            if code.is_empty() {
                anyhow::bail!("barcode must not be empty");
            }
            BeaconMessage::AssignmentUpdate {
                code: code.to_string(),
                state: parse_assignment(state.as_deref().unwrap_or(""))?,
            }
        }
        Commands::Sync { file } => BeaconMessage::AssignmentSync {
            targets: load_targets(file).await?,
        },
        Commands::Mode { mode } => BeaconMessage::InteractiveControl {
            mode: mode.parse::<InteractiveMode>()?,
        },
        Commands::Key => BeaconMessage::InteractiveKey {},
        Commands::Scan {
            code,
            symbology,
            confidence,
            source,
        } => BeaconMessage::BarcodeResult {
            source: source.clone(),
            code: code.clone(),
            symbology: symbology.clone(),
            confidence: *confidence,
        },
    };
    Ok(Some(msg))
}

/// `None` for the clearing words (empty, none, null).
fn parse_assignment(state: &str) -> anyhow::Result<Option<ColorState>> {
    match state.trim().to_ascii_uppercase().as_str() {
        "" | "NONE" | "NULL" => Ok(None),
        s => Ok(Some(ColorState::parse_loose(s)?)),
    }
}

/// Read an assignment file. Clearing entries are left out, since a sync drops
/// every code it does not name.
pub async fn load_targets(path: &Path) -> anyhow::Result<BTreeMap<String, ColorState>> {
    let expanded = shellexpand::tilde(&path.to_string_lossy()).to_string();
    let text = tokio::fs::read_to_string(&expanded)
        .await
        .with_context(|| format!("read {}", expanded))?;
    let raw: BTreeMap<String, String> =
        serde_json::from_str(&text).with_context(|| format!("parse {}", expanded))?;

    let mut targets = BTreeMap::new();
    for (code, state) in raw {
        let code = code.trim();
        if code.is_empty() {
            continue;
        }
        if let Some(color) =
            parse_assignment(&state).with_context(|| format!("barcode {:?}", code))?
        {
            targets.insert(code.to_string(), color);
        }
    }
    Ok(targets)
}
