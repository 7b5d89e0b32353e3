//! Beacon colour, interactive mode and wire message models.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Colour shown by the beacon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColorState {
    Red,
    Green,
    Blue,
}

/// A colour name that is not one of RED / GREEN / BLUE.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown colour state: {0:?}")]
pub struct UnknownColor(pub String);

impl ColorState {
    pub const ALL: [ColorState; 3] = [Self::Red, Self::Green, Self::Blue];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Red => "RED",
            Self::Green => "GREEN",
            Self::Blue => "BLUE",
        }
    }

    /// Trim and uppercase before matching, so `" blue "` is BLUE.
    pub fn parse_loose(s: &str) -> Result<Self, UnknownColor> {
        s.trim().to_ascii_uppercase().parse()
    }
}

impl FromStr for ColorState {
    type Err = UnknownColor;

    /// Exact match on the uppercase name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RED" => Ok(Self::Red),
            "GREEN" => Ok(Self::Green),
            "BLUE" => Ok(Self::Blue),
            _ => Err(UnknownColor(s.to_string())),
        }
    }
}

impl fmt::Display for ColorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hub-wide mode deciding whether dashboard keystrokes force RED.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractiveMode {
    Stopped,
    #[default]
    Passive,
    AnyKeyRed,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown interactive mode: {0:?}")]
pub struct UnknownMode(pub String);

impl InteractiveMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Passive => "passive",
            Self::AnyKeyRed => "any_key_red",
        }
    }
}

impl FromStr for InteractiveMode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "stopped" => Ok(Self::Stopped),
            "passive" => Ok(Self::Passive),
            "any_key_red" => Ok(Self::AnyKeyRed),
            _ => Err(UnknownMode(s.to_string())),
        }
    }
}

impl fmt::Display for InteractiveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A barcode scan reported by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarcodeResult {
    pub code: String,
    pub symbology: String,
    pub confidence: f64,
    pub source: String,
}

// --- WebSocket messages ---

/// Message `type` discriminators.
pub mod ws_types {
    pub const HELLO: &str = "hello";
    pub const STATE_UPDATE: &str = "state_update";
    pub const BARCODE_RESULT: &str = "barcode_result";
    pub const ASSIGNMENT_UPDATE: &str = "assignment_update";
    pub const ASSIGNMENT_SYNC: &str = "assignment_sync";
    pub const INTERACTIVE_CONTROL: &str = "interactive_control";
    pub const INTERACTIVE_STATUS: &str = "interactive_status";
    pub const INTERACTIVE_KEY: &str = "interactive_key";
    pub const HEARTBEAT: &str = "heartbeat";
}

/// `source` used for everything the hub itself originates.
pub const HOST_SOURCE: &str = "host";

/// Every message shape carried over the beacon socket, flat JSON tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BeaconMessage {
    /// Sent once to each client right after it connects.
    Hello {
        source: String,
        state: ColorState,
        interactive_mode: InteractiveMode,
    },
    StateUpdate {
        #[serde(default)]
        source: String,
        state: ColorState,
    },
    BarcodeResult {
        #[serde(default)]
        source: String,
        code: String,
        #[serde(default)]
        symbology: String,
        #[serde(default)]
        confidence: f64,
    },
    /// `state: None` clears the assignment (serialized as `null`).
    AssignmentUpdate {
        code: String,
        state: Option<ColorState>,
    },
    AssignmentSync {
        targets: BTreeMap<String, ColorState>,
    },
    InteractiveControl {
        mode: InteractiveMode,
    },
    InteractiveStatus {
        source: String,
        mode: InteractiveMode,
    },
    InteractiveKey {},
    Heartbeat {},
}

impl BeaconMessage {
    pub fn hello(state: ColorState, interactive_mode: InteractiveMode) -> Self {
        Self::Hello {
            source: HOST_SOURCE.to_string(),
            state,
            interactive_mode,
        }
    }

    pub fn state_update(state: ColorState, source: &str) -> Self {
        Self::StateUpdate {
            source: source.to_string(),
            state,
        }
    }

    pub fn interactive_status(mode: InteractiveMode) -> Self {
        Self::InteractiveStatus {
            source: HOST_SOURCE.to_string(),
            mode,
        }
    }

    pub fn message_type(&self) -> &'static str {
        match self {
            Self::Hello { .. } => ws_types::HELLO,
            Self::StateUpdate { .. } => ws_types::STATE_UPDATE,
            Self::BarcodeResult { .. } => ws_types::BARCODE_RESULT,
            Self::AssignmentUpdate { .. } => ws_types::ASSIGNMENT_UPDATE,
            Self::AssignmentSync { .. } => ws_types::ASSIGNMENT_SYNC,
            Self::InteractiveControl { .. } => ws_types::INTERACTIVE_CONTROL,
            Self::InteractiveStatus { .. } => ws_types::INTERACTIVE_STATUS,
            Self::InteractiveKey {} => ws_types::INTERACTIVE_KEY,
            Self::Heartbeat {} => ws_types::HEARTBEAT,
        }
    }
}
