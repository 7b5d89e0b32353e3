//! Barcode → colour decisions read from an editable JSON file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};

use shared::{BarcodeResult, ColorState, HOST_SOURCE};

use crate::handler::{BeaconHandler, LoggingHandler};
use crate::relay::Hub;

/// Load a `{"code": "COLOUR"}` file. Missing or invalid files read as empty.
pub async fn load_map(path: &Path) -> HashMap<String, String> {
    let text = match tokio::fs::read_to_string(path).await {
        Ok(t) => t,
        Err(e) => {
            tracing::debug!(path = %path.display(), err = %e, "colour map unreadable");
            return HashMap::new();
        }
    };
    serde_json::from_str(&text).unwrap_or_else(|e| {
        tracing::warn!(path = %path.display(), err = %e, "colour map is not a string map");
        HashMap::new()
    })
}

/// BLUE when the map says so (any case), GREEN otherwise.
pub fn decide_color(code: &str, map: &HashMap<String, String>) -> ColorState {
    match map.get(code) {
        Some(v) if v.trim().eq_ignore_ascii_case("BLUE") => ColorState::Blue,
        _ => ColorState::Green,
    }
}

/// Pushes a colour for every scan, re-reading the map file each time so it
/// can be edited while the hub runs.
pub struct ColorMapHandler {
    path: PathBuf,
}

impl ColorMapHandler {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl BeaconHandler for ColorMapHandler {
    async fn on_state(
        &self,
        hub: &Hub,
        state: ColorState,
        message: &Map<String, Value>,
    ) -> anyhow::Result<()> {
        LoggingHandler.on_state(hub, state, message).await
    }

    async fn on_barcode(&self, hub: &Hub, result: &BarcodeResult) -> anyhow::Result<()> {
        LoggingHandler.on_barcode(hub, result).await?;
        let map = load_map(&self.path).await;
        let color = decide_color(&result.code, &map);
        tracing::info!(code = %result.code, state = %color, "[map]");
        hub.send_state(color, HOST_SOURCE);
        Ok(())
    }
}
