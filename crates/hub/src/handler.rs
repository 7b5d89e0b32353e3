//! Host-side collaborators notified of client events.

use async_trait::async_trait;
use serde_json::{Map, Value};

use shared::{BarcodeResult, ColorState};

use crate::relay::Hub;

/// Reacts to accepted client events. Called inline while the originating
/// message is handled, with the hub lock released, so implementations may
/// push state through `hub`. Errors are logged by the hub and otherwise ignored.
#[async_trait]
pub trait BeaconHandler: Send + Sync {
    /// A client changed the beacon colour. `message` is the full message as received.
    async fn on_state(
        &self,
        _hub: &Hub,
        _state: ColorState,
        _message: &Map<String, Value>,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    async fn on_barcode(&self, _hub: &Hub, _result: &BarcodeResult) -> anyhow::Result<()> {
        Ok(())
    }
}

pub struct NoopHandler;

impl BeaconHandler for NoopHandler {}

/// Logs every accepted state change and scan.
pub struct LoggingHandler;

#[async_trait]
impl BeaconHandler for LoggingHandler {
    async fn on_state(
        &self,
        _hub: &Hub,
        state: ColorState,
        message: &Map<String, Value>,
    ) -> anyhow::Result<()> {
        let source = message.get("source").and_then(Value::as_str).unwrap_or("?");
        let manual = message.get("manual").and_then(Value::as_bool);
        tracing::info!(state = %state, source, manual, "[state]");
        Ok(())
    }

    async fn on_barcode(&self, _hub: &Hub, result: &BarcodeResult) -> anyhow::Result<()> {
        tracing::info!(
            code = %result.code,
            symbology = %result.symbology,
            confidence = format_args!("{:.2}", result.confidence),
            source = %result.source,
            "[barcode]"
        );
        Ok(())
    }
}
