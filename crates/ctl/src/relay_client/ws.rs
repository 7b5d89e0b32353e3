//! Connect to the hub, send commands, and follow its broadcasts.

use std::time::Duration;

use anyhow::Result;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use shared::BeaconMessage;

pub type HubStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

const HELLO_TIMEOUT: Duration = Duration::from_secs(5);
const RECONNECT_DELAY: Duration = Duration::from_secs(5);
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// Human-readable one-liner for a frame the hub sent.
pub fn describe(text: &str) -> String {
    let Ok(msg) = serde_json::from_str::<BeaconMessage>(text) else {
        return format!("(raw) {}", text);
    };
    match msg {
        BeaconMessage::Hello {
            state,
            interactive_mode,
            ..
        } => format!("hello state={} mode={}", state, interactive_mode),
        BeaconMessage::StateUpdate { source, state } => {
            format!("state {} from {}", state, source)
        }
        BeaconMessage::BarcodeResult {
            source,
            code,
            symbology,
            confidence,
        } => format!(
            "barcode {} ({}) conf={:.2} from {}",
            code, symbology, confidence, source
        ),
        BeaconMessage::InteractiveStatus { mode, .. } => format!("interactive mode {}", mode),
        other => format!("{} {}", other.message_type(), text),
    }
}

/// Connect and wait for the hub's greeting.
async fn connect(url: &str) -> Result<HubStream> {
    let (mut ws, _) = connect_async(url).await?;
    let hello = tokio::time::timeout(HELLO_TIMEOUT, read_hello(&mut ws))
        .await
        .map_err(|_| anyhow::anyhow!("no hello from hub within {:?}", HELLO_TIMEOUT))??;
    tracing::info!("Connected: {}", describe(&hello));
    Ok(ws)
}

async fn read_hello(ws: &mut HubStream) -> Result<String> {
    while let Some(msg) = ws.next().await {
        if let Message::Text(t) = msg? {
            return Ok(t);
        }
    }
    anyhow::bail!("hub closed the connection before hello")
}

/// Connect, send one message, and hang up cleanly.
pub async fn send_once(url: &str, msg: &BeaconMessage) -> Result<()> {
    let mut ws = connect(url).await?;
    ws.send(Message::Text(serde_json::to_string(msg)?)).await?;
    tracing::info!(kind = msg.message_type(), "sent");
    ws.close(None).await?;
    // Drain until the close handshake completes so the hub processes our frame first.
    while let Some(Ok(_)) = ws.next().await {}
    Ok(())
}

/// Print every relayed message until interrupted, reconnecting when the hub goes away.
pub async fn run_watch(url: &str) -> Result<()> {
    loop {
        match connect(url).await {
            Ok(ws) => {
                if let Err(e) = watch_connection(ws).await {
                    tracing::warn!("Connection error: {}", e);
                } else {
                    tracing::warn!("Hub closed the connection");
                }
            }
            Err(e) => {
                tracing::warn!("Connect failed: {}, retrying in {:?}", e, RECONNECT_DELAY);
            }
        }
        tokio::time::sleep(RECONNECT_DELAY).await;
    }
}

async fn watch_connection(ws: HubStream) -> Result<()> {
    let (mut ws_tx, mut ws_rx) = ws.split();
    let heartbeat = serde_json::to_string(&BeaconMessage::Heartbeat {})?;
    let mut ticker = tokio::time::interval(HEARTBEAT_INTERVAL);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                let text = match msg {
                    Some(Ok(Message::Text(t))) => t,
                    Some(Ok(Message::Close(_))) | None => return Ok(()),
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => return Err(e.into()),
                };
                println!(
                    "[{}] {}",
                    chrono::Local::now().format("%H:%M:%S"),
                    describe(&text)
                );
            }
            _ = ticker.tick() => {
                ws_tx.send(Message::Text(heartbeat.clone())).await?;
            }
        }
    }
}
