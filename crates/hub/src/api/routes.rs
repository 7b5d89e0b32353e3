//! WebSocket connection handling.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::api::AppState;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// One task per connection. The writer drains the client's outbound queue
/// (and pings); this task reads frames and hands them to the hub. Either side
/// ending tears the connection down.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let hub = state.hub.clone();
    let (client, mut outbox) = hub.connect();

    let period = state.ping_interval;
    let mut ping_interval = time::interval_at(Instant::now() + period, period);
    ping_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut writer = tokio::spawn(async move {
        loop {
            tokio::select! {
                frame = outbox.recv() => {
                    let Some(frame) = frame else {
                        // Hub dropped us (shutdown or prune).
                        let _ = ws_tx.send(Message::Close(None)).await;
                        break;
                    };
                    if ws_tx.send(Message::Text(frame.to_string().into())).await.is_err() {
                        break;
                    }
                }
                _ = ping_interval.tick() => {
                    if ws_tx.send(Message::Ping(axum::body::Bytes::new())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    loop {
        tokio::select! {
            incoming = ws_rx.next() => match incoming {
                Some(Ok(Message::Text(text))) => hub.handle_text(client, text.as_str()).await,
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!(client = %client, err = %e, "websocket read failed");
                    break;
                }
            },
            _ = &mut writer => break,
        }
    }

    hub.disconnect(client);
    writer.abort();
}

#[cfg(test)]
mod tests {
    use crate::api::{router, AppState};
    use crate::relay::Hub;
    use futures_util::{SinkExt, StreamExt};
    use serde_json::{json, Value};
    use shared::ColorState;
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio_tungstenite::tungstenite::Message as WsMessage;
    use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

    type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

    async fn spawn_hub() -> (Arc<Hub>, SocketAddr) {
        let hub = Arc::new(Hub::new());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(AppState {
            hub: hub.clone(),
            ping_interval: Duration::from_secs(30),
        });
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (hub, addr)
    }

    async fn connect(addr: SocketAddr, path: &str) -> Client {
        let (ws, _) = connect_async(format!("ws://{}{}", addr, path)).await.unwrap();
        ws
    }

    /// Next text frame as JSON; `None` once the server closes the socket.
    async fn next_json(client: &mut Client) -> Option<Value> {
        loop {
            let msg = tokio::time::timeout(Duration::from_secs(5), client.next())
                .await
                .expect("timed out waiting for frame");
            match msg {
                Some(Ok(WsMessage::Text(t))) => return Some(serde_json::from_str(&t).unwrap()),
                Some(Ok(WsMessage::Close(_))) | None | Some(Err(_)) => return None,
                Some(Ok(_)) => continue,
            }
        }
    }

    async fn send(client: &mut Client, value: Value) {
        client.send(WsMessage::Text(value.to_string())).await.unwrap();
    }

    async fn wait_for_clients(hub: &Hub, n: usize) {
        for _ in 0..100 {
            if hub.client_count() == n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("expected {} clients, have {}", n, hub.client_count());
    }

    #[tokio::test]
    async fn hello_on_connect_at_root_and_ws_paths() {
        let (hub, addr) = spawn_hub().await;
        hub.send_state(ColorState::Blue, "host");

        for path in ["/", "/ws"] {
            let mut client = connect(addr, path).await;
            assert_eq!(
                next_json(&mut client).await,
                Some(json!({"type": "hello", "source": "host", "state": "BLUE", "interactive_mode": "passive"}))
            );
        }
    }

    #[tokio::test]
    async fn state_update_relayed_to_others_but_not_sender() {
        let (hub, addr) = spawn_hub().await;
        let mut phone = connect(addr, "/").await;
        let mut dash = connect(addr, "/").await;
        next_json(&mut phone).await;
        next_json(&mut dash).await;

        let update = json!({"type": "state_update", "source": "phone", "state": "GREEN", "manual": true});
        send(&mut phone, update.clone()).await;
        assert_eq!(next_json(&mut dash).await, Some(update));
        assert_eq!(hub.current_state(), ColorState::Green);

        // The phone's next frame is the host push, not an echo of its own update.
        hub.send_state(ColorState::Red, "host");
        let push = json!({"type": "state_update", "source": "host", "state": "RED"});
        assert_eq!(next_json(&mut phone).await, Some(push.clone()));
        assert_eq!(next_json(&mut dash).await, Some(push));
    }

    #[tokio::test]
    async fn scan_with_assignment_drives_every_client() {
        let (_hub, addr) = spawn_hub().await;
        let mut phone = connect(addr, "/").await;
        let mut dash = connect(addr, "/").await;
        next_json(&mut phone).await;
        next_json(&mut dash).await;

        send(&mut dash, json!({"type": "assignment_sync", "targets": {"123": "BLUE"}})).await;
        send(&mut dash, json!({"type": "heartbeat"})).await;
        send(&mut dash, json!({"type": "interactive_control", "mode": "stopped"})).await;
        let status = json!({"type": "interactive_status", "source": "host", "mode": "stopped"});
        assert_eq!(next_json(&mut dash).await, Some(status.clone()));
        assert_eq!(next_json(&mut phone).await, Some(status));

        let scan = json!({"type": "barcode_result", "source": "phone", "code": "123", "symbology": "QR", "confidence": 0.9});
        send(&mut phone, scan.clone()).await;
        let push = json!({"type": "state_update", "source": "host", "state": "BLUE"});
        assert_eq!(next_json(&mut dash).await, Some(scan));
        assert_eq!(next_json(&mut dash).await, Some(push.clone()));
        assert_eq!(next_json(&mut phone).await, Some(push));
    }

    #[tokio::test]
    async fn malformed_frames_keep_the_connection_open() {
        let (hub, addr) = spawn_hub().await;
        let mut phone = connect(addr, "/").await;
        next_json(&mut phone).await;

        phone.send(WsMessage::Text("{garbage".to_string())).await.unwrap();
        phone.send(WsMessage::Binary(vec![1, 2, 3])).await.unwrap();
        send(&mut phone, json!({"type": "state_update", "state": "YELLOW"})).await;

        hub.send_state(ColorState::Green, "host");
        assert_eq!(
            next_json(&mut phone).await,
            Some(json!({"type": "state_update", "source": "host", "state": "GREEN"}))
        );
    }

    #[tokio::test]
    async fn closing_socket_unregisters_client() {
        let (hub, addr) = spawn_hub().await;
        let mut phone = connect(addr, "/").await;
        let mut dash = connect(addr, "/").await;
        next_json(&mut phone).await;
        next_json(&mut dash).await;
        wait_for_clients(&hub, 2).await;

        phone.close(None).await.unwrap();
        wait_for_clients(&hub, 1).await;
        assert!(hub.has_clients());
    }

    #[tokio::test]
    async fn close_all_hangs_up_every_client() {
        let (hub, addr) = spawn_hub().await;
        let mut phone = connect(addr, "/").await;
        next_json(&mut phone).await;

        assert_eq!(hub.close_all(), 1);
        assert_eq!(next_json(&mut phone).await, None);
    }

    #[tokio::test]
    async fn health_endpoint() {
        let (_hub, addr) = spawn_hub().await;
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.ends_with("ok"));
    }
}
