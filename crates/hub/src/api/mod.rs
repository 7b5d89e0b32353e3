//! HTTP + WebSocket surface.

mod routes;

use axum::{routing::get, Router};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

use crate::relay::Hub;

/// Shared app state.
#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<Hub>,
    pub ping_interval: Duration,
}

/// Phones and dashboards dial the bare host (`ws://host:8765`); `/ws` is kept as an alias.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(routes::ws_handler))
        .route("/ws", get(routes::ws_handler))
        .route("/health", get(health))
        .layer(cors)
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
