//! WebSocket client for the beacon hub.

mod ws;

pub use ws::{describe, run_watch, send_once, HubStream};
