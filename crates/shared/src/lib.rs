//! Shared wire types for the beacon hub and its clients.

mod models;

// Explicit re-exports (avoids rust-analyzer issues with `pub use models::*`)
pub use models::ws_types;
pub use models::{
    BarcodeResult, BeaconMessage, ColorState, InteractiveMode, UnknownColor, UnknownMode,
    HOST_SOURCE,
};
