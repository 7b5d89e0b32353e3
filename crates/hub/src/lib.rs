//! Beacon hub — authoritative beacon colour, barcode assignments and
//! interactive mode, relayed to every connected phone and dashboard.

pub mod api;
pub mod assignments;
pub mod colormap;
pub mod config;
pub mod handler;
pub mod interactive;
pub mod keyboard;
pub mod netinfo;
pub mod relay;
pub mod router;
