//! Beacon hub control client — the dashboard side of the protocol, from a terminal.

pub mod cli;
pub mod relay_client;
