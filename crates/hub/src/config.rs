//! Configuration for the hub.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8765;
pub const DEFAULT_PING_INTERVAL_SECS: u64 = 30;

/// Hub configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub ping_interval: Duration,
    /// Barcode → colour file consulted on every scan, if any.
    pub color_map_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            ping_interval: Duration::from_secs(DEFAULT_PING_INTERVAL_SECS),
            color_map_path: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unparsable numbers fall back to defaults.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let host = get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = get("PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);
        let ping_interval_secs = get("PING_INTERVAL_SECS")
            .and_then(|s| s.parse().ok())
            .filter(|s: &u64| *s > 0)
            .unwrap_or(DEFAULT_PING_INTERVAL_SECS);
        let color_map_path = get("COLOR_MAP_PATH")
            .filter(|p| !p.trim().is_empty())
            .map(|p| PathBuf::from(shellexpand::tilde(&p).as_ref()));

        Self {
            host,
            port,
            ping_interval: Duration::from_secs(ping_interval_secs),
            color_map_path,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_bind_all_interfaces_on_8765() {
        let config = Config::from_lookup(lookup(&[]));
        assert_eq!(config.bind_addr(), "0.0.0.0:8765");
        assert_eq!(config.ping_interval, Duration::from_secs(30));
        assert!(config.color_map_path.is_none());
    }

    #[test]
    fn reads_overrides_and_ignores_garbage() {
        let config = Config::from_lookup(lookup(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "9000"),
            ("PING_INTERVAL_SECS", "zero"),
            ("COLOR_MAP_PATH", "/tmp/map.json"),
        ]));
        assert_eq!(config.bind_addr(), "127.0.0.1:9000");
        assert_eq!(config.ping_interval, Duration::from_secs(30));
        assert_eq!(config.color_map_path, Some(PathBuf::from("/tmp/map.json")));

        let config = Config::from_lookup(lookup(&[("PORT", "99999")]));
        assert_eq!(config.port, DEFAULT_PORT);
    }
}
