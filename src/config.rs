// Runtime configuration, read from the environment (and `.env` if present)

use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::warn;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:1234";
pub const DEFAULT_STATE_PATH: &str = "data/futarchy_state.json";
/// Roughly one host slot every 400ms
pub const DEFAULT_SLOT_MS: u64 = 400;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub state_path: PathBuf,
    /// Slot ticker period; 0 disables the ticker
    pub slot_ms: u64,
    /// Save the ledger after mutating calls and on shutdown
    pub persist: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 1234)),
            state_path: PathBuf::from(DEFAULT_STATE_PATH),
            slot_ms: DEFAULT_SLOT_MS,
            persist: true,
        }
    }
}

impl Config {
    /// Load `.env`, then read every `FUTARCHY_*` variable. Bad values fall
    /// back to the default with a warning.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let bind_addr = match lookup("FUTARCHY_BIND_ADDR") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!(value = %raw, "invalid FUTARCHY_BIND_ADDR, using {}", DEFAULT_BIND_ADDR);
                defaults.bind_addr
            }),
            None => defaults.bind_addr,
        };

        let slot_ms = match lookup("FUTARCHY_SLOT_MS") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!(value = %raw, "invalid FUTARCHY_SLOT_MS, using {}", DEFAULT_SLOT_MS);
                defaults.slot_ms
            }),
            None => defaults.slot_ms,
        };

        Self {
            bind_addr,
            state_path: lookup("FUTARCHY_STATE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.state_path),
            slot_ms,
            persist: lookup("FUTARCHY_PERSIST")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.persist),
        }
    }

    /// Ephemeral config for tests and embedding: no ticker, no disk
    pub fn in_memory() -> Self {
        Self { slot_ms: 0, persist: false, ..Self::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        assert_eq!(Config::from_lookup(lookup(&[])), Config::default());
    }

    #[test]
    fn test_reads_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("FUTARCHY_BIND_ADDR", "127.0.0.1:9000"),
            ("FUTARCHY_STATE_PATH", "/tmp/state.json"),
            ("FUTARCHY_SLOT_MS", "0"),
            ("FUTARCHY_PERSIST", "false"),
        ]));
        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.state_path, PathBuf::from("/tmp/state.json"));
        assert_eq!(config.slot_ms, 0);
        assert!(!config.persist);
    }

    #[test]
    fn test_bad_values_fall_back() {
        let config = Config::from_lookup(lookup(&[("FUTARCHY_BIND_ADDR", "nope"), ("FUTARCHY_SLOT_MS", "-1")]));
        assert_eq!(config.bind_addr, Config::default().bind_addr);
        assert_eq!(config.slot_ms, DEFAULT_SLOT_MS);
    }
}
