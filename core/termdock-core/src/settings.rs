//! User settings (~/.termdock/settings.json).
//!
//! Missing or corrupt files load as defaults; settings are tuning knobs, not
//! required configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::paths;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// External CLI process names the watcher scans for.
    pub scan_targets: Vec<String>,
    /// Seconds between process-scan ticks.
    pub poll_interval_secs: u64,
    /// Store write debounce window in milliseconds.
    pub debounce_ms: u64,
    /// TTY liveness cache TTL in seconds.
    pub liveness_ttl_secs: u64,
    /// TTY liveness cache capacity.
    pub liveness_cache_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            scan_targets: vec!["codex".to_string()],
            poll_interval_secs: 5,
            debounce_ms: 100,
            liveness_ttl_secs: 30,
            liveness_cache_capacity: 128,
        }
    }
}

impl Settings {
    pub fn load() -> Settings {
        paths::settings_path()
            .ok()
            .and_then(|p| fs_err::read_to_string(&p).ok())
            .and_then(|c| serde_json::from_str(&c).ok())
            .unwrap_or_default()
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn liveness_ttl(&self) -> Duration {
        Duration::from_secs(self.liveness_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sensible() {
        let settings = Settings::default();
        assert!(!settings.scan_targets.is_empty());
        assert!(settings.debounce_ms >= 50);
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"poll_interval_secs": 10}"#).unwrap();
        assert_eq!(settings.poll_interval_secs, 10);
        assert_eq!(settings.debounce_ms, Settings::default().debounce_ms);
    }
}
