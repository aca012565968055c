use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Server settings loaded from the optional `--settings` JSON file.
///
/// Missing keys keep their default value. Command line flags override them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub port: u16,
    pub presets_dir: String,
    pub snapshots_dir: String,
    pub public_dir: String,
    pub service_type: String,
    pub device_port: u16,
    pub probe_timeout_ms: u64,
    pub fetch_timeout_ms: u64,
    pub apply_timeout_ms: u64,
    pub tolerate_chunked_framing_defect: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            port: 3000,
            presets_dir: String::from("presets"),
            snapshots_dir: String::from("sync-settings"),
            public_dir: String::from("public"),
            service_type: String::from(wled_sync_rs::DEFAULT_SERVICE_TYPE),
            device_port: 80,
            probe_timeout_ms: 2000,
            fetch_timeout_ms: 5000,
            apply_timeout_ms: 10000,
            tolerate_chunked_framing_defect: true,
        }
    }
}

impl Settings {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn apply_timeout(&self) -> Duration {
        Duration::from_millis(self.apply_timeout_ms)
    }
}
