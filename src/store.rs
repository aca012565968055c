//! Preset files and settings snapshots on disk.
//!
//! Presets are `*.json` files holding a [`SettingsDocument`]. Snapshots are the
//! decoded settings of a device, written each time they are fetched.

use crate::protocol::client::WledError;
use crate::sync::SettingsDocument;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

pub const PRESET_EXTENSION: &str = "json";
pub const SNAPSHOT_PREFIX: &str = "wled-sync-";

#[derive(Debug, Clone)]
pub struct SettingsStore {
    presets_dir: PathBuf,
    snapshots_dir: PathBuf,
}

impl SettingsStore {
    pub fn new(presets_dir: impl Into<PathBuf>, snapshots_dir: impl Into<PathBuf>) -> Self {
        Self {
            presets_dir: presets_dir.into(),
            snapshots_dir: snapshots_dir.into(),
        }
    }

    pub fn presets_dir(&self) -> &Path {
        &self.presets_dir
    }

    pub fn snapshots_dir(&self) -> &Path {
        &self.snapshots_dir
    }

    /// Creates the snapshot directory if missing.
    pub async fn prepare(&self) -> Result<(), WledError> {
        fs::create_dir_all(&self.snapshots_dir).await?;
        Ok(())
    }

    /// File names of all presets, sorted.
    pub async fn list_presets(&self) -> Result<Vec<String>, WledError> {
        let mut entries = fs::read_dir(&self.presets_dir).await?;
        let mut presets = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_preset = path
                .extension()
                .is_some_and(|extension| extension == PRESET_EXTENSION);
            if !is_preset || !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
                presets.push(name.to_string());
            }
        }
        presets.sort();
        Ok(presets)
    }

    pub async fn load_preset(&self, name: &str) -> Result<SettingsDocument, WledError> {
        let path = self.preset_path(name)?;
        let content = fs::read_to_string(&path).await?;
        let document = serde_json::from_str(&content)?;
        debug!("Loaded preset {}", path.display());
        Ok(document)
    }

    /// Writes `document` as pretty JSON and returns the file path.
    pub async fn save_snapshot(
        &self,
        address: Ipv4Addr,
        document: &SettingsDocument,
    ) -> Result<PathBuf, WledError> {
        let path = self.snapshots_dir.join(snapshot_file_name(address));
        let content = serde_json::to_string_pretty(document)?;
        fs::write(&path, content).await?;
        info!("Saved settings of {address} to {}", path.display());
        Ok(path)
    }

    fn preset_path(&self, name: &str) -> Result<PathBuf, WledError> {
        let invalid = name.is_empty()
            || name.contains("..")
            || name.contains('/')
            || name.contains('\\')
            || Path::new(name).is_absolute();
        if invalid {
            return Err(WledError::InvalidPresetName(name.to_string()));
        }
        Ok(self.presets_dir.join(name))
    }
}

/// `wled-sync-192-168-1-40.json`
pub fn snapshot_file_name(address: Ipv4Addr) -> String {
    let [a, b, c, d] = address.octets();
    format!("{SNAPSHOT_PREFIX}{a}-{b}-{c}-{d}.{PRESET_EXTENSION}")
}
