use crate::protocol::client::{ApplyOutcome, WledClient, WledError};
use crate::store::SettingsStore;
use crate::sync::SettingsDocument;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use tracing::info;

/// Settings decoded from a device together with where they were saved.
#[derive(Debug, Clone)]
pub struct FetchedSettings {
    pub settings: SettingsDocument,
    pub saved_to: PathBuf,
}

/// The fetch and apply flows shared by the server and the CLI.
#[derive(Debug, Clone)]
pub struct SyncService {
    client: WledClient,
    store: SettingsStore,
}

impl SyncService {
    pub fn new(client: WledClient, store: SettingsStore) -> Self {
        Self { client, store }
    }

    pub fn client(&self) -> &WledClient {
        &self.client
    }

    pub fn store(&self) -> &SettingsStore {
        &self.store
    }

    /// Fetches and decodes the device's sync settings, then writes a snapshot.
    pub async fn fetch_settings(&self, address: Ipv4Addr) -> Result<FetchedSettings, WledError> {
        let settings = self.client.fetch_settings(&address.to_string()).await?;
        let saved_to = self.store.save_snapshot(address, &settings).await?;
        Ok(FetchedSettings { settings, saved_to })
    }

    /// Loads a preset by file name and pushes it to the device.
    pub async fn apply_preset(
        &self,
        address: Ipv4Addr,
        preset: &str,
    ) -> Result<ApplyOutcome, WledError> {
        let settings = self.store.load_preset(preset).await?;
        let outcome = self
            .client
            .apply_settings(&address.to_string(), &settings)
            .await?;
        info!("Applied preset {preset} to {address}: {outcome:?}");
        Ok(outcome)
    }
}
