use wled_sync_rs::{SettingsStore, SyncService, WledClient, WledError, WledOptions};

use crate::Params;

pub fn create_client(params: &Params) -> Result<WledClient, WledError> {
    let options = WledOptions::builder()
        .port(params.port)
        .tolerate_chunked_framing_defect(!params.strict_framing)
        .build()
        .map_err(|e| WledError::Generic(e.to_string()))?;
    WledClient::new(options)
}

pub fn create_service(params: &Params) -> Result<SyncService, WledError> {
    let store = SettingsStore::new(&params.presets_dir, &params.snapshots_dir);
    Ok(SyncService::new(create_client(params)?, store))
}
