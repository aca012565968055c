mod discovery;
mod logging;
mod settings;
mod web;

use anyhow::{Context, Result};
use clap::Parser;
use clap_derive::Parser;
use logging::{LogConfig, LogGuard, RotationPeriod, setup_console_logging, setup_dual_logging};
use settings::Settings;
use std::path::PathBuf;
use tracing::{info, warn};
use wled_sync_rs::{DeviceRegistry, SettingsStore, SyncService, WledClient, WledOptions};

use crate::discovery::start_discovery;
use crate::web::metrics::{Metrics, init_metrics};
use crate::web::state::AppState;
use crate::web::{WebConfig, start_web_server};

#[derive(Parser, Debug)]
pub struct Params {
    /// Port the HTTP server listens on (default: 3000)
    #[clap(long)]
    port: Option<u16>,
    /// Directory holding preset JSON files
    #[clap(long)]
    presets_dir: Option<String>,
    /// Directory where fetched settings are saved
    #[clap(long)]
    snapshots_dir: Option<String>,
    /// Directory with the static web UI
    #[clap(long)]
    public_dir: Option<String>,
    /// mDNS service type to browse
    #[clap(long)]
    service_type: Option<String>,
    /// Settings file path (if not set, default settings are used)
    #[clap(long)]
    settings: Option<String>,
    /// Directory for rotating log files (if not set, logs go to stdout only)
    #[clap(long)]
    log_dir: Option<String>,
    /// Log rotation period: minutely, hourly, daily or never
    #[clap(long, default_value = "daily")]
    log_rotation: RotationPeriod,
    /// Number of rotated log files to keep (0 keeps all)
    #[clap(long, default_value = "7")]
    max_log_files: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let params = Params::parse();
    let _log_guard = setup_logging(&params)?;
    let settings = load_settings(&params)?;

    let metrics_handle = init_metrics().context("Failed to install metrics recorder")?;
    Metrics::set_info(env!("CARGO_PKG_VERSION"));

    let options = WledOptions::builder()
        .port(settings.device_port)
        .probe_timeout(settings.probe_timeout())
        .fetch_timeout(settings.fetch_timeout())
        .apply_timeout(settings.apply_timeout())
        .tolerate_chunked_framing_defect(settings.tolerate_chunked_framing_defect)
        .build()?;
    let client = WledClient::new(options)?;

    let store = SettingsStore::new(&settings.presets_dir, &settings.snapshots_dir);
    store
        .prepare()
        .await
        .with_context(|| format!("Failed to create {}", settings.snapshots_dir))?;

    let registry = DeviceRegistry::new();
    let (browser, _discovery) =
        start_discovery(client.clone(), registry.clone(), &settings.service_type)?;

    let state = AppState::new(SyncService::new(client, store), registry, metrics_handle);
    start_web_server(
        WebConfig {
            port: settings.port,
            public_dir: PathBuf::from(&settings.public_dir),
        },
        state,
    )
    .await?;

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    browser.shutdown();
    Ok(())
}

/// Reads the settings file, then applies command line overrides.
fn load_settings(params: &Params) -> Result<Settings> {
    let mut settings = match &params.settings {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content)
                .with_context(|| format!("Invalid settings file {path}"))?,
            Err(e) => {
                warn!("Failed to read settings file {path} ({e}), using default settings");
                Settings::default()
            }
        },
        None => Settings::default(),
    };

    if let Some(port) = params.port {
        settings.port = port;
    }
    if let Some(dir) = &params.presets_dir {
        settings.presets_dir = dir.clone();
    }
    if let Some(dir) = &params.snapshots_dir {
        settings.snapshots_dir = dir.clone();
    }
    if let Some(dir) = &params.public_dir {
        settings.public_dir = dir.clone();
    }
    if let Some(service_type) = &params.service_type {
        settings.service_type = service_type.clone();
    }
    Ok(settings)
}

fn setup_logging(params: &Params) -> Result<LogGuard> {
    match &params.log_dir {
        Some(log_dir) => Ok(setup_dual_logging(LogConfig {
            log_dir: log_dir.clone(),
            rotation: params.log_rotation,
            max_log_files: params.max_log_files,
            ..Default::default()
        })?),
        None => Ok(setup_console_logging()),
    }
}
