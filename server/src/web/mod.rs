//! HTTP façade: device list, settings capture, preset application and the
//! static UI.

pub mod metrics;
pub mod state;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use wled_sync_rs::{ApplyOutcome, WledError};

use crate::web::metrics::Metrics;
use crate::web::state::AppState;

#[derive(Debug, Clone)]
pub struct WebConfig {
    pub port: u16,
    /// Directory served for every path not matched by an API route.
    pub public_dir: PathBuf,
}

/// Binds the listener and serves in the background. Returns the bound address.
pub async fn start_web_server(
    config: WebConfig,
    state: AppState,
) -> Result<SocketAddr, std::io::Error> {
    let app = router(state, config.public_dir);

    let listener = TcpListener::bind(SocketAddr::from(([0, 0, 0, 0], config.port))).await?;
    let addr = listener.local_addr()?;
    info!("Server running at http://{addr}");

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Web server error: {e}");
        }
    });

    Ok(addr)
}

pub fn router(state: AppState, public_dir: PathBuf) -> Router {
    Router::new()
        .route("/api/devices", get(devices_handler))
        .route("/api/sync-settings/{ip}", get(sync_settings_handler))
        .route("/api/presets", get(presets_handler))
        .route("/api/apply-preset/{ip}", post(apply_preset_handler))
        .route("/api/status", get(api_status_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .fallback_service(ServeDir::new(public_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Failures of the API routes, rendered as `{ error, message }`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid IP address: {0}")]
    InvalidAddress(String),
    #[error("Invalid request body")]
    InvalidBody(#[from] JsonRejection),
    #[error("Failed to fetch sync settings")]
    FetchSettings(#[source] WledError),
    #[error("Failed to read presets directory")]
    ListPresets(#[source] WledError),
    #[error("Failed to apply preset")]
    ApplyPreset(#[source] WledError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidAddress(_) | ApiError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            ApiError::FetchSettings(_) | ApiError::ListPresets(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::ApplyPreset(source) => match source {
                WledError::Rejected { status, .. } => {
                    StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
                }
                WledError::InvalidPresetName(_) => StatusCode::BAD_REQUEST,
                WledError::Io(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    StatusCode::NOT_FOUND
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn message(&self) -> Option<String> {
        match self {
            ApiError::InvalidAddress(_) | ApiError::ListPresets(_) => None,
            ApiError::InvalidBody(rejection) => Some(rejection.body_text()),
            ApiError::FetchSettings(source) => Some(source.to_string()),
            ApiError::ApplyPreset(WledError::Rejected { body, .. }) => Some(body.clone()),
            ApiError::ApplyPreset(source) => Some(source.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self.message() {
            Some(message) => json!({ "error": self.to_string(), "message": message }),
            None => json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

fn parse_address(ip: &str) -> Result<Ipv4Addr, ApiError> {
    ip.parse()
        .map_err(|_| ApiError::InvalidAddress(ip.to_string()))
}

async fn devices_handler(State(state): State<AppState>) -> Response {
    let devices = state.registry.list();
    Metrics::set_device_count(devices.len());
    Json(devices).into_response()
}

async fn sync_settings_handler(
    State(state): State<AppState>,
    Path(ip): Path<String>,
) -> Result<Response, ApiError> {
    let address = parse_address(&ip)?;
    match state.service.fetch_settings(address).await {
        Ok(fetched) => {
            Metrics::record_settings_fetch(true);
            let saved_to = fetched
                .saved_to
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            state
                .activity
                .record(address, "fetch", true, saved_to.clone());
            Ok(Json(json!({ "settings": fetched.settings, "savedTo": saved_to })).into_response())
        }
        Err(e) => {
            Metrics::record_settings_fetch(false);
            error!("Error fetching sync settings from {address}: {e}");
            state.activity.record(address, "fetch", false, e.to_string());
            Err(ApiError::FetchSettings(e))
        }
    }
}

async fn presets_handler(State(state): State<AppState>) -> Result<Response, ApiError> {
    let presets = state.service.store().list_presets().await.map_err(|e| {
        error!("Error reading presets directory: {e}");
        ApiError::ListPresets(e)
    })?;
    Ok(Json(presets).into_response())
}

#[derive(Debug, Deserialize)]
pub struct ApplyPresetRequest {
    pub preset: String,
}

async fn apply_preset_handler(
    State(state): State<AppState>,
    Path(ip): Path<String>,
    payload: Result<Json<ApplyPresetRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let address = parse_address(&ip)?;
    let Json(request) = payload?;
    info!("Applying preset {} to device {address}", request.preset);

    match state.service.apply_preset(address, &request.preset).await {
        Ok(outcome) => {
            Metrics::record_preset_apply(match outcome {
                ApplyOutcome::Applied => "applied",
                ApplyOutcome::AppliedDespiteFramingDefect => "applied_framing_defect",
            });
            state
                .activity
                .record(address, "apply", true, request.preset.clone());
            Ok(Json(json!({ "success": true, "message": outcome.message() })).into_response())
        }
        Err(e) => {
            Metrics::record_preset_apply("failed");
            warn!("Error applying preset {} to {address}: {e}", request.preset);
            state.activity.record(address, "apply", false, e.to_string());
            Err(ApiError::ApplyPreset(e))
        }
    }
}

async fn api_status_handler(State(state): State<AppState>) -> Response {
    let devices: Vec<_> = state
        .registry
        .list()
        .into_iter()
        .map(|device| {
            let activity = state.activity.get(&device.address);
            json!({ "device": device, "lastActivity": activity })
        })
        .collect();

    Json(json!({
        "status": "ok",
        "uptime_seconds": state.start_time.elapsed().as_secs(),
        "device_count": devices.len(),
        "devices_with_activity": state.activity.len(),
        "devices": devices,
    }))
    .into_response()
}

async fn health_handler() -> Response {
    (StatusCode::OK, "OK").into_response()
}

async fn metrics_handler(State(state): State<AppState>) -> Response {
    Metrics::set_uptime(state.start_time);
    Metrics::set_device_count(state.registry.len());

    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        state.metrics_handle.render(),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use serde_json::Value;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};
    use wled_sync_rs::{Device, DeviceRegistry, SettingsStore, SyncService, WledClient, WledOptions};

    struct Harness {
        base: String,
        device: MockServer,
        dir: TempDir,
        registry: DeviceRegistry,
        http: reqwest::Client,
    }

    impl Harness {
        async fn start() -> Self {
            let device = MockServer::start().await;
            let dir = TempDir::new().unwrap();
            let public_dir = dir.path().join("public");
            std::fs::create_dir_all(&public_dir).unwrap();
            std::fs::write(public_dir.join("index.html"), "<h1>wled sync</h1>").unwrap();
            std::fs::create_dir_all(dir.path().join("presets")).unwrap();

            let store = SettingsStore::new(dir.path().join("presets"), dir.path().join("snapshots"));
            store.prepare().await.unwrap();
            let options = WledOptions::builder()
                .port(device.address().port())
                .build()
                .unwrap();
            let service = SyncService::new(WledClient::new(options).unwrap(), store);
            let registry = DeviceRegistry::new();
            let handle = PrometheusBuilder::new().build_recorder().handle();
            let state = AppState::new(service, registry.clone(), handle);

            let addr = start_web_server(
                WebConfig {
                    port: 0,
                    public_dir,
                },
                state,
            )
            .await
            .unwrap();

            Self {
                base: format!("http://127.0.0.1:{}", addr.port()),
                device,
                dir,
                registry,
                http: reqwest::Client::new(),
            }
        }

        fn write_preset(&self, name: &str, content: &str) {
            std::fs::write(self.dir.path().join("presets").join(name), content).unwrap();
        }

        async fn apply(&self, ip: &str, preset: &str) -> (u16, Value) {
            let response = self
                .http
                .post(format!("{}/api/apply-preset/{ip}", self.base))
                .json(&json!({ "preset": preset }))
                .send()
                .await
                .unwrap();
            let status = response.status().as_u16();
            (status, response.json().await.unwrap())
        }
    }

    #[tokio::test]
    async fn lists_registered_devices() {
        let harness = Harness::start().await;
        harness.registry.insert_if_absent(Device {
            name: "wled-desk.local".to_string(),
            address: Ipv4Addr::new(10, 0, 0, 5),
            version: "0.14.4".to_string(),
        });

        let devices: Value = reqwest::get(format!("{}/api/devices", harness.base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(
            devices,
            json!([{ "name": "wled-desk.local", "ip": "10.0.0.5", "version": "0.14.4" }])
        );
    }

    #[tokio::test]
    async fn sync_settings_are_decoded_and_saved() {
        let harness = Harness::start().await;
        Mock::given(method("GET"))
            .and(path("/settings/s.js"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("d.Sf.UP.value=21324;d.Sf.RB.checked=1;d.Sf.MS.value=\"10.0.0.2\";"),
            )
            .mount(&harness.device)
            .await;

        let response = reqwest::get(format!("{}/api/sync-settings/127.0.0.1", harness.base))
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["settings"]["udp"]["UDPPort"], "21324");
        assert_eq!(body["settings"]["sync"]["receiveBrightness"], true);
        assert_eq!(body["settings"]["sync"]["receiveColor"], Value::Null);
        assert_eq!(body["settings"]["mqtt"]["broker"], "10.0.0.2");
        assert_eq!(body["savedTo"], "wled-sync-127-0-0-1.json");
        assert!(
            harness
                .dir
                .path()
                .join("snapshots/wled-sync-127-0-0-1.json")
                .is_file()
        );
    }

    #[tokio::test]
    async fn sync_settings_failure_is_500() {
        let harness = Harness::start().await;
        Mock::given(method("GET"))
            .and(path("/settings/s.js"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&harness.device)
            .await;

        let response = reqwest::get(format!("{}/api/sync-settings/127.0.0.1", harness.base))
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 500);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "Failed to fetch sync settings");
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn invalid_address_is_rejected() {
        let harness = Harness::start().await;
        let response = reqwest::get(format!("{}/api/sync-settings/not-an-ip", harness.base))
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400);
    }

    #[tokio::test]
    async fn lists_presets() {
        let harness = Harness::start().await;
        harness.write_preset("b.json", "{}");
        harness.write_preset("a.json", "{}");
        harness.write_preset("readme.md", "");

        let presets: Value = reqwest::get(format!("{}/api/presets", harness.base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(presets, json!(["a.json", "b.json"]));
    }

    #[tokio::test]
    async fn applies_preset() {
        let harness = Harness::start().await;
        harness.write_preset("living.json", r#"{"sync":{"receiveBrightness":true}}"#);
        Mock::given(method("POST"))
            .and(path("/settings/sync"))
            .respond_with(ResponseTemplate::new(200).set_body_string("saved"))
            .expect(1)
            .mount(&harness.device)
            .await;

        let (status, body) = harness.apply("127.0.0.1", "living.json").await;
        assert_eq!(status, 200);
        assert_eq!(
            body,
            json!({ "success": true, "message": "Preset applied successfully" })
        );
    }

    #[tokio::test]
    async fn device_rejection_keeps_status_and_body() {
        let harness = Harness::start().await;
        harness.write_preset("living.json", "{}");
        Mock::given(method("POST"))
            .and(path("/settings/sync"))
            .respond_with(ResponseTemplate::new(401).set_body_string("PIN required"))
            .mount(&harness.device)
            .await;

        let (status, body) = harness.apply("127.0.0.1", "living.json").await;
        assert_eq!(status, 401);
        assert_eq!(
            body,
            json!({ "error": "Failed to apply preset", "message": "PIN required" })
        );
    }

    async fn post_apply_body(harness: &Harness, content_type: Option<&str>, body: &str) -> (u16, Value) {
        let mut request = harness
            .http
            .post(format!("{}/api/apply-preset/127.0.0.1", harness.base))
            .body(body.to_string());
        if let Some(content_type) = content_type {
            request = request.header("content-type", content_type);
        }
        let response = request.send().await.unwrap();
        let status = response.status().as_u16();
        let text = response.text().await.unwrap();
        (status, serde_json::from_str(&text).unwrap())
    }

    #[tokio::test]
    async fn malformed_apply_body_is_a_json_400() {
        let harness = Harness::start().await;

        let (status, body) = post_apply_body(&harness, None, "preset=living.json").await;
        assert_eq!(status, 400);
        assert_eq!(body["error"], "Invalid request body");
        assert!(body["message"].as_str().unwrap().contains("Content-Type"));

        let (status, body) = post_apply_body(&harness, Some("application/json"), "{\"preset\":").await;
        assert_eq!(status, 400);
        assert_eq!(body["error"], "Invalid request body");

        let (status, body) = post_apply_body(&harness, Some("application/json"), "{}").await;
        assert_eq!(status, 400);
        assert!(body["message"].as_str().unwrap().contains("preset"));
    }

    #[tokio::test]
    async fn unsafe_or_missing_preset_names() {
        let harness = Harness::start().await;
        let (status, body) = harness.apply("127.0.0.1", "..%2Fsecret.json").await;
        assert_eq!(status, 400, "{body}");
        let (status, body) = harness.apply("127.0.0.1", "../secret.json").await;
        assert_eq!(status, 400, "{body}");
        let (status, _) = harness.apply("127.0.0.1", "absent.json").await;
        assert_eq!(status, 404);
    }

    #[tokio::test]
    async fn serves_health_metrics_and_static_files() {
        let harness = Harness::start().await;

        let health = reqwest::get(format!("{}/health", harness.base)).await.unwrap();
        assert_eq!(health.text().await.unwrap(), "OK");

        let metrics = reqwest::get(format!("{}/metrics", harness.base)).await.unwrap();
        assert_eq!(metrics.status().as_u16(), 200);

        let index = reqwest::get(format!("{}/", harness.base)).await.unwrap();
        assert_eq!(index.text().await.unwrap(), "<h1>wled sync</h1>");

        let missing = reqwest::get(format!("{}/nope.css", harness.base)).await.unwrap();
        assert_eq!(missing.status().as_u16(), 404);
    }

    #[test]
    fn bundled_ui_inserts_device_data_as_text() {
        let index = std::fs::read_to_string(
            std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../public/index.html"),
        )
        .unwrap();
        assert!(!index.contains("innerHTML"));
        assert!(!index.contains("onclick"));
        assert!(index.contains("textContent"));
    }

    #[tokio::test]
    async fn status_reports_last_activity() {
        let harness = Harness::start().await;
        harness.registry.insert_if_absent(Device {
            name: "desk".to_string(),
            address: Ipv4Addr::LOCALHOST,
            version: "0.14.4".to_string(),
        });
        harness.write_preset("living.json", "{}");
        Mock::given(method("POST"))
            .and(path("/settings/sync"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&harness.device)
            .await;
        harness.apply("127.0.0.1", "living.json").await;

        let status: Value = reqwest::get(format!("{}/api/status", harness.base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(status["device_count"], 1);
        assert_eq!(status["devices"][0]["lastActivity"]["operation"], "apply");
        assert_eq!(status["devices"][0]["lastActivity"]["success"], true);
    }
}
