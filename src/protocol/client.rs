use crate::protocol::framing::{describe, is_chunked_framing_defect};
use crate::sync::{SettingsDocument, decode, encode, encode_redacted};
use derive_builder::Builder;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const INFO_PATH: &str = "/json/info";
pub const SETTINGS_SCRIPT_PATH: &str = "/settings/s.js?p=4";
pub const SETTINGS_SYNC_PATH: &str = "/settings/sync";
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

#[derive(Error, Debug)]
pub enum WledError {
    #[error("Request failed: {}", describe(.0))]
    Http(#[from] reqwest::Error),
    #[error("Device answered {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("Invalid preset name: {0}")]
    InvalidPresetName(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("mDNS error: {0}")]
    Mdns(String),
    #[error("{0}")]
    Generic(String),
}

#[derive(Builder, Debug, Clone)]
pub struct WledOptions {
    /// HTTP port used when a host is given without one.
    #[builder(default = "80")]
    pub port: u16,
    #[builder(default = "Duration::from_secs(2)")]
    pub probe_timeout: Duration,
    #[builder(default = "Duration::from_secs(5)")]
    pub fetch_timeout: Duration,
    #[builder(default = "Duration::from_secs(10)")]
    pub apply_timeout: Duration,
    /// Treat a chunk size parse error after `POST /settings/sync` as success.
    #[builder(default = "true")]
    pub tolerate_chunked_framing_defect: bool,
}

impl WledOptions {
    pub fn builder() -> WledOptionsBuilder {
        WledOptionsBuilder::default()
    }
}

impl Default for WledOptions {
    fn default() -> Self {
        Self {
            port: 80,
            probe_timeout: Duration::from_secs(2),
            fetch_timeout: Duration::from_secs(5),
            apply_timeout: Duration::from_secs(10),
            tolerate_chunked_framing_defect: true,
        }
    }
}

/// Subset of `/json/info` used to confirm a device.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub ver: Option<String>,
    pub name: Option<String>,
    pub mac: Option<String>,
}

/// How a settings push was acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyOutcome {
    /// 2xx with a readable body.
    Applied,
    /// The response could not be parsed because of the known chunked framing
    /// defect. The settings were most likely applied.
    AppliedDespiteFramingDefect,
}

impl ApplyOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            ApplyOutcome::Applied => "Preset applied successfully",
            ApplyOutcome::AppliedDespiteFramingDefect => {
                "Preset likely applied successfully (ignored parsing error)"
            }
        }
    }
}

/// HTTP client for a device's JSON and settings endpoints.
#[derive(Debug, Clone)]
pub struct WledClient {
    http: reqwest::Client,
    options: WledOptions,
}

impl WledClient {
    pub fn new(options: WledOptions) -> Result<Self, WledError> {
        let http = reqwest::Client::builder()
            .redirect(Policy::none())
            .build()?;
        Ok(Self { http, options })
    }

    pub fn options(&self) -> &WledOptions {
        &self.options
    }

    /// Builds a URL for `host`, which is an address or `address:port`.
    fn url(&self, host: &str, path: &str) -> String {
        if host.contains(':') {
            format!("http://{host}{path}")
        } else {
            format!("http://{host}:{}{path}", self.options.port)
        }
    }

    /// `GET /json/info`, bounded by the probe timeout.
    pub async fn info(&self, host: &str) -> Result<DeviceInfo, WledError> {
        let response = self
            .http
            .get(self.url(host, INFO_PATH))
            .timeout(self.options.probe_timeout)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(WledError::Rejected {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        Ok(response.json::<DeviceInfo>().await?)
    }

    /// `GET /settings/s.js?p=4`, returning the raw script.
    pub async fn settings_script(&self, host: &str) -> Result<String, WledError> {
        let response = self
            .http
            .get(self.url(host, SETTINGS_SCRIPT_PATH))
            .timeout(self.options.fetch_timeout)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(WledError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        debug!("Fetched {} bytes of settings script from {host}", body.len());
        Ok(body)
    }

    /// Fetches and decodes the sync settings page.
    pub async fn fetch_settings(&self, host: &str) -> Result<SettingsDocument, WledError> {
        let script = self.settings_script(host).await?;
        Ok(decode(&script))
    }

    /// Encodes `settings` and posts them to `/settings/sync`.
    pub async fn apply_settings(
        &self,
        host: &str,
        settings: &SettingsDocument,
    ) -> Result<ApplyOutcome, WledError> {
        info!("Sending sync settings to {host}");
        debug!(
            "Form data to be sent to {host}: {}",
            encode_redacted(settings)
        );
        let body = encode(settings);
        self.post_settings_form(host, body).await
    }

    /// Posts an already encoded form body to `/settings/sync`.
    ///
    /// Redirects are not followed: anything outside 2xx is a rejection and is
    /// returned with its status and body.
    pub async fn post_settings_form(
        &self,
        host: &str,
        body: String,
    ) -> Result<ApplyOutcome, WledError> {
        let sent = self
            .http
            .post(self.url(host, SETTINGS_SYNC_PATH))
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(body)
            .timeout(self.options.apply_timeout)
            .send()
            .await;

        let response = match sent {
            Ok(response) => response,
            Err(e) => return self.framing_defect_or(e),
        };

        let status = response.status();
        let text = response.text().await;
        match text {
            Ok(_) if status.is_success() => Ok(ApplyOutcome::Applied),
            Err(e) if status.is_success() => self.framing_defect_or(e),
            text => Err(WledError::Rejected {
                status: status.as_u16(),
                body: text.unwrap_or_default(),
            }),
        }
    }

    fn framing_defect_or(&self, error: reqwest::Error) -> Result<ApplyOutcome, WledError> {
        if self.options.tolerate_chunked_framing_defect && is_chunked_framing_defect(&error) {
            warn!(
                "Ignored chunked framing error, settings likely applied: {}",
                describe(&error)
            );
            Ok(ApplyOutcome::AppliedDespiteFramingDefect)
        } else {
            Err(WledError::Http(error))
        }
    }
}
