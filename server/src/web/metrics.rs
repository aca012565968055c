//! Prometheus metrics served on `/metrics`.

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Installs the global Prometheus recorder and registers metric descriptions.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    register_metric_descriptions();
    Ok(handle)
}

fn register_metric_descriptions() {
    describe_gauge!("wled_sync_info", "Service information (always 1, labels carry the version)");
    describe_gauge!(
        "wled_sync_uptime_seconds",
        "Time in seconds since the service started"
    );
    describe_gauge!("wled_devices_total", "Number of confirmed devices");
    describe_counter!("wled_probe_total", "Device probes by result");
    describe_counter!(
        "wled_settings_fetch_total",
        "Settings fetches by result"
    );
    describe_counter!("wled_preset_apply_total", "Preset applications by outcome");
}

/// Recording helpers.
pub struct Metrics;

impl Metrics {
    pub fn set_info(version: &str) {
        gauge!("wled_sync_info", "version" => version.to_string()).set(1.0);
    }

    pub fn set_uptime(start_time: Instant) {
        gauge!("wled_sync_uptime_seconds").set(start_time.elapsed().as_secs_f64());
    }

    pub fn set_device_count(count: usize) {
        gauge!("wled_devices_total").set(count as f64);
    }

    pub fn record_probe(result: &'static str) {
        counter!("wled_probe_total", "result" => result).increment(1);
    }

    pub fn record_settings_fetch(success: bool) {
        let result = if success { "success" } else { "failure" };
        counter!("wled_settings_fetch_total", "result" => result).increment(1);
    }

    pub fn record_preset_apply(outcome: &'static str) {
        counter!("wled_preset_apply_total", "outcome" => outcome).increment(1);
    }
}
