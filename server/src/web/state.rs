//! State shared by the route handlers and the discovery task.

use metrics_exporter_prometheus::PrometheusHandle;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Instant;
use wled_sync_rs::{DeviceRegistry, SyncService};

/// Last settings operation performed against a device.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceActivity {
    pub operation: &'static str,
    pub success: bool,
    pub detail: String,
    pub seconds_ago: u64,
}

#[derive(Debug, Clone)]
struct ActivityEntry {
    operation: &'static str,
    success: bool,
    detail: String,
    at: Instant,
}

/// Per-device record of the latest fetch or apply.
#[derive(Debug, Clone, Default)]
pub struct ActivityLog {
    inner: Arc<RwLock<HashMap<Ipv4Addr, ActivityEntry>>>,
}

impl ActivityLog {
    pub fn record(&self, address: Ipv4Addr, operation: &'static str, success: bool, detail: String) {
        self.inner.write().insert(
            address,
            ActivityEntry {
                operation,
                success,
                detail,
                at: Instant::now(),
            },
        );
    }

    pub fn get(&self, address: &Ipv4Addr) -> Option<DeviceActivity> {
        self.inner.read().get(address).map(|entry| DeviceActivity {
            operation: entry.operation,
            success: entry.success,
            detail: entry.detail.clone(),
            seconds_ago: entry.at.elapsed().as_secs(),
        })
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }
}

/// Application state handed to every route handler.
#[derive(Clone)]
pub struct AppState {
    pub service: SyncService,
    pub registry: DeviceRegistry,
    pub activity: ActivityLog,
    pub metrics_handle: PrometheusHandle,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        service: SyncService,
        registry: DeviceRegistry,
        metrics_handle: PrometheusHandle,
    ) -> Self {
        Self {
            service,
            registry,
            activity: ActivityLog::default(),
            metrics_handle,
            start_time: Instant::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activity_keeps_latest_operation_per_device() {
        let log = ActivityLog::default();
        let address = Ipv4Addr::new(10, 0, 0, 5);
        log.record(address, "fetch", true, "saved".to_string());
        log.record(address, "apply", false, "401".to_string());

        let activity = log.get(&address).unwrap();
        assert_eq!(activity.operation, "apply");
        assert!(!activity.success);
        assert_eq!(log.len(), 1);
        assert!(log.get(&Ipv4Addr::new(10, 0, 0, 6)).is_none());
    }
}
