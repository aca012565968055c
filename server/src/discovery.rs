use async_trait::async_trait;
use std::net::Ipv4Addr;
use tokio::task::JoinHandle;
use tracing::info;
use wled_sync_rs::{
    DeviceInfo, DeviceProbe, DeviceRegistry, DiscoveryCollector, MdnsBrowser, WledError,
};

use crate::web::metrics::Metrics;

/// Probe wrapper that counts attempts by result.
pub struct MeteredProbe<P> {
    inner: P,
}

impl<P> MeteredProbe<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<P: DeviceProbe> DeviceProbe for MeteredProbe<P> {
    async fn probe(&self, address: Ipv4Addr) -> Result<DeviceInfo, WledError> {
        let result = self.inner.probe(address).await;
        Metrics::record_probe(match &result {
            Ok(info) if info.ver.is_some() => "confirmed",
            Ok(_) => "not_wled",
            Err(_) => "failed",
        });
        result
    }
}

/// Browses for `service_type` for the lifetime of the process and feeds the
/// registry. The returned browser must be kept to keep the daemon running.
pub fn start_discovery<P: DeviceProbe + 'static>(
    probe: P,
    registry: DeviceRegistry,
    service_type: &str,
) -> Result<(MdnsBrowser, JoinHandle<()>), WledError> {
    let (browser, advertisements) = MdnsBrowser::start(service_type)?;
    let collector = DiscoveryCollector::new(MeteredProbe::new(probe), registry);
    let handle = tokio::spawn(async move {
        collector.run(advertisements).await;
        info!("Discovery stopped");
    });
    Ok((browser, handle))
}
