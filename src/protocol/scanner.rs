use crate::protocol::client::{DeviceInfo, WledClient, WledError};
use crate::protocol::registry::{Device, DeviceRegistry};
use async_trait::async_trait;
use dashmap::DashSet;
use mdns_sd::{ServiceDaemon, ServiceEvent};
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Service type WLED firmware advertises its web server under.
pub const DEFAULT_SERVICE_TYPE: &str = "_http._tcp.local.";
pub const UNKNOWN_DEVICE_NAME: &str = "Unknown";

const ADVERTISEMENT_BUFFER: usize = 64;
const RECEIVE_POLL: Duration = Duration::from_millis(250);

/// A resolved mDNS endpoint, reduced to what discovery needs.
#[derive(Debug, Clone, Default)]
pub struct Advertisement {
    pub hostname: Option<String>,
    pub addresses: Vec<IpAddr>,
}

impl Advertisement {
    pub fn ipv4(&self) -> Option<Ipv4Addr> {
        self.addresses.iter().find_map(|address| match address {
            IpAddr::V4(v4) => Some(*v4),
            IpAddr::V6(_) => None,
        })
    }

    /// Hostname without the trailing root dot, e.g. `wled-desk.local`.
    pub fn host_name(&self) -> Option<&str> {
        self.hostname
            .as_deref()
            .map(|hostname| hostname.trim_end_matches('.'))
            .filter(|hostname| !hostname.is_empty())
    }
}

/// Confirms that an address belongs to a controller.
#[async_trait]
pub trait DeviceProbe: Send + Sync {
    async fn probe(&self, address: Ipv4Addr) -> Result<DeviceInfo, WledError>;
}

#[async_trait]
impl DeviceProbe for WledClient {
    async fn probe(&self, address: Ipv4Addr) -> Result<DeviceInfo, WledError> {
        self.info(&address.to_string()).await
    }
}

#[async_trait]
impl<P: DeviceProbe + ?Sized> DeviceProbe for Arc<P> {
    async fn probe(&self, address: Ipv4Addr) -> Result<DeviceInfo, WledError> {
        (**self).probe(address).await
    }
}

/// Turns advertisements into registered devices.
///
/// Each new address is probed once per advertisement. Addresses already in
/// the registry or with a probe in flight are skipped. Probe failures are
/// logged and dropped.
pub struct DiscoveryCollector<P> {
    probe: Arc<P>,
    registry: DeviceRegistry,
    in_flight: Arc<DashSet<Ipv4Addr>>,
}

impl<P> Clone for DiscoveryCollector<P> {
    fn clone(&self) -> Self {
        Self {
            probe: self.probe.clone(),
            registry: self.registry.clone(),
            in_flight: self.in_flight.clone(),
        }
    }
}

impl<P: DeviceProbe + 'static> DiscoveryCollector<P> {
    pub fn new(probe: P, registry: DeviceRegistry) -> Self {
        Self {
            probe: Arc::new(probe),
            registry,
            in_flight: Arc::new(DashSet::new()),
        }
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    /// Probes the advertised address and registers it on success.
    ///
    /// Returns the device only when this call inserted it.
    pub async fn handle_advertisement(&self, advertisement: Advertisement) -> Option<Device> {
        let Some(address) = advertisement.ipv4() else {
            debug!("Ignoring advertisement without IPv4 address: {advertisement:?}");
            return None;
        };
        if self.registry.contains(&address) || !self.in_flight.insert(address) {
            return None;
        }

        let probed = self.probe.probe(address).await;
        self.in_flight.remove(&address);

        let info = match probed {
            Ok(info) => info,
            Err(e) => {
                debug!("Probe of {address} failed: {e}");
                return None;
            }
        };
        let Some(version) = info.ver else {
            debug!("{address} answered without a version, not a controller");
            return None;
        };

        let name = advertisement
            .host_name()
            .map(str::to_string)
            .or(info.name)
            .unwrap_or_else(|| UNKNOWN_DEVICE_NAME.to_string());
        let device = Device {
            name,
            address,
            version,
        };
        if self.registry.insert_if_absent(device.clone()) {
            info!(
                "Found WLED device: {} at {} (version {})",
                device.name, device.address, device.version
            );
            Some(device)
        } else {
            None
        }
    }

    /// Handles advertisements concurrently until the channel closes, then
    /// waits for outstanding probes.
    pub async fn run(self, mut advertisements: mpsc::Receiver<Advertisement>) {
        let mut probes = JoinSet::new();
        while let Some(advertisement) = advertisements.recv().await {
            let collector = self.clone();
            probes.spawn(async move {
                collector.handle_advertisement(advertisement).await;
            });
            while probes.try_join_next().is_some() {}
        }
        while probes.join_next().await.is_some() {}
    }
}

/// mDNS browse session feeding advertisements into a channel.
pub struct MdnsBrowser {
    daemon: ServiceDaemon,
    stopped: Arc<AtomicBool>,
}

impl MdnsBrowser {
    /// Starts browsing `service_type`. The receive loop runs on a blocking
    /// thread until [`MdnsBrowser::shutdown`] is called or the channel is
    /// dropped.
    pub fn start(service_type: &str) -> Result<(Self, mpsc::Receiver<Advertisement>), WledError> {
        let daemon = ServiceDaemon::new().map_err(|e| WledError::Mdns(e.to_string()))?;
        let receiver = daemon
            .browse(service_type)
            .map_err(|e| WledError::Mdns(e.to_string()))?;
        info!("Starting mDNS discovery for {service_type}");

        let (tx, rx) = mpsc::channel(ADVERTISEMENT_BUFFER);
        let stopped = Arc::new(AtomicBool::new(false));
        let stop = stopped.clone();
        tokio::task::spawn_blocking(move || {
            while !stop.load(Ordering::Relaxed) && !tx.is_closed() {
                let event = match receiver.recv_timeout(RECEIVE_POLL) {
                    Ok(event) => event,
                    Err(_) if receiver.is_disconnected() => break,
                    Err(_) => continue,
                };
                match event {
                    ServiceEvent::ServiceResolved(service) => {
                        let advertisement = Advertisement {
                            hostname: Some(service.get_hostname().to_string()),
                            addresses: service
                                .get_addresses()
                                .iter()
                                .filter_map(|address| address.to_string().parse().ok())
                                .collect(),
                        };
                        debug!("mDNS resolved {}: {advertisement:?}", service.get_fullname());
                        if tx.blocking_send(advertisement).is_err() {
                            break;
                        }
                    }
                    ServiceEvent::SearchStopped(_) => {
                        debug!("mDNS search stopped");
                        break;
                    }
                    _ => {}
                }
            }
            debug!("mDNS receive loop finished");
        });

        Ok((Self { daemon, stopped }, rx))
    }

    pub fn shutdown(&self) {
        self.stopped.store(true, Ordering::Relaxed);
        if let Err(e) = self.daemon.shutdown() {
            warn!("Failed to shut down mDNS daemon: {e}");
        }
    }
}

/// One-shot discovery: browse for `window`, then return what was confirmed.
pub struct Scanner;

impl Scanner {
    pub async fn scan(
        client: WledClient,
        service_type: &str,
        window: Duration,
    ) -> Result<Vec<Device>, WledError> {
        let grace = client.options().probe_timeout + RECEIVE_POLL;
        let registry = DeviceRegistry::new();
        let collector = DiscoveryCollector::new(client, registry.clone());
        let (browser, advertisements) = MdnsBrowser::start(service_type)?;

        let collecting = tokio::spawn(collector.run(advertisements));
        tokio::time::sleep(window).await;
        browser.shutdown();
        if tokio::time::timeout(grace, collecting).await.is_err() {
            debug!("Scan finished with probes still pending");
        }

        info!("Scan finished, {} device(s) found", registry.len());
        Ok(registry.list())
    }
}
