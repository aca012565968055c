use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::sync::Arc;

/// A controller confirmed by a successful `/json/info` probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub name: String,
    #[serde(rename = "ip")]
    pub address: Ipv4Addr,
    pub version: String,
}

/// Append-only set of confirmed devices keyed by address.
///
/// Entries are never replaced or evicted: the first device seen at an address
/// stays for the lifetime of the registry.
#[derive(Debug, Clone, Default)]
pub struct DeviceRegistry {
    devices: Arc<DashMap<Ipv4Addr, Device>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `device` unless its address is already known. Returns whether it
    /// was inserted.
    pub fn insert_if_absent(&self, device: Device) -> bool {
        let mut inserted = false;
        self.devices.entry(device.address).or_insert_with(|| {
            inserted = true;
            device
        });
        inserted
    }

    pub fn contains(&self, address: &Ipv4Addr) -> bool {
        self.devices.contains_key(address)
    }

    pub fn get(&self, address: &Ipv4Addr) -> Option<Device> {
        self.devices.get(address).map(|entry| entry.value().clone())
    }

    /// Snapshot of all devices ordered by address.
    pub fn list(&self) -> Vec<Device> {
        let mut devices: Vec<Device> = self
            .devices
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        devices.sort_by_key(|device| device.address);
        devices
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}
