mod protocol;
pub mod service;
pub mod store;
pub mod sync;

pub use protocol::client::*;
pub use protocol::framing::is_chunked_framing_defect;
pub use protocol::registry::{Device, DeviceRegistry};
pub use protocol::scanner::{
    Advertisement, DEFAULT_SERVICE_TYPE, DeviceProbe, DiscoveryCollector, MdnsBrowser, Scanner,
};
pub use service::{FetchedSettings, SyncService};
pub use store::SettingsStore;
pub use sync::SettingsDocument;
