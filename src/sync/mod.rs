//! Codec between the device's sync settings page and [`SettingsDocument`].

pub mod decode;
pub mod document;
pub mod encode;
pub mod wire;

pub use decode::{SettingsDecoder, decode};
pub use document::SettingsDocument;
pub use encode::{encode, encode_redacted};
