//! Structured view of a device's sync/interface settings page.
//!
//! Every field is optional: `None` means the value was not present in the
//! source, never "false" or "zero". Only the fields the wire table knows about
//! are captured, so a document is a lossy projection of the real configuration.

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsDocument {
    pub udp: UdpSettings,
    pub sync: SyncSettings,
    pub instance: InstanceSettings,
    pub realtime: RealtimeSettings,
    pub mqtt: MqttSettings,
    pub hue: HueSettings,
    pub additional: AdditionalSettings,
}

impl SettingsDocument {
    /// True when no field in any section carries a value.
    pub fn is_empty(&self) -> bool {
        *self == SettingsDocument::default()
    }
}

/// UDP notifier ports and sync groups.
///
/// `send_group`/`receive_group` hold the checkbox bitmask as the device renders
/// it (sum of `2^(n-1)` for every ticked group). The numbered booleans are the
/// same checkboxes exposed individually; both are kept because the device
/// exposes both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UdpSettings {
    #[serde(rename = "UDPPort", alias = "primaryPort", deserialize_with = "lenient_string")]
    pub udp_port: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub secondary_port: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub send_group: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub receive_group: Option<String>,
    pub send_group1: Option<bool>,
    pub send_group2: Option<bool>,
    pub send_group3: Option<bool>,
    pub send_group4: Option<bool>,
    pub send_group5: Option<bool>,
    pub send_group6: Option<bool>,
    pub send_group7: Option<bool>,
    pub send_group8: Option<bool>,
    pub receive_group1: Option<bool>,
    pub receive_group2: Option<bool>,
    pub receive_group3: Option<bool>,
    pub receive_group4: Option<bool>,
    pub receive_group5: Option<bool>,
    pub receive_group6: Option<bool>,
    pub receive_group7: Option<bool>,
    pub receive_group8: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SyncSettings {
    pub receive_brightness: Option<bool>,
    pub receive_color: Option<bool>,
    pub receive_effects: Option<bool>,
    pub receive_segment_options: Option<bool>,
    pub notify_direct: Option<bool>,
    pub notify_button: Option<bool>,
    pub notify_alexa: Option<bool>,
    pub notify_hue: Option<bool>,
    pub notify_macro: Option<bool>,
    #[serde(deserialize_with = "lenient_string")]
    pub udp_retransmit: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InstanceSettings {
    pub enable_list: Option<bool>,
    pub discoverable: Option<bool>,
}

/// Realtime (E1.31 / Art-Net / DMX) receiver settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RealtimeSettings {
    #[serde(rename = "receiveUDP")]
    pub receive_udp: Option<bool>,
    pub use_main_segment: Option<bool>,
    #[serde(alias = "dmxAddress", deserialize_with = "lenient_string")]
    pub dmx_start_address: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub dmx_mode: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub dmx_timeout: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub dmx_segment_spacing: Option<String>,
    #[serde(rename = "e131portPriority", deserialize_with = "lenient_string")]
    pub e131_port_priority: Option<String>,
    #[serde(rename = "e131Multicast")]
    pub e131_multicast: Option<bool>,
    #[serde(rename = "e131SkipOutOfSequence")]
    pub e131_skip_out_of_sequence: Option<bool>,
    #[serde(alias = "e131Universe", deserialize_with = "lenient_string")]
    pub start_universe: Option<String>,
    pub force_brightness: Option<bool>,
    pub disable_gamma_correction: Option<bool>,
    #[serde(deserialize_with = "lenient_string")]
    pub led_offset: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MqttSettings {
    pub enabled: Option<bool>,
    #[serde(deserialize_with = "lenient_string")]
    pub broker: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub port: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub username: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub password: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub client_id: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub device_topic: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub group_topic: Option<String>,
    pub button_publish: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HueSettings {
    pub poll_enabled: Option<bool>,
    pub on_off: Option<bool>,
    pub brightness: Option<bool>,
    pub color: Option<bool>,
    #[serde(deserialize_with = "lenient_string")]
    pub poll_hue_light: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub poll_interval: Option<String>,
    /// Bridge address assembled from the `H0`..`H3` octet fields.
    #[serde(deserialize_with = "lenient_string")]
    pub ip: Option<String>,
}

/// Fields without a clear home on the settings page.
///
/// `g1`/`r1` mirror `udp.sendGroup1`/`udp.receiveGroup1`. `di`/`ep` hold the
/// realtime port (0 in custom mode, 5568 for E1.31, 6454 for Art-Net), `ai` the
/// Alexa invocation name, `ap` the number of presets emulated as Alexa devices
/// and `bd` the serial baud rate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdditionalSettings {
    pub g1: Option<bool>,
    pub r1: Option<bool>,
    #[serde(deserialize_with = "lenient_string")]
    pub di: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub ai: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub ap: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub bd: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub ep: Option<String>,
}

/// Accepts a string, a number or null for a scalar field.
///
/// Presets are usually written by the decoder (strings everywhere), but hand
/// edited files tend to use bare numbers for ports and universes.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(Option::<Scalar>::deserialize(deserializer)?.map(|scalar| match scalar {
        Scalar::Text(text) => text,
        Scalar::Number(number) => number.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_document_serializes_every_field_as_null() {
        let json = serde_json::to_value(SettingsDocument::default()).unwrap();
        assert!(json["udp"]["UDPPort"].is_null());
        assert!(json["sync"]["receiveBrightness"].is_null());
        assert!(json["realtime"]["receiveUDP"].is_null());
        assert!(json["realtime"]["e131portPriority"].is_null());
        assert!(json["hue"]["ip"].is_null());
        assert!(json["additional"]["bd"].is_null());
    }

    #[test]
    fn missing_sections_load_as_empty() {
        let doc: SettingsDocument = serde_json::from_str(r#"{"sync":{"receiveColor":true}}"#).unwrap();
        assert_eq!(doc.sync.receive_color, Some(true));
        assert_eq!(doc.udp, UdpSettings::default());
        assert!(!doc.is_empty());
        assert!(SettingsDocument::default().is_empty());
    }

    #[test]
    fn accepts_encoder_side_aliases_and_numbers() {
        let json = r#"{
            "udp": { "primaryPort": 21324, "secondaryPort": "65506" },
            "realtime": { "dmxAddress": 1, "e131Universe": "2" },
            "mqtt": { "port": 1883, "broker": null }
        }"#;
        let doc: SettingsDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.udp.udp_port.as_deref(), Some("21324"));
        assert_eq!(doc.udp.secondary_port.as_deref(), Some("65506"));
        assert_eq!(doc.realtime.dmx_start_address.as_deref(), Some("1"));
        assert_eq!(doc.realtime.start_universe.as_deref(), Some("2"));
        assert_eq!(doc.mqtt.port.as_deref(), Some("1883"));
        assert_eq!(doc.mqtt.broker, None);
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let mut doc = SettingsDocument::default();
        doc.udp.udp_port = Some("21324".to_string());
        doc.udp.send_group3 = Some(false);
        doc.hue.ip = Some("192.168.1.7".to_string());
        let json = serde_json::to_string_pretty(&doc).unwrap();
        let back: SettingsDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(back, doc);
    }
}
