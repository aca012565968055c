//! Encoder producing the `application/x-www-form-urlencoded` body accepted by
//! `POST /settings/sync`.

use url::form_urlencoded;

use crate::sync::document::SettingsDocument;
use crate::sync::wire::{self, Emit, Slot};

pub const CHECKBOX_ON: &str = "on";
pub const CHECKBOX_OFF: &str = "off";

/// Keys whose values never appear in logs.
pub const SECRET_KEYS: &[&str] = &["MQPASS"];
pub const REDACTED: &str = "***";

/// Encodes a document into a form body.
///
/// Fields are written in wire table order. `None` fields are left out, pinned
/// keys are always written with their fixed value and nothing is validated.
pub fn encode(doc: &SettingsDocument) -> String {
    serialize(form_pairs(doc))
}

/// Same body as [`encode`] with the values of [`SECRET_KEYS`] masked.
pub fn encode_redacted(doc: &SettingsDocument) -> String {
    serialize(form_pairs(doc).into_iter().map(|(key, value)| {
        if SECRET_KEYS.contains(&key) {
            (key, REDACTED.to_string())
        } else {
            (key, value)
        }
    }))
}

fn serialize(pairs: impl IntoIterator<Item = (&'static str, String)>) -> String {
    let mut form = form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        form.append_pair(key, &value);
    }
    form.finish()
}

/// The `(key, value)` pairs [`encode`] writes, before percent-encoding.
pub fn form_pairs(doc: &SettingsDocument) -> Vec<(&'static str, String)> {
    let octets = split_octets(doc.hue.ip.as_deref());
    let mut pairs = Vec::new();

    for field in wire::emitted() {
        let value = match field.emit {
            Emit::Pinned(value) => Some(value.to_string()),
            Emit::Never => None,
            Emit::Field => match field.slot {
                Slot::Checked { get, .. } => get(doc).map(|checked| checkbox(checked).to_string()),
                Slot::Value { get, .. } => get(doc).map(str::to_string),
                Slot::HueOctet(index) => octets.get(index).map(|octet| octet.to_string()),
            },
        };
        if let Some(value) = value {
            pairs.push((field.key, value));
        }
    }
    pairs
}

pub fn checkbox(checked: bool) -> &'static str {
    if checked { CHECKBOX_ON } else { CHECKBOX_OFF }
}

/// Splits a dotted address into its segments, at most four.
///
/// Segments are passed through untouched, including a `null` placeholder left
/// by the decoder for a missing octet; the device decides what it accepts.
fn split_octets(ip: Option<&str>) -> Vec<&str> {
    ip.map(|ip| ip.split('.').take(4).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::decode::decode;
    use crate::sync::wire::{WIRE_TABLE, WireKind};

    fn pairs(doc: &SettingsDocument) -> Vec<(String, String)> {
        form_urlencoded::parse(encode(doc).as_bytes())
            .into_owned()
            .collect()
    }

    fn get<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
        pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn empty_document_emits_only_pinned_fields() {
        assert_eq!(
            encode(&SettingsDocument::default()),
            "G1=on&R1=on&PY=0&AI=&AP=0&HL=2&BD=10000"
        );
    }

    #[test]
    fn pinned_fields_override_document_values() {
        let mut doc = SettingsDocument::default();
        doc.udp.send_group1 = Some(false);
        doc.udp.receive_group1 = Some(false);
        doc.realtime.e131_port_priority = Some("5".to_string());
        doc.hue.poll_hue_light = Some("7".to_string());
        doc.additional.ai = Some("Kitchen".to_string());
        doc.additional.ap = Some("3".to_string());
        doc.additional.bd = Some("1152".to_string());

        let pairs = pairs(&doc);
        assert_eq!(get(&pairs, "G1"), Some("on"));
        assert_eq!(get(&pairs, "R1"), Some("on"));
        assert_eq!(get(&pairs, "PY"), Some("0"));
        assert_eq!(get(&pairs, "HL"), Some("2"));
        assert_eq!(get(&pairs, "AI"), Some(""));
        assert_eq!(get(&pairs, "AP"), Some("0"));
        assert_eq!(get(&pairs, "BD"), Some("10000"));
        assert_eq!(pairs.iter().filter(|(k, _)| k == "G1").count(), 1);
    }

    #[test]
    fn booleans_are_on_off_and_values_pass_through() {
        let mut doc = SettingsDocument::default();
        doc.udp.udp_port = Some("21324".to_string());
        doc.sync.receive_brightness = Some(true);
        doc.sync.receive_color = Some(false);
        doc.mqtt.port = Some("99999".to_string());

        let body = encode(&doc);
        assert!(body.starts_with("UP=21324&G1=on&R1=on&RB=on&RC=off&"));
        assert!(body.contains("MQPORT=99999"));
    }

    #[test]
    fn values_are_form_encoded() {
        let mut doc = SettingsDocument::default();
        doc.mqtt.device_topic = Some("wled/living room".to_string());
        doc.mqtt.password = Some("p&ss=1".to_string());
        let body = encode(&doc);
        assert!(body.contains("MD=wled%2Fliving+room"));
        assert!(body.contains("MQPASS=p%26ss%3D1"));
    }

    #[test]
    fn redacted_body_masks_the_mqtt_password() {
        let mut doc = SettingsDocument::default();
        doc.mqtt.broker = Some("10.0.0.2".to_string());
        doc.mqtt.password = Some("hunter2".to_string());

        let body = encode_redacted(&doc);
        assert!(body.contains("MQPASS=***"));
        assert!(body.contains("MS=10.0.0.2"));
        assert!(!body.contains("hunter2"));
        assert!(encode(&doc).contains("MQPASS=hunter2"));

        doc.mqtt.password = None;
        assert_eq!(encode_redacted(&doc), encode(&doc));
    }

    #[test]
    fn hue_address_is_split_into_octets() {
        let mut doc = SettingsDocument::default();
        doc.hue.ip = Some("192.168.1.7".to_string());
        let body = encode(&doc);
        assert!(body.ends_with("H0=192&H1=168&H2=1&H3=7&BD=10000"));

        doc.hue.ip = Some("192.null.1.7".to_string());
        assert!(encode(&doc).ends_with("H0=192&H1=null&H2=1&H3=7&BD=10000"));

        doc.hue.ip = Some("10.0".to_string());
        assert!(encode(&doc).ends_with("HL=2&H0=10&H1=0&BD=10000"));
    }

    fn synthetic_payload(key: &str, kind: WireKind) -> (String, &'static str) {
        match kind {
            WireKind::Checked => (format!("d.Sf.{key}.checked=1;"), CHECKBOX_ON),
            WireKind::Value => (format!("d.Sf.{key}.value=42;"), "42"),
        }
    }

    #[test]
    fn every_round_trippable_key_reemits_its_value() {
        for field in wire::emitted() {
            if field.emit != Emit::Field || matches!(field.slot, Slot::HueOctet(_)) {
                continue;
            }
            let (payload, expected) = synthetic_payload(field.key, field.kind());
            let pairs = pairs(&decode(&payload));
            assert_eq!(get(&pairs, field.key), Some(expected), "key {}", field.key);
        }
    }

    #[test]
    fn unchecked_and_quoted_values_round_trip() {
        let fields = WIRE_TABLE
            .iter()
            .filter(|f| f.emit == Emit::Field && !matches!(f.slot, Slot::HueOctet(_)));
        for field in fields {
            let (payload, expected) = match field.kind() {
                WireKind::Checked => (format!("d.Sf.{}.checked=0;", field.key), "off"),
                WireKind::Value => (format!("d.Sf.{}.value=\"a b\";", field.key), "a b"),
            };
            let pairs = pairs(&decode(&payload));
            assert_eq!(get(&pairs, field.key), Some(expected), "key {}", field.key);
        }
    }

    #[test]
    fn hue_octets_round_trip() {
        let doc = decode("d.Sf.H0.value=10;d.Sf.H1.value=0;d.Sf.H2.value=0;d.Sf.H3.value=42;");
        let pairs = pairs(&doc);
        assert_eq!(get(&pairs, "H0"), Some("10"));
        assert_eq!(get(&pairs, "H1"), Some("0"));
        assert_eq!(get(&pairs, "H2"), Some("0"));
        assert_eq!(get(&pairs, "H3"), Some("42"));
    }
}
