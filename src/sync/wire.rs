//! The wire key table shared by the decoder and the encoder.
//!
//! Each entry binds one short form-field code (`UP`, `GS`, `H0`, ...) to a slot
//! in [`SettingsDocument`]. The table order is the order fields are emitted in
//! a form body.

use crate::sync::document::SettingsDocument;

/// How a key is written in the `s.js` settings script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireKind {
    /// `d.Sf.KEY.value=123` or `d.Sf.KEY.value="text"`
    Value,
    /// `d.Sf.KEY.checked=0|1`
    Checked,
}

/// Where a decoded value lands and where an encoded value comes from.
#[derive(Clone, Copy)]
pub enum Slot {
    Checked {
        get: fn(&SettingsDocument) -> Option<bool>,
        set: fn(&mut SettingsDocument, bool),
    },
    Value {
        get: fn(&SettingsDocument) -> Option<&str>,
        set: fn(&mut SettingsDocument, String),
    },
    /// One octet of the composite `hue.ip` address.
    HueOctet(usize),
}

impl Slot {
    pub fn kind(&self) -> WireKind {
        match self {
            Slot::Checked { .. } => WireKind::Checked,
            Slot::Value { .. } | Slot::HueOctet(_) => WireKind::Value,
        }
    }
}

/// What the encoder sends for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emit {
    /// The document value, when present.
    Field,
    /// A fixed value, whatever the document says. These were captured from a
    /// working form submission and the device rejects or misbehaves without
    /// them; their exact meaning is unconfirmed.
    Pinned(&'static str),
    /// Decoded only. Used for mirror slots of keys emitted elsewhere.
    Never,
}

#[derive(Clone, Copy)]
pub struct WireField {
    pub key: &'static str,
    pub slot: Slot,
    pub emit: Emit,
}

impl WireField {
    pub fn kind(&self) -> WireKind {
        self.slot.kind()
    }
}

impl std::fmt::Debug for WireField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WireField")
            .field("key", &self.key)
            .field("kind", &self.kind())
            .field("emit", &self.emit)
            .finish()
    }
}

macro_rules! checked {
    ($($path:ident).+) => {
        Slot::Checked {
            get: {
                fn get(doc: &SettingsDocument) -> Option<bool> {
                    doc.$($path).+
                }
                get
            },
            set: {
                fn set(doc: &mut SettingsDocument, value: bool) {
                    doc.$($path).+ = Some(value);
                }
                set
            },
        }
    };
}

macro_rules! value {
    ($($path:ident).+) => {
        Slot::Value {
            get: {
                fn get(doc: &SettingsDocument) -> Option<&str> {
                    doc.$($path).+.as_deref()
                }
                get
            },
            set: {
                fn set(doc: &mut SettingsDocument, value: String) {
                    doc.$($path).+ = Some(value);
                }
                set
            },
        }
    };
}

macro_rules! wire {
    ($key:literal, $slot:expr, pinned $value:literal) => {
        WireField { key: $key, slot: $slot, emit: Emit::Pinned($value) }
    };
    ($key:literal, $slot:expr, mirror) => {
        WireField { key: $key, slot: $slot, emit: Emit::Never }
    };
    ($key:literal, $slot:expr) => {
        WireField { key: $key, slot: $slot, emit: Emit::Field }
    };
}

pub static WIRE_TABLE: &[WireField] = &[
    // UDP
    wire!("UP", value!(udp.udp_port)),
    wire!("U2", value!(udp.secondary_port)),
    wire!("GS", value!(udp.send_group)),
    wire!("GR", value!(udp.receive_group)),
    wire!("G1", checked!(udp.send_group1), pinned "on"),
    wire!("R1", checked!(udp.receive_group1), pinned "on"),
    wire!("G2", checked!(udp.send_group2)),
    wire!("G3", checked!(udp.send_group3)),
    wire!("G4", checked!(udp.send_group4)),
    wire!("G5", checked!(udp.send_group5)),
    wire!("G6", checked!(udp.send_group6)),
    wire!("G7", checked!(udp.send_group7)),
    wire!("G8", checked!(udp.send_group8)),
    wire!("R2", checked!(udp.receive_group2)),
    wire!("R3", checked!(udp.receive_group3)),
    wire!("R4", checked!(udp.receive_group4)),
    wire!("R5", checked!(udp.receive_group5)),
    wire!("R6", checked!(udp.receive_group6)),
    wire!("R7", checked!(udp.receive_group7)),
    wire!("R8", checked!(udp.receive_group8)),
    wire!("G1", checked!(additional.g1), mirror),
    wire!("R1", checked!(additional.r1), mirror),
    // Sync
    wire!("RB", checked!(sync.receive_brightness)),
    wire!("RC", checked!(sync.receive_color)),
    wire!("RX", checked!(sync.receive_effects)),
    wire!("SO", checked!(sync.receive_segment_options)),
    wire!("SG", checked!(sync.notify_direct)),
    wire!("SD", checked!(sync.notify_button)),
    wire!("SB", checked!(sync.notify_alexa)),
    wire!("SH", checked!(sync.notify_hue)),
    wire!("SM", checked!(sync.notify_macro)),
    wire!("UR", value!(sync.udp_retransmit)),
    // Instance
    wire!("NL", checked!(instance.enable_list)),
    wire!("NB", checked!(instance.discoverable)),
    // Realtime
    wire!("RD", checked!(realtime.receive_udp)),
    wire!("MO", checked!(realtime.use_main_segment)),
    wire!("DI", value!(additional.di)),
    wire!("EP", value!(additional.ep)),
    wire!("EM", checked!(realtime.e131_skip_out_of_sequence)),
    wire!("EU", value!(realtime.start_universe)),
    wire!("ES", checked!(realtime.e131_multicast)),
    wire!("DA", value!(realtime.dmx_start_address)),
    wire!("XX", value!(realtime.dmx_segment_spacing)),
    wire!("PY", value!(realtime.e131_port_priority), pinned "0"),
    wire!("DM", value!(realtime.dmx_mode)),
    wire!("ET", value!(realtime.dmx_timeout)),
    wire!("FB", checked!(realtime.force_brightness)),
    wire!("RG", checked!(realtime.disable_gamma_correction)),
    wire!("WO", value!(realtime.led_offset)),
    // Alexa
    wire!("AI", value!(additional.ai), pinned ""),
    wire!("AP", value!(additional.ap), pinned "0"),
    // MQTT
    wire!("MQ", checked!(mqtt.enabled)),
    wire!("MS", value!(mqtt.broker)),
    wire!("MQPORT", value!(mqtt.port)),
    wire!("MQUSER", value!(mqtt.username)),
    wire!("MQPASS", value!(mqtt.password)),
    wire!("MQCID", value!(mqtt.client_id)),
    wire!("MD", value!(mqtt.device_topic)),
    wire!("MG", value!(mqtt.group_topic)),
    wire!("BM", checked!(mqtt.button_publish)),
    // Hue
    wire!("HL", value!(hue.poll_hue_light), pinned "2"),
    wire!("HI", value!(hue.poll_interval)),
    wire!("HP", checked!(hue.poll_enabled)),
    wire!("HO", checked!(hue.on_off)),
    wire!("HB", checked!(hue.brightness)),
    wire!("HC", checked!(hue.color)),
    wire!("H0", Slot::HueOctet(0)),
    wire!("H1", Slot::HueOctet(1)),
    wire!("H2", Slot::HueOctet(2)),
    wire!("H3", Slot::HueOctet(3)),
    // Serial
    wire!("BD", value!(additional.bd), pinned "10000"),
];

/// Entries the encoder writes, in emission order.
pub fn emitted() -> impl Iterator<Item = &'static WireField> {
    WIRE_TABLE.iter().filter(|field| field.emit != Emit::Never)
}

/// Looks up the emitted entry for a key.
pub fn lookup(key: &str) -> Option<&'static WireField> {
    emitted().find(|field| field.key == key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn keys_are_short_uppercase_codes() {
        for field in WIRE_TABLE {
            assert!(!field.key.is_empty() && field.key.len() <= 6, "{}", field.key);
            assert!(
                field
                    .key
                    .chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()),
                "{}",
                field.key
            );
        }
    }

    #[test]
    fn each_key_is_emitted_once() {
        let mut seen = HashSet::new();
        for field in emitted() {
            assert!(seen.insert(field.key), "{} emitted twice", field.key);
        }
        assert_eq!(seen.len(), 69);
    }

    #[test]
    fn mirrors_shadow_an_emitted_key_of_the_same_kind() {
        for mirror in WIRE_TABLE.iter().filter(|f| f.emit == Emit::Never) {
            let primary = lookup(mirror.key).expect("mirror without primary");
            assert_eq!(primary.kind(), mirror.kind());
        }
    }

    #[test]
    fn pinned_values() {
        let pinned: Vec<(&str, &str)> = emitted()
            .filter_map(|f| match f.emit {
                Emit::Pinned(v) => Some((f.key, v)),
                _ => None,
            })
            .collect();
        assert_eq!(
            pinned,
            vec![
                ("G1", "on"),
                ("R1", "on"),
                ("PY", "0"),
                ("AI", ""),
                ("AP", "0"),
                ("HL", "2"),
                ("BD", "10000"),
            ]
        );
    }

    #[test]
    fn slots_write_where_they_read() {
        let mut doc = SettingsDocument::default();
        for field in WIRE_TABLE {
            match field.slot {
                Slot::Checked { get, set } => {
                    set(&mut doc, true);
                    assert_eq!(get(&doc), Some(true), "{}", field.key);
                }
                Slot::Value { get, set } => {
                    set(&mut doc, field.key.to_lowercase());
                    assert_eq!(get(&doc), Some(field.key.to_lowercase().as_str()));
                }
                Slot::HueOctet(_) => {}
            }
        }
    }
}
