//! Decoder for the `/settings/s.js?p=4` payload.
//!
//! The settings page fills its form from a script made of statements like
//! `d.Sf.UP.value=21324;` and `d.Sf.RB.checked=1;`. The payload is scanned
//! once into a table of assignments and every wire key is then looked up in
//! it. Nothing here fails: unknown or malformed assignments are skipped and
//! the matching fields stay `None`.

use std::collections::HashMap;

use tracing::debug;

use crate::sync::document::SettingsDocument;
use crate::sync::wire::{Slot, WIRE_TABLE};

/// Object path the settings script assigns form fields through.
pub const FORM_PREFIX: &str = "d.Sf";

/// Decodes a settings script using the default `d.Sf` form prefix.
pub fn decode(payload: &str) -> SettingsDocument {
    SettingsDecoder::new(FORM_PREFIX).decode(payload)
}

/// Table-driven decoder for the settings script.
#[derive(Debug, Clone)]
pub struct SettingsDecoder {
    prefix: String,
}

impl Default for SettingsDecoder {
    fn default() -> Self {
        Self::new(FORM_PREFIX)
    }
}

impl SettingsDecoder {
    pub fn new(prefix: impl Into<String>) -> Self {
        let mut prefix = prefix.into();
        if !prefix.ends_with('.') {
            prefix.push('.');
        }
        Self { prefix }
    }

    pub fn decode(&self, payload: &str) -> SettingsDocument {
        let assignments = Assignments::scan(payload, &self.prefix);
        let mut doc = SettingsDocument::default();
        let mut octets: [Option<&str>; 4] = [None; 4];

        for field in WIRE_TABLE {
            match field.slot {
                Slot::Checked { set, .. } => {
                    if let Some(checked) = assignments.checked(field.key) {
                        set(&mut doc, checked);
                    }
                }
                Slot::Value { set, .. } => {
                    if let Some(value) = assignments.value(field.key) {
                        set(&mut doc, value.to_string());
                    }
                }
                Slot::HueOctet(index) => {
                    if let Some(octet) = octets.get_mut(index) {
                        *octet = assignments.value(field.key);
                    }
                }
            }
        }

        doc.hue.ip = join_octets_with_null_segments(&octets);
        debug!(
            "Decoded {} assignments from settings script",
            assignments.len()
        );
        doc
    }
}

/// Joins the four `H0`..`H3` octets into a dotted address.
///
/// A missing octet is rendered as the literal segment `null` (for example
/// `192.null.1.7`), which is what the settings service has always stored.
/// Only when no octet is present at all does the address itself become `None`.
pub fn join_octets_with_null_segments(octets: &[Option<&str>; 4]) -> Option<String> {
    if octets.iter().all(Option::is_none) {
        return None;
    }
    let segments: Vec<&str> = octets.iter().map(|octet| octet.unwrap_or("null")).collect();
    Some(segments.join("."))
}

/// First successful `.value=` and `.checked=` assignment per key.
#[derive(Debug, Default)]
struct Assignments<'a> {
    values: HashMap<&'a str, &'a str>,
    checks: HashMap<&'a str, bool>,
}

impl<'a> Assignments<'a> {
    fn scan(payload: &'a str, prefix: &str) -> Self {
        let mut assignments = Assignments::default();
        let mut offset = 0;
        while let Some(found) = payload[offset..].find(prefix) {
            let start = offset + found + prefix.len();
            assignments.read_statement(&payload[start..]);
            offset += found + prefix.chars().next().map_or(1, char::len_utf8);
        }
        assignments
    }

    fn len(&self) -> usize {
        self.values.len() + self.checks.len()
    }

    fn value(&self, key: &str) -> Option<&'a str> {
        self.values.get(key).copied()
    }

    fn checked(&self, key: &str) -> Option<bool> {
        self.checks.get(key).copied()
    }

    /// Reads `KEY.attr=RHS` at the start of `rest`, recording it if well formed.
    fn read_statement(&mut self, rest: &'a str) {
        let (key, rest) = split_ident(rest);
        if key.is_empty() {
            return;
        }
        let Some(rest) = rest.strip_prefix('.') else {
            return;
        };
        let (attribute, rest) = split_ident(rest);
        let Some(rhs) = rest.strip_prefix('=') else {
            return;
        };

        match attribute {
            "value" => {
                if let Some(value) = read_value(rhs) {
                    self.values.entry(key).or_insert(value);
                }
            }
            "checked" => {
                if let Some(digit) = rhs.chars().next().filter(char::is_ascii_digit) {
                    self.checks.entry(key).or_insert(digit == '1');
                }
            }
            _ => {}
        }
    }
}

fn split_ident(input: &str) -> (&str, &str) {
    let end = input
        .find(|c: char| !c.is_ascii_alphanumeric() && c != '_')
        .unwrap_or(input.len());
    input.split_at(end)
}

/// A double-quoted string (quotes stripped) or a run of ASCII digits.
fn read_value(rhs: &str) -> Option<&str> {
    if let Some(quoted) = rhs.strip_prefix('"') {
        let end = quoted.find('"')?;
        return Some(&quoted[..end]);
    }
    let end = rhs.find(|c: char| !c.is_ascii_digit()).unwrap_or(rhs.len());
    if end == 0 { None } else { Some(&rhs[..end]) }
}
