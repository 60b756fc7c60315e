//! ALSA device enumeration via `arecord -l`
//!
//! Fallback for systems where pw-cli is unavailable. Each physical
//! capture device appears as a line like:
//!
//! ```text
//! card 0: sofhdadsp [sof-hda-dsp], device 0: HDA Analog (*) []
//! ```
//!
//! We synthesize the ALSA `hw:<card>,<device>` handle from the card
//! and device numbers. Lines that don't match are skipped silently.

use super::{Device, DeviceBackend};
use crate::error::DiscoveryError;
use regex::Regex;
use std::sync::OnceLock;

/// Fallback discovery backend
pub struct AlsaBackend;

impl DeviceBackend for AlsaBackend {
    fn name(&self) -> &'static str {
        "arecord"
    }

    fn enumerate(&self) -> Result<Vec<Device>, DiscoveryError> {
        let output = super::run_tool("arecord", &["-l"])?;
        Ok(parse_card_list(&output))
    }
}

fn card_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"card (\d+)").expect("static regex"))
}

fn device_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"device (\d+)").expect("static regex"))
}

/// Parse `arecord -l` output into devices
pub fn parse_card_list(output: &str) -> Vec<Device> {
    let mut devices = Vec::new();

    for line in output.lines() {
        if !(line.contains("card") && line.contains("device")) {
            continue;
        }

        // "card 0: sofhdadsp [sof-hda-dsp], device 0: HDA Analog ..."
        let parts: Vec<&str> = line.split(':').collect();
        if parts.len() < 3 {
            continue;
        }
        let card_info = parts[0].trim();
        let card_name = parts[1]
            .trim()
            .split('[')
            .next()
            .unwrap_or("")
            .trim()
            .to_string();

        let card_num = card_regex()
            .captures(card_info)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str());
        let device_num = device_regex()
            .captures(line)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str());

        let (Some(card), Some(device)) = (card_num, device_num) else {
            continue;
        };

        devices.push(Device {
            id: format!("{}_{}", card, device),
            node_name: format!("hw:{},{}", card, device),
            display_name: format!("{} (Card {}, Device {})", card_name, card, device),
        });
    }

    devices
}
