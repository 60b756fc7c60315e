//! Audio input device discovery
//!
//! Two alternative backends behind one strategy trait: PipeWire
//! (`pw-cli list-objects`, primary) and ALSA (`arecord -l`, fallback).
//! [`discover`] drives the fallback chain and never fails; on total
//! failure it returns an empty list and callers report "no devices".

pub mod alsa;
pub mod pipewire;

use crate::error::DiscoveryError;

/// An addressable audio input endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    /// Tool-assigned identifier, used only for de-duplication while parsing
    pub id: String,
    /// Opaque handle passed to the recorder tool
    pub node_name: String,
    /// Human-readable name
    pub display_name: String,
}

/// A device enumeration backend
pub trait DeviceBackend {
    /// Human-readable backend name for logging
    fn name(&self) -> &'static str;

    /// Enumerate candidate input devices
    fn enumerate(&self) -> Result<Vec<Device>, DiscoveryError>;
}

/// Discover audio input devices, falling back from PipeWire to ALSA.
///
/// The fallback runs when the primary tool is absent, errors, or
/// returns zero qualifying devices; its result (possibly empty) is
/// final.
pub fn discover() -> Vec<Device> {
    let primary = pipewire::PipewireBackend;
    match primary.enumerate() {
        Ok(devices) if !devices.is_empty() => {
            tracing::debug!("{} found {} device(s)", primary.name(), devices.len());
            return devices;
        }
        Ok(_) => {
            tracing::info!("No devices found with {}, trying fallback", primary.name());
        }
        Err(e) => {
            tracing::warn!("{} discovery failed: {}, trying fallback", primary.name(), e);
        }
    }

    let fallback = alsa::AlsaBackend;
    match fallback.enumerate() {
        Ok(devices) => {
            tracing::debug!("{} found {} device(s)", fallback.name(), devices.len());
            devices
        }
        Err(e) => {
            tracing::warn!("{} discovery failed: {}", fallback.name(), e);
            Vec::new()
        }
    }
}

/// Run an enumeration tool and capture its stdout.
fn run_tool(tool: &'static str, args: &[&str]) -> Result<String, DiscoveryError> {
    let output = std::process::Command::new(tool)
        .args(args)
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DiscoveryError::ToolNotFound(tool)
            } else {
                DiscoveryError::Spawn { tool, source: e }
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(DiscoveryError::ToolFailed {
            tool,
            detail: stderr.trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
