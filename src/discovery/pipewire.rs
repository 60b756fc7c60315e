//! PipeWire device enumeration via `pw-cli list-objects`
//!
//! pw-cli prints a line-oriented object dump: each node starts with a
//! line like `id 42, type PipeWire:Interface:Node/3` followed by
//! `key = "value"` attribute lines until the next object begins. We
//! accept a node as a candidate input device iff its media class is
//! `Audio/Source`, it has a node name, and the name is not a
//! `.monitor` loopback tap (those mirror an output, they don't capture
//! a physical input).

use super::{Device, DeviceBackend};
use crate::error::DiscoveryError;

/// Primary discovery backend
pub struct PipewireBackend;

impl DeviceBackend for PipewireBackend {
    fn name(&self) -> &'static str {
        "pw-cli"
    }

    fn enumerate(&self) -> Result<Vec<Device>, DiscoveryError> {
        let output = super::run_tool("pw-cli", &["list-objects"])?;
        Ok(parse_object_dump(&output))
    }
}

/// Attributes collected for one node block while scanning the dump.
/// Only the four recognized keys are kept; conversion to [`Device`]
/// happens once the block is known complete.
#[derive(Debug, Default)]
struct NodeBlock {
    id: Option<String>,
    node_name: Option<String>,
    description: Option<String>,
    media_class: Option<String>,
    nick: Option<String>,
}

impl NodeBlock {
    fn start(id: Option<&str>) -> Self {
        Self {
            id: id.map(str::to_string),
            ..Self::default()
        }
    }

    /// Convert the finished block into a device if it qualifies:
    /// an Audio/Source node with a name that is not a monitor tap.
    fn into_device(self) -> Option<Device> {
        if self.media_class.as_deref() != Some("Audio/Source") {
            return None;
        }
        let node_name = self.node_name?;
        if node_name.ends_with(".monitor") {
            return None;
        }

        let display_name = self
            .description
            .or(self.nick)
            .unwrap_or_else(|| node_name.clone());

        Some(Device {
            id: self.id.unwrap_or_else(|| "unknown".to_string()),
            node_name,
            display_name,
        })
    }
}

/// True if this line opens a new node object block
fn is_node_header(line: &str) -> bool {
    line.starts_with("id ") && line.contains("type PipeWire:Interface:Node")
}

/// Extract the numeric object id from a block header line
fn header_id(line: &str) -> Option<&str> {
    line.split_whitespace()
        .nth(1)
        .map(|id| id.trim_end_matches(','))
}

/// Extract an attribute value: the text after the first `=`, with
/// surrounding whitespace and quotes removed
fn attr_value(line: &str) -> Option<String> {
    let (_, value) = line.split_once('=')?;
    Some(value.trim().trim_matches('"').to_string())
}

/// Parse the pw-cli object dump into qualifying input devices.
///
/// Streaming, one block in progress at a time; the final block is
/// flushed after the input ends, so a dump that does not terminate
/// with another `id` line still yields its last device.
pub fn parse_object_dump(output: &str) -> Vec<Device> {
    let mut devices = Vec::new();
    let mut current: Option<NodeBlock> = None;

    for raw_line in output.lines() {
        let line = raw_line.trim();

        if is_node_header(line) {
            if let Some(block) = current.take() {
                devices.extend(block.into_device());
            }
            current = Some(NodeBlock::start(header_id(line)));
        } else if line.contains('=') {
            let Some(block) = current.as_mut() else {
                continue;
            };
            if line.contains("node.name = ") {
                block.node_name = attr_value(line);
            } else if line.contains("node.description = ") {
                block.description = attr_value(line);
            } else if line.contains("media.class = ") {
                block.media_class = attr_value(line);
            } else if line.contains("node.nick = ") {
                block.nick = attr_value(line);
            }
        }
    }

    // Flush the block still in progress when the dump ends.
    if let Some(block) = current {
        devices.extend(block.into_device());
    }

    devices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_source() {
        let dump = r#"
	id 42, type PipeWire:Interface:Node/3
 		node.name = "alsa_input.pci-0000_00_1f.3.analog-stereo"
 		node.description = "Built-in Audio Analog Stereo"
 		media.class = "Audio/Source"
"#;
        let devices = parse_object_dump(dump);
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].id, "42");
        assert_eq!(
            devices[0].node_name,
            "alsa_input.pci-0000_00_1f.3.analog-stereo"
        );
        assert_eq!(devices[0].display_name, "Built-in Audio Analog Stereo");
    }

    #[test]
    fn test_monitor_sources_excluded() {
        let dump = r#"
	id 10, type PipeWire:Interface:Node/3
 		node.name = "alsa_output.pci.analog-stereo.monitor"
 		media.class = "Audio/Source"
	id 11, type PipeWire:Interface:Node/3
 		node.name = "alsa_input.usb-mic"
 		media.class = "Audio/Source"
"#;
        let devices = parse_object_dump(dump);
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].node_name, "alsa_input.usb-mic");
    }

    #[test]
    fn test_non_source_classes_excluded() {
        let dump = r#"
	id 20, type PipeWire:Interface:Node/3
 		node.name = "alsa_output.pci.analog-stereo"
 		media.class = "Audio/Sink"
	id 21, type PipeWire:Interface:Node/3
 		node.name = "my-app"
 		media.class = "Stream/Output/Audio"
"#;
        assert!(parse_object_dump(dump).is_empty());
    }

    #[test]
    fn test_last_block_flushed_at_end_of_input() {
        // No trailing "id" line after the final device block.
        let dump = concat!(
            "\tid 7, type PipeWire:Interface:Node/3\n",
            " \t\tnode.name = \"alsa_input.final-device\"\n",
            " \t\tmedia.class = \"Audio/Source\"",
        );
        let devices = parse_object_dump(dump);
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].node_name, "alsa_input.final-device");
    }

    #[test]
    fn test_display_name_fallback_order() {
        // description wins over nick
        let with_description = r#"
	id 1, type PipeWire:Interface:Node/3
 		node.name = "mic-a"
 		node.nick = "Nick A"
 		node.description = "Description A"
 		media.class = "Audio/Source"
"#;
        assert_eq!(
            parse_object_dump(with_description)[0].display_name,
            "Description A"
        );

        // nick wins over node name
        let with_nick = r#"
	id 2, type PipeWire:Interface:Node/3
 		node.name = "mic-b"
 		node.nick = "Nick B"
 		media.class = "Audio/Source"
"#;
        assert_eq!(parse_object_dump(with_nick)[0].display_name, "Nick B");

        // node name is the last resort
        let bare = r#"
	id 3, type PipeWire:Interface:Node/3
 		node.name = "mic-c"
 		media.class = "Audio/Source"
"#;
        assert_eq!(parse_object_dump(bare)[0].display_name, "mic-c");
    }

    #[test]
    fn test_block_without_node_name_rejected() {
        let dump = r#"
	id 4, type PipeWire:Interface:Node/3
 		node.description = "Nameless"
 		media.class = "Audio/Source"
"#;
        assert!(parse_object_dump(dump).is_empty());
    }

    #[test]
    fn test_attributes_before_any_block_ignored() {
        let dump = r#"
 		node.name = "stray"
 		media.class = "Audio/Source"
	id 5, type PipeWire:Interface:Node/3
 		node.name = "real-mic"
 		media.class = "Audio/Source"
"#;
        let devices = parse_object_dump(dump);
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].node_name, "real-mic");
    }

    #[test]
    fn test_empty_dump() {
        assert!(parse_object_dump("").is_empty());
    }
}
