//! Device test orchestrator
//!
//! Records a short capture from one or all discovered devices, scores
//! each capture with the signal analyzer, and ranks the results by
//! signal strength. Tests run strictly sequentially: they share the
//! one physical input path and must not overlap.

use crate::audio;
use crate::audio::analysis;
use crate::audio::recorder::Recorder;
use crate::config::AudioParams;
use crate::discovery::Device;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default capture length for a device test
pub const DEFAULT_TEST_DURATION: Duration = Duration::from_secs(3);

/// Outcome of testing a single device
#[derive(Debug, Clone)]
pub struct DeviceTestResult {
    pub device: Device,
    /// True iff the capture produced samples with RMS above the
    /// silence threshold
    pub success: bool,
    pub rms: f32,
    /// Human-readable outcome for the report
    pub details: String,
}

/// Disposable capture path for one device test
fn test_file_path(display_name: &str) -> PathBuf {
    let sanitized: String = display_name
        .chars()
        .map(|c| match c {
            ' ' | '/' => '_',
            other => other.to_ascii_lowercase(),
        })
        .collect();
    std::env::temp_dir().join(format!("voxpipe_test_{}.raw", sanitized))
}

/// Test recording from a single device.
///
/// Never fails: every problem becomes an unsuccessful result with the
/// reason in `details`. The test artifact is deleted regardless of
/// outcome.
pub async fn test_one(
    device: &Device,
    params: &AudioParams,
    duration: Duration,
) -> DeviceTestResult {
    tracing::info!(
        "Testing {} ({}) for {:.0}s",
        device.display_name,
        device.node_name,
        duration.as_secs_f32()
    );

    let file = test_file_path(&device.display_name);
    let recorder = Recorder::new(&device.node_name, params.clone());

    let (success, rms, details) = match recorder.record_for(&file, duration).await {
        Err(e) => (false, 0.0, format!("recorder error: {}", e)),
        Ok(()) => classify_capture(&file),
    };

    if let Err(e) = std::fs::remove_file(&file) {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!("Failed to remove test file {:?}: {}", file, e);
        }
    }

    DeviceTestResult {
        device: device.clone(),
        success,
        rms,
        details,
    }
}

/// Score the capture file left behind by a completed test recording
fn classify_capture(file: &Path) -> (bool, f32, String) {
    if !file.exists() {
        return (false, 0.0, "audio file not created".to_string());
    }

    let size = std::fs::metadata(file).map(|m| m.len()).unwrap_or(0);
    if size == 0 {
        return (false, 0.0, "empty audio file".to_string());
    }

    let samples = match audio::load_raw_f32(file) {
        Ok(s) => s,
        Err(e) => return (false, 0.0, format!("failed to read capture: {}", e)),
    };

    let stats = analysis::analyze(&samples);
    tracing::debug!("Audio analysis: {}", stats);

    if stats.is_empty() {
        (false, 0.0, "no audio samples".to_string())
    } else if stats.has_signal() {
        (
            true,
            stats.rms,
            format!("working device (rms {:.6})", stats.rms),
        )
    } else {
        (
            false,
            stats.rms,
            format!("mostly silence (rms {:.6})", stats.rms),
        )
    }
}

/// Test every device in turn and return the results ranked by signal
/// strength (RMS descending; ties keep discovery order).
pub async fn test_all(
    devices: &[Device],
    params: &AudioParams,
    duration: Duration,
) -> Vec<DeviceTestResult> {
    let mut results = Vec::with_capacity(devices.len());
    for device in devices {
        results.push(test_one(device, params, duration).await);
    }
    rank(&mut results);
    results
}

/// Sort results by RMS descending. The sort is stable, so equal RMS
/// values keep their discovery order.
pub fn rank(results: &mut [DeviceTestResult]) {
    results.sort_by(|a, b| b.rms.partial_cmp(&a.rms).unwrap_or(std::cmp::Ordering::Equal));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, success: bool, rms: f32) -> DeviceTestResult {
        DeviceTestResult {
            device: Device {
                id: name.to_string(),
                node_name: name.to_string(),
                display_name: name.to_string(),
            },
            success,
            rms,
            details: String::new(),
        }
    }

    #[test]
    fn test_rank_by_rms_descending() {
        let mut results = vec![
            result("quiet", false, 0.0002),
            result("loud", true, 0.02),
            result("medium", true, 0.005),
        ];
        rank(&mut results);
        let order: Vec<&str> = results.iter().map(|r| r.device.id.as_str()).collect();
        assert_eq!(order, vec!["loud", "medium", "quiet"]);
    }

    #[test]
    fn test_rank_ties_keep_discovery_order() {
        let mut results = vec![
            result("first", true, 0.01),
            result("second", true, 0.01),
            result("third", true, 0.01),
        ];
        rank(&mut results);
        let order: Vec<&str> = results.iter().map(|r| r.device.id.as_str()).collect();
        assert_eq!(order, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_classify_zero_byte_capture() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let (success, rms, details) = classify_capture(file.path());
        assert!(!success);
        assert_eq!(rms, 0.0);
        assert_eq!(details, "empty audio file");
    }

    #[test]
    fn test_classify_silent_capture() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), [0u8; 4 * 800]).unwrap();
        let (success, rms, details) = classify_capture(file.path());
        assert!(!success);
        assert_eq!(rms, 0.0);
        assert!(details.starts_with("mostly silence"));
    }

    #[test]
    fn test_classify_capture_with_signal() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut bytes = Vec::new();
        for i in 0..1600 {
            let sample = 0.05f32 * if i % 2 == 0 { 1.0 } else { -1.0 };
            bytes.extend_from_slice(&sample.to_le_bytes());
        }
        std::fs::write(file.path(), &bytes).unwrap();
        let (success, rms, details) = classify_capture(file.path());
        assert!(success);
        assert!((rms - 0.05).abs() < 1e-4);
        assert!(details.starts_with("working device"));
    }

    #[test]
    fn test_classify_missing_capture() {
        let path = std::env::temp_dir().join("voxpipe_test_does_not_exist.raw");
        let (success, _, details) = classify_capture(&path);
        assert!(!success);
        assert_eq!(details, "audio file not created");
    }

    #[test]
    fn test_file_path_is_sanitized() {
        let path = test_file_path("Built-in Audio/Analog Stereo");
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert_eq!(name, "voxpipe_test_built-in_audio_analog_stereo.raw");
    }

    #[tokio::test]
    async fn test_one_inaccessible_device_reports_failure() {
        let device = Device {
            id: "0".to_string(),
            node_name: "voxpipe-test-no-such-device".to_string(),
            display_name: "No Such Device".to_string(),
        };
        let result = test_one(&device, &AudioParams::default(), Duration::from_millis(100)).await;
        assert!(!result.success);
        assert_eq!(result.rms, 0.0);
        assert!(!result.details.is_empty());
        // The artifact is removed regardless of outcome.
        assert!(!test_file_path(&device.display_name).exists());
    }
}
