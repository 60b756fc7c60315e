//! Configuration for voxpipe
//!
//! Two layers:
//! - [`StoredConfig`]: the persisted `[audio]` section of
//!   `~/.config/voxpipe/config.toml` (chosen device plus optional
//!   capture parameters). Loading is forgiving: a missing file means
//!   defaults, and an invalid file invalidates itself as a whole —
//!   callers log a warning and proceed, they never hard-fail on a bad
//!   config alone.
//! - [`Settings`]: the effective runtime configuration assembled in
//!   main from CLI flags layered over the store.

use crate::error::VoxpipeError;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Sample rates the recorder accepts
pub const VALID_SAMPLE_RATES: [u32; 5] = [8000, 16000, 22050, 44100, 48000];

/// Channel counts the recorder accepts
pub const VALID_CHANNELS: [u16; 2] = [1, 2];

/// Sample formats the recorder accepts
pub const VALID_FORMATS: [&str; 4] = ["f32", "s16", "s24", "s32"];

/// Get the default config file path
pub fn config_file() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "voxpipe")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Get the data directory path (for models)
pub fn data_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "voxpipe")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get the models directory path
pub fn models_dir() -> PathBuf {
    data_dir().join("models")
}

/// Get the runtime directory for ephemeral files (pid, state)
pub fn runtime_dir() -> PathBuf {
    std::env::var("XDG_RUNTIME_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| std::env::temp_dir())
        .join("voxpipe")
}

/// Fixed path the daemon records to
pub fn capture_path() -> PathBuf {
    std::env::temp_dir().join("voxpipe_recording.raw")
}

/// Persisted configuration: the `[audio]` section of the config file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredConfig {
    pub device: Option<String>,
    pub sample_rate: Option<u32>,
    pub channels: Option<u16>,
    pub audio_format: Option<String>,
}

impl StoredConfig {
    /// Load the stored configuration.
    ///
    /// An absent file yields defaults. Read or parse failures, and an
    /// invalid value for any known key, invalidate the whole file:
    /// logged, then treated as "nothing configured".
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!("Error reading config file {:?}: {}", path, e);
                return Self::default();
            }
        };

        let value: toml::Value = match contents.parse() {
            Ok(v) => v,
            Err(e) => {
                tracing::error!("Error parsing config file {:?}: {}", path, e);
                return Self::default();
            }
        };

        if let Err(reason) = check_audio_section(&value) {
            tracing::warn!("Config file {:?} is invalid: {}", path, reason);
            return Self::default();
        }

        extract_audio_section(&value)
    }

    /// Validate the config file without loading it.
    ///
    /// An absent file is valid. Validation failure is advisory: callers
    /// log a warning and continue with defaults.
    pub fn validate(path: &Path) -> bool {
        if !path.exists() {
            return true;
        }

        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!("Cannot read config file {:?}: {}", path, e);
                return false;
            }
        };

        let value: toml::Value = match contents.parse() {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("Config file {:?} does not parse: {}", path, e);
                return false;
            }
        };

        match check_audio_section(&value) {
            Ok(()) => {
                tracing::debug!("Configuration validation successful");
                true
            }
            Err(reason) => {
                tracing::warn!("Config file {:?} is invalid: {}", path, reason);
                false
            }
        }
    }

    /// Persist the chosen device, merging into the existing file.
    ///
    /// Unrelated keys and sections are preserved; the `[audio]` section
    /// is created if absent. The write goes to a temp file in the same
    /// directory and is renamed into place, so a concurrent reader
    /// never observes a partially written file.
    pub fn save_device(path: &Path, device: &str) -> Result<(), VoxpipeError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| VoxpipeError::Config(format!("Failed to create config dir: {}", e)))?;
        }

        let mut root = match std::fs::read_to_string(path) {
            Ok(contents) => match contents.parse::<toml::Value>() {
                Ok(toml::Value::Table(table)) => table,
                Ok(_) | Err(_) => {
                    tracing::warn!("Existing config {:?} is not valid TOML, rewriting", path);
                    toml::map::Map::new()
                }
            },
            Err(_) => toml::map::Map::new(),
        };

        let audio = root
            .entry("audio".to_string())
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
        match audio {
            toml::Value::Table(table) => {
                table.insert(
                    "device".to_string(),
                    toml::Value::String(device.to_string()),
                );
            }
            other => {
                *other = toml::Value::Table(toml::map::Map::from_iter([(
                    "device".to_string(),
                    toml::Value::String(device.to_string()),
                )]));
            }
        }

        let serialized = toml::to_string_pretty(&toml::Value::Table(root))
            .map_err(|e| VoxpipeError::Config(format!("Failed to serialize config: {}", e)))?;

        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut temp = tempfile::NamedTempFile::new_in(dir)
            .map_err(|e| VoxpipeError::Config(format!("Failed to create temp config: {}", e)))?;
        temp.write_all(serialized.as_bytes())
            .map_err(|e| VoxpipeError::Config(format!("Failed to write config: {}", e)))?;
        temp.persist(path)
            .map_err(|e| VoxpipeError::Config(format!("Failed to replace config: {}", e)))?;

        tracing::info!("Device '{}' saved to {:?}", device, path);
        Ok(())
    }
}

/// Check the `[audio]` section of a parsed config file.
/// Returns why the file is invalid, if it is.
fn check_audio_section(value: &toml::Value) -> Result<(), String> {
    let audio = value
        .get("audio")
        .ok_or_else(|| "missing [audio] section".to_string())?;
    let table = audio
        .as_table()
        .ok_or_else(|| "[audio] is not a section".to_string())?;

    if let Some(device) = table.get("device") {
        let device = device
            .as_str()
            .ok_or_else(|| "device is not a string".to_string())?;
        if device.trim().is_empty() {
            return Err("device name is empty".to_string());
        }
        if device.trim().len() < 3 {
            return Err("device name appears too short".to_string());
        }
    }

    if let Some(rate) = table.get("sample_rate") {
        let rate = rate
            .as_integer()
            .ok_or_else(|| format!("sample_rate '{}' is not an integer", rate))?;
        if !VALID_SAMPLE_RATES.iter().any(|&v| i64::from(v) == rate) {
            return Err(format!(
                "invalid sample_rate '{}', valid values: {:?}",
                rate, VALID_SAMPLE_RATES
            ));
        }
    }

    if let Some(channels) = table.get("channels") {
        let channels = channels
            .as_integer()
            .ok_or_else(|| format!("channels '{}' is not an integer", channels))?;
        if !VALID_CHANNELS.iter().any(|&v| i64::from(v) == channels) {
            return Err(format!(
                "invalid channels '{}', valid values: {:?}",
                channels, VALID_CHANNELS
            ));
        }
    }

    if let Some(format) = table.get("audio_format") {
        let format = format
            .as_str()
            .ok_or_else(|| "audio_format is not a string".to_string())?;
        if !VALID_FORMATS.contains(&format.trim()) {
            return Err(format!(
                "invalid audio_format '{}', valid values: {:?}",
                format, VALID_FORMATS
            ));
        }
    }

    Ok(())
}

/// Extract the `[audio]` section; call only after validation passed.
fn extract_audio_section(value: &toml::Value) -> StoredConfig {
    let Some(table) = value.get("audio").and_then(|a| a.as_table()) else {
        return StoredConfig::default();
    };

    StoredConfig {
        device: table
            .get("device")
            .and_then(|v| v.as_str())
            .map(str::to_string),
        sample_rate: table
            .get("sample_rate")
            .and_then(|v| v.as_integer())
            .map(|v| v as u32),
        channels: table
            .get("channels")
            .and_then(|v| v.as_integer())
            .map(|v| v as u16),
        audio_format: table
            .get("audio_format")
            .and_then(|v| v.as_str())
            .map(str::to_string),
    }
}

/// Capture parameters handed to pw-record
#[derive(Debug, Clone, PartialEq)]
pub struct AudioParams {
    pub sample_rate: u32,
    pub channels: u16,
    pub format: String,
}

impl Default for AudioParams {
    fn default() -> Self {
        Self {
            sample_rate: crate::audio::SAMPLE_RATE,
            channels: crate::audio::CHANNELS,
            format: crate::audio::SAMPLE_FORMAT.to_string(),
        }
    }
}

impl AudioParams {
    /// Defaults overridden by whatever the store carries
    pub fn from_stored(stored: &StoredConfig) -> Self {
        let mut params = Self::default();
        if let Some(rate) = stored.sample_rate {
            params.sample_rate = rate;
        }
        if let Some(channels) = stored.channels {
            params.channels = channels;
        }
        if let Some(ref format) = stored.audio_format {
            params.format = format.clone();
        }
        params
    }
}

/// Transcription engine selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    /// whisper-cli subprocess, reads the capture file
    WhisperCli,
    /// OpenAI-compatible HTTP API, takes decoded samples
    Remote,
}

/// Transcription engine configuration
#[derive(Debug, Clone)]
pub struct TranscribeSettings {
    pub engine: Engine,
    /// Model name (tiny, base, small, ...) or path to a model file
    pub model: String,
    /// Inference threads (None = auto-detect)
    pub threads: Option<usize>,
    /// Base URL for the remote engine
    pub remote_endpoint: Option<String>,
    /// Request timeout for the remote engine
    pub remote_timeout_secs: u64,
}

impl Default for TranscribeSettings {
    fn default() -> Self {
        Self {
            engine: Engine::WhisperCli,
            model: "base".to_string(),
            threads: None,
            remote_endpoint: None,
            remote_timeout_secs: 30,
        }
    }
}

/// Effective runtime configuration for the daemon
#[derive(Debug, Clone)]
pub struct Settings {
    /// Target device handle for the recorder
    pub device: String,
    pub audio: AudioParams,
    pub transcribe: TranscribeSettings,
    /// Keep the capture file after transcription
    pub keep_audio: bool,
    /// Print transcribed text to stdout
    pub print_text: bool,
    /// Emit desktop notification cues on start/stop
    pub notify: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn test_absent_file_is_valid_and_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        assert!(StoredConfig::validate(&path));
        assert_eq!(StoredConfig::load(&path), StoredConfig::default());
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        StoredConfig::save_device(&path, "alsa_input.usb-mic").unwrap();
        let loaded = StoredConfig::load(&path);
        assert_eq!(loaded.device.as_deref(), Some("alsa_input.usb-mic"));
    }

    #[test]
    fn test_second_save_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        StoredConfig::save_device(&path, "first-device").unwrap();
        StoredConfig::save_device(&path, "second-device").unwrap();
        assert_eq!(
            StoredConfig::load(&path).device.as_deref(),
            Some("second-device")
        );
    }

    #[test]
    fn test_save_preserves_unrelated_keys() {
        let (_dir, path) = temp_config(
            "[audio]\nsample_rate = 48000\n\n[other]\nkeep = \"me\"\n",
        );

        StoredConfig::save_device(&path, "new-device").unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let value: toml::Value = contents.parse().unwrap();
        assert_eq!(
            value["audio"]["sample_rate"].as_integer(),
            Some(48000),
            "existing audio keys survive"
        );
        assert_eq!(value["other"]["keep"].as_str(), Some("me"));
        assert_eq!(value["audio"]["device"].as_str(), Some("new-device"));
    }

    #[test]
    fn test_validate_sample_rates() {
        let (_dir, path) = temp_config("[audio]\nsample_rate = 16000\n");
        assert!(StoredConfig::validate(&path));

        let (_dir, path) = temp_config("[audio]\nsample_rate = 12345\n");
        assert!(!StoredConfig::validate(&path));

        let (_dir, path) = temp_config("[audio]\nsample_rate = \"fast\"\n");
        assert!(!StoredConfig::validate(&path));
    }

    #[test]
    fn test_validate_device_name() {
        let (_dir, path) = temp_config("[audio]\ndevice = \"ab\"\n");
        assert!(!StoredConfig::validate(&path), "too short");

        let (_dir, path) = temp_config("[audio]\ndevice = \"   \"\n");
        assert!(!StoredConfig::validate(&path), "whitespace only");

        let (_dir, path) = temp_config("[audio]\ndevice = \"hw:0,0\"\n");
        assert!(StoredConfig::validate(&path));
    }

    #[test]
    fn test_validate_channels_and_format() {
        let (_dir, path) = temp_config("[audio]\nchannels = 2\naudio_format = \"s16\"\n");
        assert!(StoredConfig::validate(&path));

        let (_dir, path) = temp_config("[audio]\nchannels = 3\n");
        assert!(!StoredConfig::validate(&path));

        let (_dir, path) = temp_config("[audio]\naudio_format = \"mp3\"\n");
        assert!(!StoredConfig::validate(&path));
    }

    #[test]
    fn test_missing_section_is_invalid() {
        let (_dir, path) = temp_config("[other]\nkey = 1\n");
        assert!(!StoredConfig::validate(&path));
    }

    #[test]
    fn test_invalid_file_loads_as_defaults() {
        // Invalid value for a known key invalidates the whole file.
        let (_dir, path) = temp_config("[audio]\ndevice = \"good-device\"\nsample_rate = 1\n");
        assert_eq!(StoredConfig::load(&path), StoredConfig::default());
    }

    #[test]
    fn test_load_extracts_all_fields() {
        let (_dir, path) = temp_config(
            "[audio]\ndevice = \"hw:1,0\"\nsample_rate = 44100\nchannels = 2\naudio_format = \"s24\"\n",
        );
        let stored = StoredConfig::load(&path);
        assert_eq!(stored.device.as_deref(), Some("hw:1,0"));
        assert_eq!(stored.sample_rate, Some(44100));
        assert_eq!(stored.channels, Some(2));
        assert_eq!(stored.audio_format.as_deref(), Some("s24"));

        let params = AudioParams::from_stored(&stored);
        assert_eq!(params.sample_rate, 44100);
        assert_eq!(params.channels, 2);
        assert_eq!(params.format, "s24");
    }

    #[test]
    fn test_audio_params_defaults() {
        let params = AudioParams::default();
        assert_eq!(params.sample_rate, 16000);
        assert_eq!(params.channels, 1);
        assert_eq!(params.format, "f32");
    }
}
