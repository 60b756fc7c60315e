//! Integration tests for the persisted configuration store.

use std::path::PathBuf;
use voxpipe::config::StoredConfig;

fn temp_path(dir: &tempfile::TempDir) -> PathBuf {
    dir.path().join("config.toml")
}

#[test]
fn save_then_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir);

    StoredConfig::save_device(&path, "alsa_input.pci-0000_00_1f.3.analog-stereo").unwrap();

    let loaded = StoredConfig::load(&path);
    assert_eq!(
        loaded.device.as_deref(),
        Some("alsa_input.pci-0000_00_1f.3.analog-stereo")
    );
}

#[test]
fn saving_twice_leaves_only_latest_device() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir);

    StoredConfig::save_device(&path, "hw:0,0").unwrap();
    StoredConfig::save_device(&path, "hw:1,0").unwrap();

    let loaded = StoredConfig::load(&path);
    assert_eq!(loaded.device.as_deref(), Some("hw:1,0"));

    // The file holds a single device entry, not an accumulation.
    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents.matches("device").count(), 1);
}

#[test]
fn save_creates_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("deeper").join("config.toml");

    StoredConfig::save_device(&path, "hw:0,0").unwrap();
    assert!(path.exists());
}

#[test]
fn save_preserves_foreign_sections() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir);
    std::fs::write(
        &path,
        "[audio]\nsample_rate = 22050\nchannels = 2\n\n[ui]\ntheme = \"dark\"\n",
    )
    .unwrap();

    StoredConfig::save_device(&path, "hw:2,0").unwrap();

    let loaded = StoredConfig::load(&path);
    assert_eq!(loaded.device.as_deref(), Some("hw:2,0"));
    assert_eq!(loaded.sample_rate, Some(22050));
    assert_eq!(loaded.channels, Some(2));

    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains("theme"), "unrelated section preserved");
}

#[test]
fn validate_config_sample_rate_matrix() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir);

    std::fs::write(&path, "[audio]\nsample_rate = 16000\n").unwrap();
    assert!(StoredConfig::validate(&path));

    std::fs::write(&path, "[audio]\nsample_rate = 12345\n").unwrap();
    assert!(!StoredConfig::validate(&path));
}

#[test]
fn absent_file_is_valid_with_no_device() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir);

    assert!(StoredConfig::validate(&path));
    assert!(StoredConfig::load(&path).device.is_none());
}

#[test]
fn unparseable_file_loads_as_unconfigured() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir);
    std::fs::write(&path, "this is { not toml").unwrap();

    assert!(!StoredConfig::validate(&path));
    assert!(StoredConfig::load(&path).device.is_none());
}
