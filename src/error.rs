//! Error types for voxpipe
//!
//! Uses thiserror for ergonomic error definitions with clear messages
//! that guide users toward fixing common issues.

use thiserror::Error;

/// Top-level error type for the voxpipe application
#[derive(Error, Debug)]
pub enum VoxpipeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Device discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("Audio capture error: {0}")]
    Audio(#[from] AudioError),

    #[error("Transcription error: {0}")]
    Transcribe(#[from] TranscribeError),

    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to audio device discovery
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("'{0}' not found in PATH")]
    ToolNotFound(&'static str),

    #[error("'{tool}' exited with an error: {detail}")]
    ToolFailed { tool: &'static str, detail: String },

    #[error("Failed to run '{tool}': {source}")]
    Spawn {
        tool: &'static str,
        source: std::io::Error,
    },
}

/// Errors related to the recorder subprocess and captured audio
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("pw-record not found in PATH. Install pipewire-utils via your package manager.")]
    RecorderNotFound,

    #[error("Failed to start recorder: {0}")]
    SpawnFailed(String),

    #[error("Recorder did not exit within {0}s of termination")]
    TerminationTimeout(u64),

    #[error("Failed to await recorder exit: {0}")]
    WaitFailed(String),

    #[error("Audio file {0:?} was not created. Device may not be accessible.")]
    FileNotCreated(std::path::PathBuf),

    #[error("Audio file {0:?} is empty. Device may not be working.")]
    EmptyRecording(std::path::PathBuf),

    #[error("Audio device '{0}' is not accessible or working. Run 'voxpipe devices test' to find a working device.")]
    DeviceNotAccessible(String),
}

/// Errors related to speech-to-text transcription
#[derive(Error, Debug)]
pub enum TranscribeError {
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Engine initialization failed: {0}")]
    InitFailed(String),

    #[error("Transcription failed: {0}")]
    InferenceFailed(String),

    #[error("Audio format error: {0}")]
    AudioFormat(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Remote server error: {0}")]
    RemoteError(String),
}

/// Errors related to clipboard hand-off
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Clipboard copy failed: {0}")]
    CopyFailed(String),

    #[error("No clipboard tool available. Install wl-clipboard (Wayland) or xclip/xsel (X11).")]
    NoToolAvailable,
}

/// Result type alias using VoxpipeError
pub type Result<T> = std::result::Result<T, VoxpipeError>;
