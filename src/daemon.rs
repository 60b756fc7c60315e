//! Daemon module - signal-driven recording loop
//!
//! Owns the session state machine and the recorder subprocess, driven
//! by Unix signals: SIGUSR1 starts recording, SIGUSR2 stops and
//! transcribes, SIGINT/SIGTERM shut down. Each handler is awaited to
//! completion inside the select loop before the next signal is
//! processed; signals arriving in the meantime are coalesced by the
//! signal streams, so a handler can never re-enter itself and a
//! coalesced stop simply finds the session idle.

use crate::audio::{self, analysis};
use crate::audio::recorder::{ActiveRecording, Recorder};
use crate::config::{self, Settings};
use crate::error::{AudioError, Result, VoxpipeError};
use crate::output;
use crate::state::SessionState;
use crate::transcribe::{self, Transcriber};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tokio::signal::unix::{signal, SignalKind};

/// Send a desktop notification cue
async fn send_notification(title: &str, body: &str) {
    let _ = Command::new("notify-send")
        .args(["--app-name=Voxpipe", "--expire-time=2000", title, body])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;
}

/// Write state to file for external control (`voxpipe record toggle`)
fn write_state_file(path: &Path, state: &str) {
    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            tracing::warn!("Failed to create state file directory: {}", e);
            return;
        }
    }

    if let Err(e) = std::fs::write(path, state) {
        tracing::warn!("Failed to write state file: {}", e);
    } else {
        tracing::trace!("State file updated: {}", state);
    }
}

/// Remove state file on shutdown
fn cleanup_state_file(path: &Path) {
    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            tracing::warn!("Failed to remove state file: {}", e);
        }
    }
}

/// Write PID file for external control via signals
fn write_pid_file() -> Option<PathBuf> {
    let pid_path = config::runtime_dir().join("pid");

    if let Some(parent) = pid_path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            tracing::warn!("Failed to create PID file directory: {}", e);
            return None;
        }
    }

    let pid = std::process::id();
    if let Err(e) = std::fs::write(&pid_path, pid.to_string()) {
        tracing::warn!("Failed to write PID file: {}", e);
        return None;
    }

    tracing::debug!("PID file written: {:?} (pid={})", pid_path, pid);
    Some(pid_path)
}

/// Remove PID file on shutdown
fn cleanup_pid_file(path: &Path) {
    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            tracing::warn!("Failed to remove PID file: {}", e);
        }
    }
}

/// A capture must exist and be non-empty before transcription is
/// attempted.
fn check_capture(path: &Path) -> std::result::Result<u64, AudioError> {
    if !path.exists() {
        return Err(AudioError::FileNotCreated(path.to_path_buf()));
    }
    let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    if size == 0 {
        return Err(AudioError::EmptyRecording(path.to_path_buf()));
    }
    Ok(size)
}

/// Main daemon that owns the recording session
pub struct Daemon {
    settings: Settings,
    transcriber: Arc<dyn Transcriber>,
    state: SessionState,
    active: Option<ActiveRecording>,
    capture_path: PathBuf,
    state_file_path: PathBuf,
    pid_file_path: Option<PathBuf>,
}

impl Daemon {
    /// Create a new daemon with the given settings.
    ///
    /// The transcription engine is initialized up front, like the
    /// device probe later: a daemon that cannot transcribe should not
    /// start.
    pub fn new(settings: Settings) -> Result<Self> {
        let transcriber: Arc<dyn Transcriber> =
            Arc::from(transcribe::create_transcriber(&settings.transcribe, &settings.audio)?);
        Ok(Self::with_transcriber(settings, transcriber))
    }

    /// Create a daemon around an already-constructed engine
    pub fn with_transcriber(settings: Settings, transcriber: Arc<dyn Transcriber>) -> Self {
        Self {
            settings,
            transcriber,
            state: SessionState::Idle,
            active: None,
            capture_path: config::capture_path(),
            state_file_path: config::runtime_dir().join("state"),
            pid_file_path: None,
        }
    }

    /// Update the state file
    fn update_state(&self, state_name: &str) {
        write_state_file(&self.state_file_path, state_name);
    }

    /// Emit a desktop notification cue if enabled
    async fn cue(&self, title: &str, body: &str) {
        if self.settings.notify {
            send_notification(title, body).await;
        }
    }

    /// Handle a start trigger: launch the recorder if idle.
    ///
    /// A start while already recording is a logged no-op; there is
    /// never a second recorder.
    async fn start_recording(&mut self) {
        if !self.state.is_idle() {
            tracing::debug!("Start trigger ignored, already recording");
            return;
        }

        let recorder = Recorder::new(&self.settings.device, self.settings.audio.clone());
        match recorder.start(&self.capture_path) {
            Ok(active) => {
                tracing::info!("Recording started");
                self.active = Some(active);
                self.state = SessionState::Recording {
                    started_at: std::time::Instant::now(),
                };
                self.update_state("recording");
                self.cue("Recording Started", "Send SIGUSR2 to stop").await;
            }
            Err(e) => {
                tracing::error!("Failed to start recording: {}", e);
            }
        }
    }

    /// Handle a stop trigger: terminate the recorder, run the
    /// post-stop checks, and hand the capture to the transcription
    /// engine. A stop while idle is a logged no-op.
    ///
    /// The session returns to Idle on every path, including decode and
    /// transcription failures; the recorder terminate+wait has already
    /// happened by then.
    async fn stop_and_transcribe(&mut self) {
        let Some(recording) = self.active.take() else {
            tracing::warn!("Stop trigger ignored, not recording");
            return;
        };

        let duration = recording.elapsed();
        tracing::info!("Recording stopped ({:.1}s)", duration.as_secs_f32());
        self.update_state("transcribing");
        self.cue("Recording Stopped", "Transcribing...").await;

        let stop_result = recording.stop().await;
        // Whatever happens from here on, the subprocess is gone and the
        // session is idle again.
        self.state = SessionState::Idle;

        match stop_result {
            Ok(path) => self.process_capture(&path).await,
            Err(e) => tracing::error!("Recorder stop failed: {}", e),
        }

        self.update_state("idle");
    }

    /// Post-stop processing: check the capture, transcribe, output.
    async fn process_capture(&self, path: &Path) {
        let file_size = match check_capture(path) {
            Ok(size) => size,
            Err(e @ AudioError::EmptyRecording(_)) => {
                tracing::warn!("{}", e);
                return;
            }
            Err(e) => {
                tracing::error!("{}", e);
                return;
            }
        };
        tracing::info!("Audio file size: {} bytes", file_size);

        // Hand off per engine: file-reading engines get the capture
        // path, the others get decoded samples.
        let engine = self.transcriber.clone();
        let text_result = if engine.reads_file() {
            let capture = path.to_path_buf();
            tokio::task::spawn_blocking(move || engine.transcribe_file(&capture)).await
        } else {
            let samples = match audio::load_raw_f32(path) {
                Ok(samples) => samples,
                Err(e) => {
                    tracing::error!("Failed to load audio samples: {}", e);
                    return;
                }
            };
            tracing::info!("Loaded {} audio samples", samples.len());
            tracing::debug!("Capture analysis: {}", analysis::analyze(&samples));
            tokio::task::spawn_blocking(move || engine.transcribe(&samples)).await
        };

        let text = match text_result {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                tracing::error!("Transcription failed: {}", e);
                return;
            }
            Err(e) => {
                tracing::error!("Transcription task failed: {}", e);
                return;
            }
        };

        tracing::info!("Transcription result: {:?}", text);

        if self.settings.print_text {
            println!("{}", text);
        }

        if !self.settings.keep_audio {
            if let Err(e) = std::fs::remove_file(path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!("Failed to remove {:?}: {}", path, e);
                }
            }
        }

        let chain = output::create_output_chain();
        if let Err(e) = output::copy_with_fallback(&chain, &text).await {
            tracing::error!("Failed to copy to clipboard: {}", e);
        }
    }

    /// Run the daemon main loop
    pub async fn run(&mut self) -> Result<()> {
        tracing::info!("Starting voxpipe daemon");
        tracing::info!("Using audio device: {}", self.settings.device);

        if self.settings.audio.format != "f32" {
            tracing::warn!(
                "Capture format is '{}'; sample decoding assumes f32",
                self.settings.audio.format
            );
        }

        // Validate the device before accepting any trigger; a daemon
        // that cannot record must not start.
        let recorder = Recorder::new(&self.settings.device, self.settings.audio.clone());
        if !recorder.validate().await {
            return Err(VoxpipeError::Audio(AudioError::DeviceNotAccessible(
                self.settings.device.clone(),
            )));
        }
        tracing::info!("Device validation successful");

        self.pid_file_path = write_pid_file();

        let mut sigusr1 = signal(SignalKind::user_defined1())
            .map_err(|e| VoxpipeError::Config(format!("Failed to set up SIGUSR1 handler: {}", e)))?;
        let mut sigusr2 = signal(SignalKind::user_defined2())
            .map_err(|e| VoxpipeError::Config(format!("Failed to set up SIGUSR2 handler: {}", e)))?;
        let mut sigterm = signal(SignalKind::terminate())
            .map_err(|e| VoxpipeError::Config(format!("Failed to set up SIGTERM handler: {}", e)))?;

        let pid = std::process::id();
        tracing::info!("Daemon PID: {}", pid);
        tracing::info!(
            "Ready. Send SIGUSR1 to start, SIGUSR2 to stop (kill -USR1 {pid}), or use 'voxpipe record toggle'."
        );
        tracing::info!("Press Ctrl+C to exit.");

        self.update_state("idle");

        loop {
            tokio::select! {
                // Start recording (external trigger)
                _ = sigusr1.recv() => {
                    tracing::debug!("Received SIGUSR1 (start recording)");
                    self.start_recording().await;
                }

                // Stop recording and transcribe
                _ = sigusr2.recv() => {
                    tracing::debug!("Received SIGUSR2 (stop recording)");
                    self.stop_and_transcribe().await;
                }

                // Graceful shutdown (SIGINT from Ctrl+C)
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Received SIGINT, shutting down...");
                    break;
                }

                // Graceful shutdown (SIGTERM from systemctl stop)
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM, shutting down...");
                    break;
                }
            }
        }

        // No transition may leave a recorder running after shutdown.
        if let Some(recording) = self.active.take() {
            tracing::info!("Stopping ongoing recording...");
            recording.discard().await;
        }
        self.state = SessionState::Idle;

        cleanup_state_file(&self.state_file_path);
        if let Some(ref path) = self.pid_file_path {
            cleanup_pid_file(path);
        }

        tracing::info!("Daemon stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AudioParams, TranscribeSettings};
    use crate::error::TranscribeError;

    struct StubEngine;

    impl Transcriber for StubEngine {
        fn transcribe(&self, _samples: &[f32]) -> std::result::Result<String, TranscribeError> {
            Ok("stub".to_string())
        }

        fn name(&self) -> &'static str {
            "stub"
        }
    }

    fn test_daemon() -> Daemon {
        let settings = Settings {
            device: "test-device".to_string(),
            audio: AudioParams::default(),
            transcribe: TranscribeSettings::default(),
            keep_audio: false,
            print_text: false,
            notify: false,
        };
        Daemon::with_transcriber(settings, Arc::new(StubEngine))
    }

    #[tokio::test]
    async fn test_stop_while_idle_is_noop() {
        let mut daemon = test_daemon();
        daemon.stop_and_transcribe().await;
        assert!(daemon.state.is_idle());
        assert!(daemon.active.is_none());
    }

    #[tokio::test]
    async fn test_start_while_recording_never_launches_second_recorder() {
        let mut daemon = test_daemon();
        // A recording is nominally in progress; a coalesced or repeated
        // start trigger must bail out before spawning anything.
        daemon.state = SessionState::Recording {
            started_at: std::time::Instant::now(),
        };
        daemon.start_recording().await;
        assert!(daemon.active.is_none());
        assert!(daemon.state.is_recording());
    }
}
