//! Recorder subprocess management
//!
//! Owns the pw-record subprocess lifecycle: spawn, graceful SIGTERM
//! (so pw-record flushes a valid partial file), and a bounded wait for
//! exit. At most one recorder is live at a time; [`ActiveRecording`]
//! enforces the matching terminate+wait on every exit path by consuming
//! itself on `stop`/`discard` and by spawning with kill-on-drop, which
//! covers early returns and panics.

use crate::config::AudioParams;
use crate::error::AudioError;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::{Child, Command};

/// Bounded wait for the recorder to exit after termination.
/// Exceeding it is fatal for the operation, not a hang.
pub const PROCESS_TERMINATION_TIMEOUT: Duration = Duration::from_secs(2);

/// Duration of the short probe used to validate a device
pub const DEVICE_TEST_DURATION: Duration = Duration::from_secs(1);

/// Launches pw-record against one configured device
#[derive(Debug, Clone)]
pub struct Recorder {
    device: String,
    params: AudioParams,
}

impl Recorder {
    pub fn new(device: impl Into<String>, params: AudioParams) -> Self {
        Self {
            device: device.into(),
            params,
        }
    }

    /// The device this recorder targets
    pub fn device(&self) -> &str {
        &self.device
    }

    /// Spawn pw-record writing to `output`.
    ///
    /// The returned handle owns the subprocess; dropping it without
    /// calling `stop`/`discard` kills the recorder rather than leaking
    /// it.
    pub fn start(&self, output: &Path) -> Result<ActiveRecording, AudioError> {
        tracing::debug!(
            "Spawning pw-record: target={}, format={}, rate={}, channels={}, output={:?}",
            self.device,
            self.params.format,
            self.params.sample_rate,
            self.params.channels,
            output
        );

        let child = Command::new("pw-record")
            .arg(format!("--target={}", self.device))
            .arg(format!("--format={}", self.params.format))
            .arg(format!("--rate={}", self.params.sample_rate))
            .arg(format!("--channels={}", self.params.channels))
            .arg(output)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    AudioError::RecorderNotFound
                } else {
                    AudioError::SpawnFailed(e.to_string())
                }
            })?;

        Ok(ActiveRecording {
            child,
            path: output.to_path_buf(),
            started_at: Instant::now(),
        })
    }

    /// Record to `output` for `duration`, then terminate and await the
    /// recorder.
    pub async fn record_for(&self, output: &Path, duration: Duration) -> Result<(), AudioError> {
        let recording = self.start(output)?;
        tokio::time::sleep(duration).await;
        recording.stop().await?;
        Ok(())
    }

    /// Check that the configured device is accessible by recording a
    /// short probe to a disposable temp path.
    ///
    /// Any error, or a missing/empty output file after termination,
    /// means "not accessible". The probe file is removed when the
    /// tempfile handle drops.
    pub async fn validate(&self) -> bool {
        let probe = match tempfile::Builder::new()
            .prefix("voxpipe_probe_")
            .suffix(".raw")
            .tempfile()
        {
            Ok(f) => f,
            Err(e) => {
                tracing::debug!("Device validation failed to create temp file: {}", e);
                return false;
            }
        };

        match self.record_for(probe.path(), DEVICE_TEST_DURATION).await {
            Ok(()) => {
                let size = std::fs::metadata(probe.path()).map(|m| m.len()).unwrap_or(0);
                if size == 0 {
                    tracing::debug!("Device validation produced no audio data");
                    return false;
                }
                tracing::debug!("Device validation captured {} bytes", size);
                true
            }
            Err(e) => {
                tracing::debug!("Device validation failed: {}", e);
                false
            }
        }
    }
}

/// A live pw-record subprocess
///
/// `stop` and `discard` consume the handle, so a second stop cannot
/// race a stop already terminating the subprocess.
pub struct ActiveRecording {
    child: Child,
    path: PathBuf,
    started_at: Instant,
}

impl ActiveRecording {
    /// Path the recorder is writing to
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Time since the recorder was spawned
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Gracefully terminate the recorder and await its exit, keeping
    /// the output file. Returns the capture path.
    pub async fn stop(mut self) -> Result<PathBuf, AudioError> {
        self.terminate().await?;
        Ok(self.path)
    }

    /// Terminate the recorder and delete whatever it wrote. Used on
    /// shutdown, where the capture is not wanted.
    pub async fn discard(mut self) {
        if let Err(e) = self.terminate().await {
            tracing::warn!("Recorder cleanup error: {}", e);
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to remove {:?}: {}", self.path, e);
            }
        }
    }

    /// Send SIGTERM (pw-record flushes its output on it) and wait for
    /// exit, bounded by [`PROCESS_TERMINATION_TIMEOUT`]. On timeout the
    /// recorder is killed outright and the operation reports failure.
    async fn terminate(&mut self) -> Result<(), AudioError> {
        let Some(pid) = self.child.id() else {
            // Recorder already exited and was reaped.
            return Ok(());
        };

        if let Err(e) = signal::kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
            tracing::debug!("SIGTERM to recorder pid {} failed: {}", pid, e);
        }

        match tokio::time::timeout(PROCESS_TERMINATION_TIMEOUT, self.child.wait()).await {
            Ok(Ok(status)) => {
                tracing::debug!("Recorder exited: {}", status);
                Ok(())
            }
            Ok(Err(e)) => Err(AudioError::WaitFailed(e.to_string())),
            Err(_) => {
                tracing::warn!(
                    "Recorder did not exit within {}s, killing",
                    PROCESS_TERMINATION_TIMEOUT.as_secs()
                );
                let _ = self.child.start_kill();
                let _ = self.child.wait().await;
                Err(AudioError::TerminationTimeout(
                    PROCESS_TERMINATION_TIMEOUT.as_secs(),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AudioParams;

    #[test]
    fn test_recorder_holds_device() {
        let recorder = Recorder::new("alsa_input.usb-mic", AudioParams::default());
        assert_eq!(recorder.device(), "alsa_input.usb-mic");
    }

    #[tokio::test]
    async fn test_validate_inaccessible_device_is_false() {
        // Either pw-record is absent (spawn fails) or it rejects the
        // bogus target and produces no audio; both must report false
        // and leave no probe file behind.
        let recorder = Recorder::new("voxpipe-test-no-such-device", AudioParams::default());
        assert!(!recorder.validate().await);
    }
}
