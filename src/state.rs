//! Session state machine for the voxpipe daemon
//!
//! Models the recording workflow: Idle → Recording → Idle.
//! The state is an explicit object owned by the daemon and passed
//! through the signal handlers, so transitions can be unit-tested
//! without real OS signals. Transcription is a transient phase of the
//! stop handler rather than a resting state; it is only reflected in
//! the state file written for external integrations.

use std::time::Instant;

/// Session state
#[derive(Debug, Clone)]
pub enum SessionState {
    /// Waiting for a start trigger
    Idle,

    /// Recorder subprocess is live
    Recording {
        /// When recording started
        started_at: Instant,
    },
}

impl SessionState {
    /// Create a new idle state
    pub fn new() -> Self {
        SessionState::Idle
    }

    /// Check if in idle state
    pub fn is_idle(&self) -> bool {
        matches!(self, SessionState::Idle)
    }

    /// Check if in recording state
    pub fn is_recording(&self) -> bool {
        matches!(self, SessionState::Recording { .. })
    }

    /// Get recording duration if currently recording
    pub fn recording_duration(&self) -> Option<std::time::Duration> {
        match self {
            SessionState::Recording { started_at } => Some(started_at.elapsed()),
            _ => None,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Idle => write!(f, "Idle"),
            SessionState::Recording { started_at } => {
                write!(f, "Recording ({:.1}s)", started_at.elapsed().as_secs_f32())
            }
        }
    }
}
