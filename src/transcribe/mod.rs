//! Speech-to-text transcription module
//!
//! Engines are external collaborators behind one strategy trait:
//! - whisper-cli subprocess (consumes the capture file path)
//! - remote OpenAI-compatible Whisper API (consumes decoded samples)
//!
//! The daemon picks the hand-off form per engine via
//! [`Transcriber::reads_file`], so neither path ever re-records.

pub mod cli;
pub mod remote;

use crate::config::{AudioParams, Engine, TranscribeSettings};
use crate::error::TranscribeError;
use std::path::Path;

/// Trait for speech-to-text implementations
pub trait Transcriber: Send + Sync {
    /// True if the engine consumes the capture file path directly
    /// instead of decoded samples.
    fn reads_file(&self) -> bool {
        false
    }

    /// Transcribe decoded audio samples (f32, mono) to text
    fn transcribe(&self, samples: &[f32]) -> Result<String, TranscribeError>;

    /// Transcribe a raw f32 capture file to text.
    ///
    /// Engines that don't read files decode and defer to
    /// [`Transcriber::transcribe`].
    fn transcribe_file(&self, path: &Path) -> Result<String, TranscribeError> {
        let samples = crate::audio::load_raw_f32(path)
            .map_err(|e| TranscribeError::AudioFormat(format!("Failed to read {:?}: {}", path, e)))?;
        self.transcribe(&samples)
    }

    /// Human-readable engine name for logging
    fn name(&self) -> &'static str;
}

/// Factory function to create a transcriber for the configured engine
pub fn create_transcriber(
    config: &TranscribeSettings,
    params: &AudioParams,
) -> Result<Box<dyn Transcriber>, TranscribeError> {
    match config.engine {
        Engine::WhisperCli => {
            tracing::info!("Using whisper-cli transcription engine");
            Ok(Box::new(cli::CliTranscriber::new(config, params)?))
        }
        Engine::Remote => {
            tracing::info!("Using remote transcription engine");
            Ok(Box::new(remote::RemoteTranscriber::new(config, params)?))
        }
    }
}
