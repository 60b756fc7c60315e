//! CLI-based speech-to-text transcription
//!
//! Uses whisper-cli (from whisper.cpp) as an external process. The
//! engine consumes the capture file itself: the raw f32 capture is
//! converted to a temporary WAV and handed to the binary, which writes
//! its result as JSON.
//!
//! The whisper-cli binary must be installed separately or built from
//! whisper.cpp.

use super::Transcriber;
use crate::config::{AudioParams, TranscribeSettings};
use crate::error::TranscribeError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// CLI-based transcriber using a whisper-cli subprocess
pub struct CliTranscriber {
    /// Path to whisper-cli binary
    cli_path: PathBuf,
    /// Path to model file
    model_path: PathBuf,
    /// Number of threads to use
    threads: usize,
    /// Sample rate of captures handed to us
    sample_rate: u32,
}

/// JSON output structure from whisper-cli
#[derive(Debug, Deserialize)]
struct WhisperCliOutput {
    transcription: Vec<Segment>,
}

#[derive(Debug, Deserialize)]
struct Segment {
    text: String,
}

impl CliTranscriber {
    /// Create a new CLI-based transcriber
    pub fn new(
        config: &TranscribeSettings,
        params: &AudioParams,
    ) -> Result<Self, TranscribeError> {
        let cli_path = resolve_cli_path()?;
        let model_path = resolve_model_path(&config.model)?;

        tracing::info!(
            "whisper-cli engine: {:?} with model {:?}",
            cli_path,
            model_path
        );

        // threads = 0 or None means auto-detect
        let threads = match config.threads {
            Some(0) | None => num_cpus::get().min(4),
            Some(n) => n,
        };

        Ok(Self {
            cli_path,
            model_path,
            threads,
            sample_rate: params.sample_rate,
        })
    }

    /// Write samples to a temporary WAV file (16-bit PCM)
    fn write_temp_wav(&self, samples: &[f32]) -> Result<tempfile::NamedTempFile, TranscribeError> {
        let temp_file = tempfile::Builder::new()
            .prefix("voxpipe_")
            .suffix(".wav")
            .tempfile()
            .map_err(|e| {
                TranscribeError::AudioFormat(format!("Failed to create temp file: {}", e))
            })?;

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut writer = hound::WavWriter::create(temp_file.path(), spec).map_err(|e| {
            TranscribeError::AudioFormat(format!("Failed to create WAV writer: {}", e))
        })?;

        for &sample in samples {
            let clamped = sample.clamp(-1.0, 1.0);
            let scaled = (clamped * 32767.0) as i16;
            writer.write_sample(scaled).map_err(|e| {
                TranscribeError::AudioFormat(format!("Failed to write sample: {}", e))
            })?;
        }

        writer
            .finalize()
            .map_err(|e| TranscribeError::AudioFormat(format!("Failed to finalize WAV: {}", e)))?;

        Ok(temp_file)
    }

    /// Run whisper-cli against a WAV file and collect the text
    fn run_whisper_cli(&self, wav_path: &Path) -> Result<String, TranscribeError> {
        let start = std::time::Instant::now();

        // Temp base for JSON output (whisper-cli appends .json)
        let temp_json = tempfile::Builder::new()
            .prefix("voxpipe_out_")
            .suffix("")
            .tempfile()
            .map_err(|e| {
                TranscribeError::InferenceFailed(format!("Failed to create temp file: {}", e))
            })?;

        let output_base = temp_json
            .path()
            .to_str()
            .ok_or_else(|| TranscribeError::InferenceFailed("Invalid temp path".to_string()))?;

        let mut cmd = Command::new(&self.cli_path);
        cmd.arg("--model")
            .arg(&self.model_path)
            .arg("--file")
            .arg(wav_path)
            .arg("--output-json")
            .arg("--output-file")
            .arg(output_base)
            .arg("--threads")
            .arg(self.threads.to_string())
            .arg("--no-prints");

        tracing::debug!("Running whisper-cli: {:?}", cmd);

        let output = cmd
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                TranscribeError::InferenceFailed(format!("Failed to run whisper-cli: {}", e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TranscribeError::InferenceFailed(format!(
                "whisper-cli failed: {}",
                stderr
            )));
        }

        let json_path = format!("{}.json", output_base);
        let json_content = std::fs::read_to_string(&json_path).map_err(|e| {
            TranscribeError::InferenceFailed(format!("Failed to read output: {}", e))
        })?;
        let _ = std::fs::remove_file(&json_path);

        let result: WhisperCliOutput = serde_json::from_str(&json_content).map_err(|e| {
            TranscribeError::InferenceFailed(format!("Failed to parse JSON output: {}", e))
        })?;

        let text = join_segments(&result);

        tracing::info!(
            "Transcription completed in {:.2}s ({} chars)",
            start.elapsed().as_secs_f32(),
            text.chars().count()
        );

        Ok(text)
    }
}

/// Combine whisper-cli segments into one line of text
fn join_segments(output: &WhisperCliOutput) -> String {
    output
        .transcription
        .iter()
        .map(|s| s.text.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

impl Transcriber for CliTranscriber {
    fn reads_file(&self) -> bool {
        true
    }

    fn transcribe(&self, samples: &[f32]) -> Result<String, TranscribeError> {
        if samples.is_empty() {
            return Err(TranscribeError::AudioFormat(
                "Empty audio buffer".to_string(),
            ));
        }
        let temp_wav = self.write_temp_wav(samples)?;
        self.run_whisper_cli(temp_wav.path())
    }

    fn transcribe_file(&self, path: &Path) -> Result<String, TranscribeError> {
        let samples = crate::audio::load_raw_f32(path).map_err(|e| {
            TranscribeError::AudioFormat(format!("Failed to read {:?}: {}", path, e))
        })?;
        tracing::debug!(
            "Transcribing {:.2}s of audio ({} samples) via whisper-cli",
            samples.len() as f32 / self.sample_rate as f32,
            samples.len()
        );
        self.transcribe(&samples)
    }

    fn name(&self) -> &'static str {
        "whisper-cli"
    }
}

/// Resolve whisper-cli path from PATH and common install locations
fn resolve_cli_path() -> Result<PathBuf, TranscribeError> {
    let candidates = [
        which::which("whisper-cli").ok(),
        which::which("whisper").ok(),
        Some(PathBuf::from("/usr/local/bin/whisper-cli")),
        Some(PathBuf::from("/usr/bin/whisper-cli")),
        directories::BaseDirs::new().map(|d| d.home_dir().join(".local/bin/whisper-cli")),
    ];

    for candidate in candidates.into_iter().flatten() {
        if candidate.exists() {
            return Ok(candidate);
        }
    }

    Err(TranscribeError::InitFailed(
        "whisper-cli not found. Install from https://github.com/ggerganov/whisper.cpp".to_string(),
    ))
}

/// Resolve model name to file path
fn resolve_model_path(model: &str) -> Result<PathBuf, TranscribeError> {
    // Explicit path to a model file
    let path = PathBuf::from(model);
    if path.is_absolute() && path.exists() {
        return Ok(path);
    }

    let model_filename = match model {
        "tiny" => "ggml-tiny.bin",
        "tiny.en" => "ggml-tiny.en.bin",
        "base" => "ggml-base.bin",
        "base.en" => "ggml-base.en.bin",
        "small" => "ggml-small.bin",
        "small.en" => "ggml-small.en.bin",
        "medium" => "ggml-medium.bin",
        "medium.en" => "ggml-medium.en.bin",
        "large" | "large-v1" => "ggml-large-v1.bin",
        "large-v2" => "ggml-large-v2.bin",
        "large-v3" => "ggml-large-v3.bin",
        other if other.ends_with(".bin") => other,
        other => {
            return Err(TranscribeError::ModelNotFound(format!(
                "Unknown model: '{}'. Valid models: tiny, base, small, medium, large-v3",
                other
            )));
        }
    };

    let candidates = [
        crate::config::models_dir().join(model_filename),
        PathBuf::from(model_filename),
        PathBuf::from("models").join(model_filename),
    ];

    for candidate in &candidates {
        if candidate.exists() {
            return Ok(candidate.clone());
        }
    }

    Err(TranscribeError::ModelNotFound(format!(
        "Model '{}' not found. Looked in:\n  - {}\n  - {}\n  - {}",
        model,
        candidates[0].display(),
        candidates[1].display(),
        candidates[2].display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_model_path_unknown() {
        assert!(resolve_model_path("nonexistent-model").is_err());
    }

    #[test]
    fn test_join_segments() {
        let output: WhisperCliOutput = serde_json::from_str(
            r#"{"transcription": [{"text": " Hello"}, {"text": " world. "}, {"text": "  "}]}"#,
        )
        .unwrap();
        assert_eq!(join_segments(&output), "Hello world.");
    }

    #[test]
    fn test_join_segments_empty() {
        let output: WhisperCliOutput =
            serde_json::from_str(r#"{"transcription": []}"#).unwrap();
        assert_eq!(join_segments(&output), "");
    }
}
