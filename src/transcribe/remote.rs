//! Remote speech-to-text transcription via OpenAI-compatible API
//!
//! Sends audio to a remote whisper.cpp server or OpenAI-compatible
//! endpoint, enabling use of GPU servers for faster inference. The
//! engine consumes decoded samples: they are encoded to WAV in memory
//! and posted as a multipart upload.

use super::Transcriber;
use crate::config::{AudioParams, TranscribeSettings};
use crate::error::TranscribeError;
use serde::Deserialize;
use std::io::Cursor;
use std::time::Duration;

/// Remote transcriber using an OpenAI-compatible Whisper API
#[derive(Debug)]
pub struct RemoteTranscriber {
    /// Base endpoint URL (e.g., "http://192.168.1.100:8080")
    endpoint: String,
    /// Model name to send to the server
    model: String,
    /// Optional API key for authentication
    api_key: Option<String>,
    /// Request timeout
    timeout: Duration,
    /// Sample rate of captures handed to us
    sample_rate: u32,
}

/// Response body from the transcriptions endpoint
#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

impl RemoteTranscriber {
    /// Create a new remote transcriber from config
    pub fn new(
        config: &TranscribeSettings,
        params: &AudioParams,
    ) -> Result<Self, TranscribeError> {
        let endpoint = config
            .remote_endpoint
            .as_ref()
            .ok_or_else(|| {
                TranscribeError::ConfigError(
                    "remote endpoint is required for the remote engine".into(),
                )
            })?
            .trim_end_matches('/')
            .to_string();

        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(TranscribeError::ConfigError(format!(
                "remote endpoint must start with http:// or https://, got: {}",
                endpoint
            )));
        }

        if endpoint.starts_with("http://")
            && !endpoint.contains("localhost")
            && !endpoint.contains("127.0.0.1")
            && !endpoint.contains("[::1]")
        {
            tracing::warn!(
                "Remote endpoint uses HTTP without TLS. Audio data will be transmitted unencrypted!"
            );
        }

        let api_key = std::env::var("VOXPIPE_API_KEY").ok();
        let timeout = Duration::from_secs(config.remote_timeout_secs);

        tracing::info!(
            "Remote transcriber: endpoint={}, model={}, timeout={}s",
            endpoint,
            config.model,
            timeout.as_secs()
        );

        Ok(Self {
            endpoint,
            model: config.model.clone(),
            api_key,
            timeout,
            sample_rate: params.sample_rate,
        })
    }

    /// Encode f32 samples to WAV (16-bit PCM) in memory
    fn encode_wav(&self, samples: &[f32]) -> Result<Vec<u8>, TranscribeError> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut buffer = Cursor::new(Vec::new());
        let mut writer = hound::WavWriter::new(&mut buffer, spec).map_err(|e| {
            TranscribeError::AudioFormat(format!("Failed to create WAV writer: {}", e))
        })?;

        for &sample in samples {
            let clamped = sample.clamp(-1.0, 1.0);
            let scaled = (clamped * i16::MAX as f32) as i16;
            writer.write_sample(scaled).map_err(|e| {
                TranscribeError::AudioFormat(format!("Failed to write sample: {}", e))
            })?;
        }

        writer
            .finalize()
            .map_err(|e| TranscribeError::AudioFormat(format!("Failed to finalize WAV: {}", e)))?;

        Ok(buffer.into_inner())
    }

    /// Build the multipart form body for the API request
    fn build_multipart_body(&self, wav_data: &[u8]) -> (String, Vec<u8>) {
        let boundary = format!(
            "----VoxpipeBoundary{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        );

        let mut body = Vec::new();

        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(b"Content-Disposition: form-data; name=\"model\"\r\n\r\n");
        body.extend_from_slice(self.model.as_bytes());
        body.extend_from_slice(b"\r\n");

        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(
            b"Content-Disposition: form-data; name=\"file\"; filename=\"audio.wav\"\r\n",
        );
        body.extend_from_slice(b"Content-Type: audio/wav\r\n\r\n");
        body.extend_from_slice(wav_data);
        body.extend_from_slice(b"\r\n");

        body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());

        (boundary, body)
    }
}

impl Transcriber for RemoteTranscriber {
    fn transcribe(&self, samples: &[f32]) -> Result<String, TranscribeError> {
        if samples.is_empty() {
            return Err(TranscribeError::AudioFormat(
                "Empty audio buffer".to_string(),
            ));
        }

        let duration_secs = samples.len() as f32 / self.sample_rate as f32;
        tracing::debug!(
            "Sending {:.2}s of audio to remote endpoint {}",
            duration_secs,
            self.endpoint
        );

        let wav_data = self.encode_wav(samples)?;
        let (boundary, body) = self.build_multipart_body(&wav_data);

        let url = format!("{}/v1/audio/transcriptions", self.endpoint);

        let mut request = ureq::post(&url).timeout(self.timeout).set(
            "Content-Type",
            &format!("multipart/form-data; boundary={}", boundary),
        );
        if let Some(ref key) = self.api_key {
            request = request.set("Authorization", &format!("Bearer {}", key));
        }

        let start = std::time::Instant::now();
        let response = request.send_bytes(&body).map_err(|e| match e {
            ureq::Error::Status(code, resp) => {
                let detail = resp
                    .into_string()
                    .unwrap_or_else(|_| "unreadable response body".to_string());
                TranscribeError::RemoteError(format!("HTTP {}: {}", code, detail))
            }
            ureq::Error::Transport(t) => TranscribeError::NetworkError(t.to_string()),
        })?;

        let parsed: TranscriptionResponse = response.into_json().map_err(|e| {
            TranscribeError::RemoteError(format!("Failed to parse response: {}", e))
        })?;

        let text = parsed.text.trim().to_string();
        tracing::info!(
            "Remote transcription completed in {:.2}s ({} chars)",
            start.elapsed().as_secs_f32(),
            text.chars().count()
        );

        Ok(text)
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Engine;

    fn settings(endpoint: Option<&str>) -> TranscribeSettings {
        TranscribeSettings {
            engine: Engine::Remote,
            model: "whisper-1".to_string(),
            threads: None,
            remote_endpoint: endpoint.map(str::to_string),
            remote_timeout_secs: 30,
        }
    }

    #[test]
    fn test_missing_endpoint_rejected() {
        let result = RemoteTranscriber::new(&settings(None), &AudioParams::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_endpoint_scheme_rejected() {
        let result =
            RemoteTranscriber::new(&settings(Some("ftp://host")), &AudioParams::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let t = RemoteTranscriber::new(
            &settings(Some("http://localhost:8080/")),
            &AudioParams::default(),
        )
        .unwrap();
        assert_eq!(t.endpoint, "http://localhost:8080");
    }

    #[test]
    fn test_multipart_body_contains_fields() {
        let t = RemoteTranscriber::new(
            &settings(Some("http://localhost:8080")),
            &AudioParams::default(),
        )
        .unwrap();
        let (boundary, body) = t.build_multipart_body(b"RIFFdata");
        let body_str = String::from_utf8_lossy(&body);
        assert!(body_str.contains(&boundary));
        assert!(body_str.contains("name=\"model\""));
        assert!(body_str.contains("filename=\"audio.wav\""));
        assert!(body_str.contains("whisper-1"));
    }

    #[test]
    fn test_empty_samples_rejected() {
        let t = RemoteTranscriber::new(
            &settings(Some("http://localhost:8080")),
            &AudioParams::default(),
        )
        .unwrap();
        assert!(t.transcribe(&[]).is_err());
    }
}
