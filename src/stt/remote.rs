//! Remote transcription via an OpenAI-compatible HTTP endpoint.
//!
//! The raw float samples are packed back into a 16-bit mono WAV container and
//! uploaded as a multipart form to `/v1/audio/transcriptions`.  The response
//! is JSON with a single `text` field.

use std::io::Cursor;

use async_trait::async_trait;
use serde::Deserialize;

use crate::audio::format::I16_SCALE;

use super::{TranscribeError, Transcriber};

/// Model identifier sent with every request.
const REMOTE_MODEL: &str = "whisper-1";

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

// ---------------------------------------------------------------------------
// RemoteTranscriber
// ---------------------------------------------------------------------------

/// Uploads audio to a hosted transcription API instead of running a model
/// locally.  Functionally interchangeable with
/// [`LocalTranscriber`](super::LocalTranscriber) behind the
/// [`Transcriber`] trait.
pub struct RemoteTranscriber {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    language: String,
}

impl RemoteTranscriber {
    pub fn new(api_key: String, language: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: "https://api.openai.com".into(),
            api_key,
            language: language.to_string(),
        }
    }
}

#[async_trait]
impl Transcriber for RemoteTranscriber {
    async fn transcribe(
        &self,
        samples: &[f32],
        sample_rate: u32,
    ) -> Result<String, TranscribeError> {
        let wav = encode_wav(samples, sample_rate)?;
        log::debug!("stt: uploading {} bytes of WAV", wav.len());

        let part = reqwest::multipart::Part::bytes(wav)
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|e| TranscribeError::Encode(e.to_string()))?;

        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", REMOTE_MODEL)
            .text("language", self.language.clone());

        let response = self
            .client
            .post(format!("{}/v1/audio/transcriptions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TranscribeError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| TranscribeError::Request(format!("malformed response: {e}")))?;

        Ok(parsed.text)
    }
}

// ---------------------------------------------------------------------------
// WAV encoding
// ---------------------------------------------------------------------------

/// Pack normalised samples into an in-memory 16-bit mono WAV file.
fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, TranscribeError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| TranscribeError::Encode(e.to_string()))?;
        for &sample in samples {
            let quantised =
                (sample * I16_SCALE).clamp(i16::MIN as f32, i16::MAX as f32) as i16;
            writer
                .write_sample(quantised)
                .map_err(|e| TranscribeError::Encode(e.to_string()))?;
        }
        writer
            .finalize()
            .map_err(|e| TranscribeError::Encode(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
