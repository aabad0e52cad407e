//! ElevenLabs streaming text-to-speech backend.
//!
//! POSTs the transcript to the `/v1/text-to-speech/{voice_id}/stream`
//! endpoint and returns the chunked MP3 body as an [`AudioStream`].  A
//! non-success status is a recoverable per-session failure carrying the
//! status code — never fatal.

use async_trait::async_trait;
use futures_util::StreamExt;

use super::{AudioStream, SynthesisError, Synthesizer};

const API_BASE: &str = "https://api.elevenlabs.io/v1/text-to-speech";

// ---------------------------------------------------------------------------
// ElevenLabsSynthesizer
// ---------------------------------------------------------------------------

/// Streaming TTS client for one configured voice.
pub struct ElevenLabsSynthesizer {
    client: reqwest::Client,
    voice_id: String,
    api_key: String,
}

impl ElevenLabsSynthesizer {
    /// `voice_id` is the opaque voice identifier, not the display name.
    pub fn new(voice_id: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            voice_id,
            api_key,
        }
    }

    fn endpoint(&self) -> String {
        format!("{API_BASE}/{}/stream", self.voice_id)
    }
}

/// JSON request body for the synthesis call.
fn request_body(text: &str) -> serde_json::Value {
    serde_json::json!({ "text": text })
}

#[async_trait]
impl Synthesizer for ElevenLabsSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<AudioStream, SynthesisError> {
        let response = self
            .client
            .post(self.endpoint())
            .header("accept", "audio/mpeg")
            .header("xi-api-key", &self.api_key)
            .json(&request_body(text))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SynthesisError::Status(status.as_u16()));
        }

        // Hand the body over lazily: playback starts on the first chunk,
        // while the service is still generating the rest.
        Ok(Box::pin(response.bytes_stream().map(|chunk| {
            chunk.map_err(|e| SynthesisError::Stream(e.to_string()))
        })))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
