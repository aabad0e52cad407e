//! Speech-to-text backends.
//!
//! [`Transcriber`] is the seam between the pipeline and whichever engine turns
//! audio into text.  Two interchangeable implementations exist, selected once
//! at construction time:
//!
//! - [`LocalTranscriber`] — in-process whisper inference (`whisper-rs`).
//! - [`RemoteTranscriber`] — re-encodes the samples into a WAV container and
//!   POSTs them to an OpenAI-compatible transcription endpoint.
//!
//! Any transcription failure is recoverable: the pipeline logs it and returns
//! to idle; nothing here is allowed to take the process down.

use async_trait::async_trait;
use thiserror::Error;

pub mod local;
pub mod remote;

pub use local::LocalTranscriber;
pub use remote::RemoteTranscriber;

// ---------------------------------------------------------------------------
// TranscribeError
// ---------------------------------------------------------------------------

/// All errors that can arise from a transcription backend.
#[derive(Debug, Clone, Error)]
pub enum TranscribeError {
    /// The whisper model file was not found at the given path.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// whisper-rs failed to initialise its context or per-call state.
    #[error("whisper context initialisation failed: {0}")]
    ContextInit(String),

    /// The inference pass failed.
    #[error("transcription inference failed: {0}")]
    Inference(String),

    /// The audio payload could not be encoded for the remote backend.
    #[error("failed to encode audio payload: {0}")]
    Encode(String),

    /// HTTP transport error talking to the remote backend.
    #[error("transcription request failed: {0}")]
    Request(String),

    /// The remote backend rejected the request.
    #[error("transcription API error {status}: {body}")]
    Api { status: u16, body: String },
}

impl From<reqwest::Error> for TranscribeError {
    fn from(e: reqwest::Error) -> Self {
        TranscribeError::Request(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Transcriber trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe interface for transcription backends.
///
/// # Contract
///
/// `samples` are normalised mono `f32` PCM in `[-1, 1]` at `sample_rate` Hz
/// (the capture rate, 16 kHz in practice).  Returns the raw transcript —
/// the caller is responsible for trimming.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, samples: &[f32], sample_rate: u32)
        -> Result<String, TranscribeError>;
}

// ---------------------------------------------------------------------------
// MockTranscriber  (test-only)
// ---------------------------------------------------------------------------

/// Test double returning a pre-configured response and counting calls.
#[cfg(test)]
pub struct MockTranscriber {
    response: Result<String, TranscribeError>,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockTranscriber {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            response: Ok(text.into()),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub fn err(error: TranscribeError) -> Self {
        Self {
            response: Err(error),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
#[async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(
        &self,
        _samples: &[f32],
        _sample_rate: u32,
    ) -> Result<String, TranscribeError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.response.clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
