//! Speech synthesis backends.
//!
//! [`Synthesizer`] turns a transcript into a *lazy* stream of encoded audio
//! chunks ([`AudioStream`]).  The stream is handed straight to the playback
//! chain so audio starts playing while the tail of the response is still in
//! flight — the body is never buffered wholesale.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::Stream;
use thiserror::Error;

pub mod elevenlabs;

pub use elevenlabs::ElevenLabsSynthesizer;

// ---------------------------------------------------------------------------
// AudioStream
// ---------------------------------------------------------------------------

/// A finite, non-restartable sequence of encoded audio byte chunks.
///
/// Consumed exactly once by the playback chain.  Mid-stream failures surface
/// as `Err` items rather than aborting the connection silently.
pub type AudioStream = Pin<Box<dyn Stream<Item = Result<Bytes, SynthesisError>> + Send>>;

/// Build an [`AudioStream`] from in-memory chunks — used by mocks and the
/// playback tests.
#[cfg(test)]
pub fn stream_from_chunks(chunks: Vec<Bytes>) -> AudioStream {
    Box::pin(futures_util::stream::iter(chunks.into_iter().map(Ok)))
}

// ---------------------------------------------------------------------------
// SynthesisError
// ---------------------------------------------------------------------------

/// All errors a synthesis backend can produce.  Every variant is recoverable:
/// the session is abandoned and the pipeline returns to idle.
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// HTTP transport failure before any response arrived.
    #[error("synthesis request failed: {0}")]
    Request(String),

    /// The service answered with a non-success status.
    #[error("synthesis request rejected with status {0}")]
    Status(u16),

    /// The response body stream broke mid-transfer.
    #[error("synthesis stream error: {0}")]
    Stream(String),
}

impl From<reqwest::Error> for SynthesisError {
    fn from(e: reqwest::Error) -> Self {
        SynthesisError::Request(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Synthesizer trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe interface for text-to-speech backends.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Request synthesis of `text`, returning the chunked audio stream once
    /// response headers confirm success.
    async fn synthesize(&self, text: &str) -> Result<AudioStream, SynthesisError>;
}

// ---------------------------------------------------------------------------
// MockSynthesizer  (test-only)
// ---------------------------------------------------------------------------

/// Test double serving canned chunks (or a canned error) and recording what
/// it was asked to say.
#[cfg(test)]
pub struct MockSynthesizer {
    chunks: Vec<Bytes>,
    fail_with_status: Option<u16>,
    calls: std::sync::atomic::AtomicUsize,
    last_text: std::sync::Mutex<Option<String>>,
}

#[cfg(test)]
impl MockSynthesizer {
    pub fn ok(chunks: Vec<Bytes>) -> Self {
        Self {
            chunks,
            fail_with_status: None,
            calls: std::sync::atomic::AtomicUsize::new(0),
            last_text: std::sync::Mutex::new(None),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            chunks: Vec::new(),
            fail_with_status: Some(status),
            calls: std::sync::atomic::AtomicUsize::new(0),
            last_text: std::sync::Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub fn last_text(&self) -> Option<String> {
        self.last_text.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl Synthesizer for MockSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<AudioStream, SynthesisError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        *self.last_text.lock().unwrap() = Some(text.to_string());

        match self.fail_with_status {
            Some(status) => Err(SynthesisError::Status(status)),
            None => Ok(stream_from_chunks(self.chunks.clone())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
