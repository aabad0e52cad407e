//! Pipeline state cell shared between the event loop and the session worker.
//!
//! Exactly one [`PipelineState`] exists per process.  Both threads go through
//! the same mutex, so a transition made by the worker is visible to the event
//! loop before it processes the next hotkey event — no torn reads, no stale
//! `Idle` observed while a session is live.

use std::sync::{Arc, Mutex};

// ---------------------------------------------------------------------------
// PipelineState
// ---------------------------------------------------------------------------

/// Phases of the capture → transcribe → synthesize → play pipeline.
///
/// ```text
/// Idle ──press──▶ Recording ──EOF──▶ Transcribing ──text──▶ Synthesizing
///                                        │ empty/error          │ error
///                                        ▼                      ▼
///                                      Idle ◀──done── Playing ◀─┘ stream
/// ```
///
/// A new capture may begin only from `Idle`; presses in every other state
/// are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Waiting for the push-to-talk key.
    Idle,
    /// The recorder process is live and the reader is accumulating samples.
    Recording,
    /// The recorder has closed its stream; the transcriber is running.
    Transcribing,
    /// Waiting on the synthesis service for the response headers.
    Synthesizing,
    /// The decode-and-play chain is draining the synthesis stream.
    Playing,
}

impl PipelineState {
    /// Short label for log lines.
    pub fn label(&self) -> &'static str {
        match self {
            PipelineState::Idle => "idle",
            PipelineState::Recording => "recording",
            PipelineState::Transcribing => "transcribing",
            PipelineState::Synthesizing => "synthesizing",
            PipelineState::Playing => "playing",
        }
    }
}

impl Default for PipelineState {
    fn default() -> Self {
        PipelineState::Idle
    }
}

// ---------------------------------------------------------------------------
// SharedState
// ---------------------------------------------------------------------------

/// Thread-safe handle to the single state cell.  Cheap to clone; lock only
/// for short critical sections and never across an `.await`.
pub type SharedState = Arc<Mutex<PipelineState>>;

/// Construct a fresh state cell starting in `Idle`.
pub fn new_shared_state() -> SharedState {
    Arc::new(Mutex::new(PipelineState::Idle))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
