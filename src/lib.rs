//! Push-to-talk voice relay.
//!
//! Hold a key, speak, release — the recording is transcribed, re-voiced by a
//! streaming text-to-speech service, and played back through the system audio
//! sink.
//!
//! # Architecture
//!
//! ```text
//! HotkeyListener (OS thread) ──mpsc──▶ PipelineController (tokio task)
//!                                        │ press: spawn recorder + worker
//!                                        ▼
//!        CaptureSession ──▶ Transcriber ──▶ Synthesizer ──▶ PlaybackChain
//!        (pw-record)        (whisper /      (ElevenLabs     (ffmpeg → pw-cat)
//!                            remote API)     streaming)
//! ```
//!
//! The pipeline state machine in [`pipeline`] is the only shared-mutable part
//! of the program; everything else is either immutable configuration or owned
//! by exactly one task.

pub mod audio;
pub mod cli;
pub mod config;
pub mod hotkey;
pub mod pipeline;
pub mod playback;
pub mod stt;
pub mod tts;

pub use audio::{AudioCommands, CommandSpec};
pub use config::RelayConfig;
pub use pipeline::{PipelineController, PipelineState};
