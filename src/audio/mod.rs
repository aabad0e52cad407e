//! Audio plumbing — format conversion, external-process command descriptors,
//! and the per-recording capture session.
//!
//! ```text
//! recorder process ──512-byte reads──▶ CaptureSession buffer (i16)
//!                                        │ samples_to_f32
//!                                        ▼
//!                                   transcriber input
//! ```

pub mod commands;
pub mod format;
pub mod session;

pub use commands::{AudioCommands, AudioServerError, CommandSpec, PLAYBACK_RATE, RECORD_RATE};
pub use session::{CaptureError, CaptureSession, StopHandle};
