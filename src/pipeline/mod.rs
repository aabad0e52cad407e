//! The capture → transcribe → synthesize → play state machine.
//!
//! [`PipelineController`] is the only owner of pipeline state; the hotkey
//! listener talks to it exclusively through an mpsc channel, and the session
//! worker shares only the [`SharedState`] cell.

pub mod runner;
pub mod state;

pub use runner::PipelineController;
pub use state::{new_shared_state, PipelineState, SharedState};
