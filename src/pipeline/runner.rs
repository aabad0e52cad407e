//! Pipeline controller — the state machine driving one session at a time.
//!
//! [`PipelineController::run`] consumes hotkey events from a single
//! `tokio::sync::mpsc` channel.  Because there is exactly one consumer,
//! press and release are handled strictly in order; the mutex around
//! [`PipelineState`] exists for visibility between this loop and the session
//! worker, not for event ordering.
//!
//! # Session flow
//!
//! ```text
//! Pressed (state == Idle)
//!   └─▶ spawn recorder, state = Recording, spawn worker task
//!         worker: drain recorder to EOF        [spawn_blocking]
//!                 → Transcribing → transcribe
//!                 → Synthesizing → synthesize  (empty text short-circuits)
//!                 → Playing      → play to completion
//!                 → Idle
//! Released (while Recording)
//!   └─▶ SIGINT the recorder; the worker sees EOF and moves on
//! ```
//!
//! Every per-session failure is logged and resets the state to `Idle`; the
//! event loop itself is never interrupted.  The two fatal cases — recorder
//! or decoder/player cannot launch — end the program with a non-zero status.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::audio::{format, CaptureError, CaptureSession, CommandSpec, StopHandle};
use crate::hotkey::HotkeyEvent;
use crate::playback::Playback;
use crate::stt::Transcriber;
use crate::tts::Synthesizer;

use super::state::{PipelineState, SharedState};

// ---------------------------------------------------------------------------
// PipelineController
// ---------------------------------------------------------------------------

/// Owns the state cell, the collaborator handles, and the active session's
/// stop handle.
pub struct PipelineController {
    state: SharedState,
    record_cmd: CommandSpec,
    sample_rate: u32,
    transcriber: Arc<dyn Transcriber>,
    synthesizer: Arc<dyn Synthesizer>,
    playback: Arc<dyn Playback>,
    /// Stop handle for the recorder of the in-flight session, if any.
    /// Only this event loop touches it, so no lock is needed.
    active: Option<StopHandle>,
}

impl PipelineController {
    pub fn new(
        state: SharedState,
        record_cmd: CommandSpec,
        sample_rate: u32,
        transcriber: Arc<dyn Transcriber>,
        synthesizer: Arc<dyn Synthesizer>,
        playback: Arc<dyn Playback>,
    ) -> Self {
        Self {
            state,
            record_cmd,
            sample_rate,
            transcriber,
            synthesizer,
            playback,
            active: None,
        }
    }

    /// Run until the hotkey channel closes.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::Spawn`] when the recorder cannot be launched —
    /// the caller reports it and exits non-zero.
    pub async fn run(
        mut self,
        mut hotkey_rx: mpsc::Receiver<HotkeyEvent>,
    ) -> Result<(), CaptureError> {
        while let Some(event) = hotkey_rx.recv().await {
            match event {
                HotkeyEvent::Pressed => self.handle_pressed()?,
                HotkeyEvent::Released => self.handle_released(),
            }
        }

        log::info!("pipeline: hotkey channel closed, shutting down");
        Ok(())
    }

    /// Begin a capture session, unless one is already in flight.
    fn handle_pressed(&mut self) -> Result<(), CaptureError> {
        {
            let mut state = self.state.lock().unwrap();
            if *state != PipelineState::Idle {
                log::debug!("pipeline: press ignored while {}", state.label());
                return Ok(());
            }
            // Claim the pipeline before releasing the lock so the worker's
            // later transitions and this guard never interleave badly.
            *state = PipelineState::Recording;
        }

        let session = match CaptureSession::start(&self.record_cmd) {
            Ok(session) => session,
            Err(e) => {
                *self.state.lock().unwrap() = PipelineState::Idle;
                return Err(e);
            }
        };

        log::info!("pipeline: recording");
        self.active = Some(session.stop_handle());

        let worker = SessionWorker {
            state: Arc::clone(&self.state),
            transcriber: Arc::clone(&self.transcriber),
            synthesizer: Arc::clone(&self.synthesizer),
            playback: Arc::clone(&self.playback),
            sample_rate: self.sample_rate,
        };
        tokio::spawn(worker.run(session));

        Ok(())
    }

    /// Stop the active recorder.  A release with no live recording — either
    /// no session at all, or one that already hit EOF — is a no-op.
    fn handle_released(&mut self) {
        let recording = *self.state.lock().unwrap() == PipelineState::Recording;
        if let Some(stop) = self.active.take() {
            if recording {
                log::debug!("pipeline: release, interrupting recorder");
                stop.interrupt();
            }
        }
    }
}

// ---------------------------------------------------------------------------
// SessionWorker
// ---------------------------------------------------------------------------

/// Everything one session needs after the recorder is live.  Runs as a
/// detached task; at most one exists at a time because a session only starts
/// from `Idle`.
struct SessionWorker {
    state: SharedState,
    transcriber: Arc<dyn Transcriber>,
    synthesizer: Arc<dyn Synthesizer>,
    playback: Arc<dyn Playback>,
    sample_rate: u32,
}

impl SessionWorker {
    async fn run(self, session: CaptureSession) {
        // ── Drain the recorder to EOF (blocking reads) ───────────────────
        let samples = match tokio::task::spawn_blocking(move || session.drain()).await {
            Ok(Ok(samples)) => samples,
            Ok(Err(e)) => {
                log::error!("pipeline: reading recorder output failed: {e}");
                self.set_state(PipelineState::Idle);
                return;
            }
            Err(e) => {
                log::error!("pipeline: capture reader task failed: {e}");
                self.set_state(PipelineState::Idle);
                return;
            }
        };

        // ── Transcribe ───────────────────────────────────────────────────
        self.set_state(PipelineState::Transcribing);
        log::info!(
            "pipeline: transcribing {:.1}s of audio",
            samples.len() as f32 / self.sample_rate as f32
        );

        let audio = format::samples_to_f32(&samples);
        let text = match self.transcriber.transcribe(&audio, self.sample_rate).await {
            Ok(text) => text,
            Err(e) => {
                log::error!("pipeline: transcription failed: {e}");
                self.set_state(PipelineState::Idle);
                return;
            }
        };

        let text = text.trim();
        if text.is_empty() {
            log::info!("pipeline: transcribed to empty text, nothing to say");
            self.set_state(PipelineState::Idle);
            return;
        }

        // ── Synthesize ───────────────────────────────────────────────────
        self.set_state(PipelineState::Synthesizing);
        log::info!("pipeline: synthesizing: {text}");

        let stream = match self.synthesizer.synthesize(text).await {
            Ok(stream) => stream,
            Err(e) => {
                log::error!("pipeline: synthesis failed: {e}");
                self.set_state(PipelineState::Idle);
                return;
            }
        };

        // ── Play ─────────────────────────────────────────────────────────
        self.set_state(PipelineState::Playing);
        log::info!("pipeline: playing");

        if let Err(e) = self.playback.play(stream).await {
            if e.is_fatal() {
                // The decode/play chain cannot launch; no future session
                // would fare better.
                log::error!("pipeline: {e}");
                std::process::exit(1);
            }
            log::error!("pipeline: playback failed: {e}");
        }

        self.set_state(PipelineState::Idle);
    }

    fn set_state(&self, next: PipelineState) {
        *self.state.lock().unwrap() = next;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::state::new_shared_state;
    use crate::playback::MockPlayback;
    use crate::stt::{MockTranscriber, TranscribeError};
    use crate::tts::MockSynthesizer;
    use bytes::Bytes;
    use std::time::Duration;

    fn sh(script: &str) -> CommandSpec {
        CommandSpec::new("sh", &["-c", script])
    }

    /// 2 s of silence at 16 kHz mono s16le = 64 000 zero bytes.
    fn silence_recorder() -> CommandSpec {
        sh("head -c 64000 /dev/zero")
    }

    struct Harness {
        state: SharedState,
        transcriber: Arc<MockTranscriber>,
        synthesizer: Arc<MockSynthesizer>,
        playback: Arc<MockPlayback>,
        controller: PipelineController,
        tx: mpsc::Sender<HotkeyEvent>,
        rx: mpsc::Receiver<HotkeyEvent>,
    }

    fn harness(
        record_cmd: CommandSpec,
        transcriber: MockTranscriber,
        synthesizer: MockSynthesizer,
    ) -> Harness {
        let state = new_shared_state();
        let transcriber = Arc::new(transcriber);
        let synthesizer = Arc::new(synthesizer);
        let playback = Arc::new(MockPlayback::new());
        let (tx, rx) = mpsc::channel(16);

        let controller = PipelineController::new(
            Arc::clone(&state),
            record_cmd,
            16_000,
            Arc::clone(&transcriber) as Arc<dyn Transcriber>,
            Arc::clone(&synthesizer) as Arc<dyn Synthesizer>,
            Arc::clone(&playback) as Arc<dyn Playback>,
        );

        Harness {
            state,
            transcriber,
            synthesizer,
            playback,
            controller,
            tx,
            rx,
        }
    }

    /// Poll until the worker task brings the pipeline back to Idle.
    async fn wait_for_idle(state: &SharedState) {
        for _ in 0..200 {
            if *state.lock().unwrap() == PipelineState::Idle {
                return;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        panic!("pipeline never returned to Idle");
    }

    // -----------------------------------------------------------------------
    // Guard: press only from Idle
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn press_outside_idle_spawns_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("spawned");

        let h = harness(
            sh(&format!("echo run > {}", marker.display())),
            MockTranscriber::ok("unused"),
            MockSynthesizer::ok(vec![]),
        );
        // Simulate a busy pipeline.
        *h.state.lock().unwrap() = PipelineState::Playing;

        h.tx.send(HotkeyEvent::Pressed).await.unwrap();
        drop(h.tx);
        h.controller.run(h.rx).await.unwrap();

        assert!(!marker.exists(), "recorder must not be spawned while busy");
        assert_eq!(*h.state.lock().unwrap(), PipelineState::Playing);
    }

    #[tokio::test]
    async fn concurrent_presses_create_exactly_one_session() {
        let dir = tempfile::tempdir().unwrap();
        let count_file = dir.path().join("spawns");

        // Each spawn appends a line; the trailing sleep keeps stdout open so
        // the pipeline is still Recording when the second press arrives.
        let h = harness(
            sh(&format!(
                "echo run >> {}; head -c 64000 /dev/zero; sleep 1",
                count_file.display()
            )),
            MockTranscriber::ok("hello"),
            MockSynthesizer::ok(vec![Bytes::from_static(b"audio")]),
        );

        let tx2 = h.tx.clone();
        let press_a = tokio::spawn({
            let tx = h.tx.clone();
            async move { tx.send(HotkeyEvent::Pressed).await.unwrap() }
        });
        let press_b =
            tokio::spawn(async move { tx2.send(HotkeyEvent::Pressed).await.unwrap() });
        press_a.await.unwrap();
        press_b.await.unwrap();
        drop(h.tx);

        h.controller.run(h.rx).await.unwrap();
        wait_for_idle(&h.state).await;

        let spawns = std::fs::read_to_string(&count_file).unwrap();
        assert_eq!(spawns.lines().count(), 1, "exactly one recorder expected");
        assert_eq!(h.transcriber.calls(), 1);
    }

    // -----------------------------------------------------------------------
    // Short-circuit paths
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn empty_transcript_never_reaches_the_synthesizer() {
        let h = harness(
            silence_recorder(),
            MockTranscriber::ok("   \n"),
            MockSynthesizer::ok(vec![Bytes::from_static(b"never")]),
        );

        h.tx.send(HotkeyEvent::Pressed).await.unwrap();
        drop(h.tx);
        h.controller.run(h.rx).await.unwrap();
        wait_for_idle(&h.state).await;

        assert_eq!(h.transcriber.calls(), 1);
        assert_eq!(h.synthesizer.calls(), 0);
        assert_eq!(h.playback.calls(), 0);
    }

    #[tokio::test]
    async fn transcription_failure_returns_to_idle() {
        let h = harness(
            silence_recorder(),
            MockTranscriber::err(TranscribeError::Inference("boom".into())),
            MockSynthesizer::ok(vec![]),
        );

        h.tx.send(HotkeyEvent::Pressed).await.unwrap();
        drop(h.tx);
        h.controller.run(h.rx).await.unwrap();
        wait_for_idle(&h.state).await;

        assert_eq!(h.synthesizer.calls(), 0);
    }

    #[tokio::test]
    async fn rejected_synthesis_never_reaches_playback() {
        let h = harness(
            silence_recorder(),
            MockTranscriber::ok("hello"),
            MockSynthesizer::status(429),
        );

        h.tx.send(HotkeyEvent::Pressed).await.unwrap();
        drop(h.tx);
        h.controller.run(h.rx).await.unwrap();
        wait_for_idle(&h.state).await;

        assert_eq!(h.synthesizer.calls(), 1);
        assert_eq!(h.playback.calls(), 0);
    }

    // -----------------------------------------------------------------------
    // Full pipeline
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn full_session_delivers_synthesis_chunks_in_order() {
        let h = harness(
            silence_recorder(),
            MockTranscriber::ok("hello world"),
            MockSynthesizer::ok(vec![
                Bytes::from_static(b"chunk-one"),
                Bytes::from_static(b"chunk-two"),
            ]),
        );

        h.tx.send(HotkeyEvent::Pressed).await.unwrap();
        drop(h.tx);
        h.controller.run(h.rx).await.unwrap();
        wait_for_idle(&h.state).await;

        assert_eq!(h.synthesizer.last_text().as_deref(), Some("hello world"));
        assert_eq!(
            h.playback.received(),
            vec![
                Bytes::from_static(b"chunk-one"),
                Bytes::from_static(b"chunk-two"),
            ]
        );
    }

    #[tokio::test]
    async fn release_interrupts_an_endless_recorder() {
        // This recorder never stops on its own; only the SIGINT from the
        // release path can end the session.
        let h = harness(
            sh("cat /dev/zero"),
            MockTranscriber::ok("hi"),
            MockSynthesizer::ok(vec![Bytes::from_static(b"audio")]),
        );

        h.tx.send(HotkeyEvent::Pressed).await.unwrap();
        // Give the recorder time to start producing.
        tokio::time::sleep(Duration::from_millis(200)).await;
        h.tx.send(HotkeyEvent::Released).await.unwrap();
        drop(h.tx);

        h.controller.run(h.rx).await.unwrap();
        wait_for_idle(&h.state).await;

        assert_eq!(h.playback.calls(), 1);
    }

    #[tokio::test]
    async fn release_without_session_is_a_noop() {
        let h = harness(
            silence_recorder(),
            MockTranscriber::ok("unused"),
            MockSynthesizer::ok(vec![]),
        );

        h.tx.send(HotkeyEvent::Released).await.unwrap();
        drop(h.tx);
        h.controller.run(h.rx).await.unwrap();

        assert_eq!(*h.state.lock().unwrap(), PipelineState::Idle);
        assert_eq!(h.transcriber.calls(), 0);
    }

    #[tokio::test]
    async fn recorder_spawn_failure_aborts_the_run() {
        let h = harness(
            CommandSpec::new("/nonexistent/recorder-binary", &[]),
            MockTranscriber::ok("unused"),
            MockSynthesizer::ok(vec![]),
        );

        h.tx.send(HotkeyEvent::Pressed).await.unwrap();
        drop(h.tx);

        let err = h.controller.run(h.rx).await.unwrap_err();
        assert!(matches!(err, CaptureError::Spawn { .. }));
        // The failed press must not leave the pipeline claimed.
        assert_eq!(*h.state.lock().unwrap(), PipelineState::Idle);
    }
}
