//! Decode-and-play chain for the synthesis stream.
//!
//! Two external processes wired stdout-to-stdin:
//!
//! ```text
//! AudioStream ──1024-byte writes──▶ decoder stdin (ffmpeg, mp3 → s16le)
//!                                   decoder stdout ──pipe──▶ player stdin
//! ```
//!
//! Writes are chunked so decoding and playback interleave with network
//! receipt; closing the decoder's stdin when the stream ends makes it flush,
//! and the player finishes once it drains the pipe.  `play` resolves only
//! after the player exits.

use std::process::Stdio;

use async_trait::async_trait;
use futures_util::StreamExt;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::audio::CommandSpec;
use crate::tts::AudioStream;

/// Bytes per write into the decoder's stdin.
const WRITE_CHUNK: usize = 1024;

// ---------------------------------------------------------------------------
// PlaybackError
// ---------------------------------------------------------------------------

/// Failures in the decode-and-play chain.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The decoder or player executable could not be launched.  Fatal: if it
    /// failed now it will fail for every future session too.
    #[error("failed to launch {role} `{command}`: {source}")]
    Spawn {
        role: &'static str,
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Writing to or wiring up the process pipes failed mid-stream.
    #[error("playback pipe error: {0}")]
    Pipe(#[from] std::io::Error),

    /// The synthesis stream itself broke while playback was in progress.
    #[error("synthesis stream failed during playback: {0}")]
    Stream(String),

    /// A chain process exited unsuccessfully.
    #[error("{role} exited with {status}")]
    ProcessFailed {
        role: &'static str,
        status: std::process::ExitStatus,
    },
}

impl PlaybackError {
    /// Spawn failures end the program; everything else only ends the session.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PlaybackError::Spawn { .. })
    }
}

// ---------------------------------------------------------------------------
// Playback trait
// ---------------------------------------------------------------------------

/// Consumes one [`AudioStream`], blocking (asynchronously) until audible
/// playback has finished.
#[async_trait]
pub trait Playback: Send + Sync {
    async fn play(&self, stream: AudioStream) -> Result<(), PlaybackError>;
}

// ---------------------------------------------------------------------------
// ProcessPlayback
// ---------------------------------------------------------------------------

/// The production chain: external decoder piped into an external player.
pub struct ProcessPlayback {
    decode: CommandSpec,
    play: CommandSpec,
}

impl ProcessPlayback {
    pub fn new(decode: CommandSpec, play: CommandSpec) -> Self {
        Self { decode, play }
    }

    fn spawn_err<'a>(
        role: &'static str,
        spec: &'a CommandSpec,
    ) -> impl FnOnce(std::io::Error) -> PlaybackError + 'a {
        move |source| PlaybackError::Spawn {
            role,
            command: spec.to_string(),
            source,
        }
    }
}

#[async_trait]
impl Playback for ProcessPlayback {
    async fn play(&self, mut stream: AudioStream) -> Result<(), PlaybackError> {
        // kill_on_drop guarantees neither process outlives an error path.
        let mut decoder = Command::new(&self.decode.program)
            .args(&self.decode.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(Self::spawn_err("decoder", &self.decode))?;

        let decoder_out = decoder.stdout.take().expect("decoder stdout piped");
        let decoder_out: Stdio = decoder_out.try_into()?;

        let mut player = Command::new(&self.play.program)
            .args(&self.play.args)
            .stdin(decoder_out)
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(Self::spawn_err("player", &self.play))?;

        let mut decoder_in = decoder.stdin.take().expect("decoder stdin piped");

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| PlaybackError::Stream(e.to_string()))?;
            for piece in chunk.chunks(WRITE_CHUNK) {
                decoder_in.write_all(piece).await?;
            }
        }

        // Closing stdin signals EOF: the decoder flushes its tail and exits,
        // which in turn closes the player's stdin.
        decoder_in.shutdown().await?;
        drop(decoder_in);

        let decoder_status = decoder.wait().await?;
        let player_status = player.wait().await?;

        if !decoder_status.success() {
            return Err(PlaybackError::ProcessFailed {
                role: "decoder",
                status: decoder_status,
            });
        }
        if !player_status.success() {
            return Err(PlaybackError::ProcessFailed {
                role: "player",
                status: player_status,
            });
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockPlayback  (test-only)
// ---------------------------------------------------------------------------

/// Test double that drains the stream into memory instead of spawning
/// processes.
#[cfg(test)]
pub struct MockPlayback {
    received: std::sync::Mutex<Vec<bytes::Bytes>>,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockPlayback {
    pub fn new() -> Self {
        Self {
            received: std::sync::Mutex::new(Vec::new()),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub fn received(&self) -> Vec<bytes::Bytes> {
        self.received.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl Playback for MockPlayback {
    async fn play(&self, mut stream: AudioStream) -> Result<(), PlaybackError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| PlaybackError::Stream(e.to_string()))?;
            self.received.lock().unwrap().push(chunk);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tts::{stream_from_chunks, SynthesisError};
    use bytes::Bytes;

    fn sh(script: &str) -> CommandSpec {
        CommandSpec::new("sh", &["-c", script])
    }

    #[tokio::test]
    async fn chain_pipes_all_chunks_through_both_processes() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("played.raw");

        // "decoder" is an identity transform; "player" writes what it hears.
        let chain = ProcessPlayback::new(
            sh("cat"),
            sh(&format!("cat > {}", out.display())),
        );

        let stream = stream_from_chunks(vec![
            Bytes::from_static(b"hello "),
            Bytes::from_static(b"world"),
        ]);
        chain.play(stream).await.unwrap();

        assert_eq!(std::fs::read(&out).unwrap(), b"hello world");
    }

    #[tokio::test]
    async fn chunks_larger_than_write_size_arrive_intact() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("played.raw");

        let chain = ProcessPlayback::new(sh("cat"), sh(&format!("cat > {}", out.display())));

        // One 5000-byte chunk spans several 1024-byte writes.
        let big: Vec<u8> = (0..5000u32).map(|i| (i % 251) as u8).collect();
        chain
            .play(stream_from_chunks(vec![Bytes::from(big.clone())]))
            .await
            .unwrap();

        assert_eq!(std::fs::read(&out).unwrap(), big);
    }

    #[tokio::test]
    async fn missing_decoder_is_a_fatal_spawn_error() {
        let chain = ProcessPlayback::new(
            CommandSpec::new("/nonexistent/decoder-binary", &[]),
            sh("cat > /dev/null"),
        );

        let err = chain
            .play(stream_from_chunks(vec![Bytes::from_static(b"x")]))
            .await
            .unwrap_err();

        assert!(err.is_fatal());
        assert!(matches!(err, PlaybackError::Spawn { role: "decoder", .. }));
    }

    #[tokio::test]
    async fn failing_decoder_surfaces_process_failure() {
        let chain = ProcessPlayback::new(sh("cat > /dev/null; exit 3"), sh("cat > /dev/null"));

        let err = chain
            .play(stream_from_chunks(vec![Bytes::from_static(b"x")]))
            .await
            .unwrap_err();

        assert!(!err.is_fatal());
        assert!(matches!(err, PlaybackError::ProcessFailed { role: "decoder", .. }));
    }

    #[tokio::test]
    async fn mid_stream_error_aborts_playback() {
        let chain = ProcessPlayback::new(sh("cat"), sh("cat > /dev/null"));

        let broken: AudioStream = Box::pin(futures_util::stream::iter(vec![
            Ok(Bytes::from_static(b"start")),
            Err(SynthesisError::Stream("connection reset".into())),
        ]));

        let err = chain.play(broken).await.unwrap_err();
        assert!(matches!(err, PlaybackError::Stream(_)));
        assert!(!err.is_fatal());
    }

    #[tokio::test]
    async fn mock_records_chunks_in_order() {
        let mock = MockPlayback::new();
        mock.play(stream_from_chunks(vec![
            Bytes::from_static(b"one"),
            Bytes::from_static(b"two"),
        ]))
        .await
        .unwrap();

        assert_eq!(mock.calls(), 1);
        assert_eq!(
            mock.received(),
            vec![Bytes::from_static(b"one"), Bytes::from_static(b"two")]
        );
    }
}
