//! Audio-server detection and external command descriptors.
//!
//! The relay never touches an audio device directly — it drives three
//! external processes:
//!
//! ```text
//! recorder (pw-record / parec) ──▶ raw s16le mono @ 16 kHz ──▶ capture
//! decoder  (ffmpeg)            ──▶ mp3 → raw s16le mono @ 44.1 kHz
//! player   (pw-cat / pacat)    ──▶ raw s16le mono @ 44.1 kHz → sink
//! ```
//!
//! Which recorder/player pair to use depends on whether PipeWire or
//! PulseAudio is running; [`AudioCommands::detect`] resolves that once at
//! startup by scanning the process table.  The resulting [`CommandSpec`]s
//! are immutable for the process lifetime.

use std::fmt;
use std::process::Command;

use sysinfo::System;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Capture sample rate — must match what the transcriber expects.
pub const RECORD_RATE: u32 = 16_000;

/// Playback sample rate — the decoder is told to resample to this.
pub const PLAYBACK_RATE: u32 = 44_100;

// ---------------------------------------------------------------------------
// AudioServerError
// ---------------------------------------------------------------------------

/// No usable audio server was found at startup.
#[derive(Debug, Error)]
pub enum AudioServerError {
    #[error("no process named \"pipewire\" or \"pulseaudio\" is running")]
    NoServer,
}

// ---------------------------------------------------------------------------
// CommandSpec
// ---------------------------------------------------------------------------

/// An immutable argument vector for one external process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Build a `std::process::Command` ready to spawn.
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// AudioCommands
// ---------------------------------------------------------------------------

/// The three command descriptors the pipeline launches.
#[derive(Debug, Clone)]
pub struct AudioCommands {
    /// Captures raw PCM from the microphone onto stdout.
    pub record: CommandSpec,
    /// Renders raw PCM from stdin to the audio sink.
    pub play: CommandSpec,
    /// Decodes an MP3 byte stream from stdin to raw PCM on stdout.
    pub decode: CommandSpec,
}

impl AudioCommands {
    /// Detect the running audio server and build the recorder/player pair,
    /// optionally targeting a specific `source` device and `sink` device.
    ///
    /// # Errors
    ///
    /// [`AudioServerError::NoServer`] when neither PipeWire nor PulseAudio
    /// is running.
    pub fn detect(source: Option<&str>, sink: Option<&str>) -> Result<Self, AudioServerError> {
        let sys = System::new_all();
        let running = |name: &str| sys.processes().values().any(|p| p.name() == name);

        if running("pipewire") {
            Ok(Self::pipewire(source, sink))
        } else if running("pulseaudio") {
            Ok(Self::pulseaudio(source, sink))
        } else {
            Err(AudioServerError::NoServer)
        }
    }

    /// `pw-record` / `pw-cat` pair (both default to s16).
    fn pipewire(source: Option<&str>, sink: Option<&str>) -> Self {
        let mut record = vec!["--rate".into(), RECORD_RATE.to_string()];
        if let Some(source) = source {
            record.extend(["--target".into(), source.to_string()]);
        }
        record.extend(["--channels".into(), "1".into(), "--latency".into(), "50".into(), "-".into()]);

        let mut play = vec!["--rate".into(), PLAYBACK_RATE.to_string()];
        if let Some(sink) = sink {
            play.extend(["--target".into(), sink.to_string()]);
        }
        play.extend(["--channels".into(), "1".into(), "-p".into(), "-".into()]);

        Self {
            record: CommandSpec { program: "pw-record".into(), args: record },
            play: CommandSpec { program: "pw-cat".into(), args: play },
            decode: Self::ffmpeg_decode(),
        }
    }

    /// `parec` / `pacat` pair (both default to s16).
    fn pulseaudio(source: Option<&str>, sink: Option<&str>) -> Self {
        let mut record = vec![format!("--rate={RECORD_RATE}"), "--channels=1".into()];
        if let Some(source) = source {
            record.push(format!("--device={source}"));
        }
        record.push("--latency-msec=50".into());

        let mut play = vec![format!("--rate={PLAYBACK_RATE}"), "--channels=1".into()];
        if let Some(sink) = sink {
            play.push(format!("--device={sink}"));
        }

        Self {
            record: CommandSpec { program: "parec".into(), args: record },
            play: CommandSpec { program: "pacat".into(), args: play },
            decode: Self::ffmpeg_decode(),
        }
    }

    /// ffmpeg invocation turning the synthesis MP3 stream into raw PCM the
    /// player understands.
    fn ffmpeg_decode() -> CommandSpec {
        CommandSpec::new(
            "ffmpeg",
            &[
                "-hide_banner",
                "-loglevel",
                "error",
                "-f",
                "mp3",
                "-i",
                "-",
                "-f",
                "s16le",
                "-ar",
                "44100",
                "-ac",
                "1",
                "-",
            ],
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
