//! Command-line interface.
//!
//! Everything configurable is resolved here once at startup; the rest of the
//! program sees only the immutable [`RelayConfig`](crate::config::RelayConfig)
//! built from these arguments.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Push-to-talk voice relay: hold a key, speak, hear it back in another voice.
#[derive(Parser, Debug)]
#[command(name = "voice-relay", version, about)]
pub struct Cli {
    /// ElevenLabs voice id (the opaque id, not the display name)
    #[arg(short, long)]
    pub voice: String,

    /// ElevenLabs API key
    #[arg(long, env = "ELEVENLABS_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Push-to-talk key name, case-insensitive (e.g. shift_r, f9, caps_lock)
    #[arg(short, long, default_value = "shift_r")]
    pub key: String,

    /// Transcription backend
    #[arg(long, value_enum, default_value = "local")]
    pub stt: SttBackend,

    /// Path to the whisper GGML model (local backend only)
    #[arg(short, long, default_value = "models/ggml-medium.en.bin")]
    pub model: PathBuf,

    /// Run whisper on the CPU even when a GPU is available
    #[arg(long)]
    pub cpu: bool,

    /// Speech language hint as an ISO-639-1 code
    #[arg(long, default_value = "en")]
    pub language: String,

    /// API key for the remote transcription backend
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub stt_api_key: Option<String>,

    /// Capture source selector passed to the recorder
    #[arg(long, value_name = "SOURCE")]
    pub input_source: Option<String>,

    /// Playback sink selector passed to the player
    #[arg(long, value_name = "SINK")]
    pub output_sink: Option<String>,
}

/// Which transcription engine to construct at startup.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SttBackend {
    /// In-process whisper inference.
    Local,
    /// Hosted transcription API (needs --stt-api-key).
    Remote,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(args)
    }

    #[test]
    fn minimal_invocation_parses_with_defaults() {
        let cli = parse(&["voice-relay", "-v", "voice123", "--api-key", "k"]).unwrap();
        assert_eq!(cli.voice, "voice123");
        assert_eq!(cli.key, "shift_r");
        assert_eq!(cli.stt, SttBackend::Local);
        assert_eq!(cli.language, "en");
        assert!(!cli.cpu);
        assert!(cli.input_source.is_none());
    }

    #[test]
    fn voice_is_required() {
        assert!(parse(&["voice-relay", "--api-key", "k"]).is_err());
    }

    #[test]
    fn backend_and_devices_parse() {
        let cli = parse(&[
            "voice-relay",
            "-v",
            "voice123",
            "--api-key",
            "k",
            "--stt",
            "remote",
            "--stt-api-key",
            "sk",
            "--input-source",
            "mic2",
            "--output-sink",
            "headset",
        ])
        .unwrap();
        assert_eq!(cli.stt, SttBackend::Remote);
        assert_eq!(cli.stt_api_key.as_deref(), Some("sk"));
        assert_eq!(cli.input_source.as_deref(), Some("mic2"));
        assert_eq!(cli.output_sink.as_deref(), Some("headset"));
    }
}
