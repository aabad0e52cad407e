//! Resolved, immutable runtime configuration.
//!
//! Built once from the parsed [`Cli`] before anything else starts; the
//! pipeline and its collaborators receive these values by clone and never
//! see the CLI layer.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use crate::cli::{Cli, SttBackend};
use crate::hotkey::parse_key;

// ---------------------------------------------------------------------------
// RelayConfig
// ---------------------------------------------------------------------------

/// Everything the relay needs, validated.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// ElevenLabs voice id.
    pub voice_id: String,
    /// ElevenLabs API key.
    pub api_key: String,
    /// Resolved push-to-talk key.
    pub key: rdev::Key,
    /// Which transcription backend to construct.
    pub stt: SttBackend,
    /// Whisper GGML model path (local backend).
    pub model: PathBuf,
    /// Force CPU inference for the local backend.
    pub use_gpu: bool,
    /// Language hint for the transcriber.
    pub language: String,
    /// API key for the remote transcription backend.
    pub stt_api_key: Option<String>,
    /// Capture source selector, if any.
    pub input_source: Option<String>,
    /// Playback sink selector, if any.
    pub output_sink: Option<String>,
}

impl RelayConfig {
    /// Validate and resolve the parsed CLI.
    ///
    /// # Errors
    ///
    /// - unknown push-to-talk key name
    /// - remote transcription selected without an API key
    pub fn from_cli(cli: Cli) -> Result<Self> {
        let key = parse_key(&cli.key)
            .with_context(|| format!("unknown push-to-talk key name: {:?}", cli.key))?;

        if cli.stt == SttBackend::Remote && cli.stt_api_key.is_none() {
            bail!("--stt remote requires --stt-api-key (or OPENAI_API_KEY)");
        }

        Ok(Self {
            voice_id: cli.voice,
            api_key: cli.api_key,
            key,
            stt: cli.stt,
            model: cli.model,
            use_gpu: !cli.cpu,
            language: cli.language,
            stt_api_key: cli.stt_api_key,
            input_source: cli.input_source,
            output_sink: cli.output_sink,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
