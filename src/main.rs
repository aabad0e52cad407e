//! Application entry point.
//!
//! Startup sequence:
//!
//! 1. Initialise logging.
//! 2. Parse the CLI into an immutable [`RelayConfig`].
//! 3. Detect the audio server and fix the recorder/decoder/player commands.
//! 4. Construct the transcription backend (loading the whisper model when
//!    running locally — slow, done before the hotkey goes live).
//! 5. Spawn the pipeline controller and the hotkey listener.
//! 6. Run until Ctrl-C or a fatal pipeline error.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc;

use voice_relay::audio::{AudioCommands, RECORD_RATE};
use voice_relay::cli::{Cli, SttBackend};
use voice_relay::config::RelayConfig;
use voice_relay::hotkey::HotkeyListener;
use voice_relay::pipeline::{new_shared_state, PipelineController};
use voice_relay::playback::{Playback, ProcessPlayback};
use voice_relay::stt::{LocalTranscriber, RemoteTranscriber, Transcriber};
use voice_relay::tts::{ElevenLabsSynthesizer, Synthesizer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = RelayConfig::from_cli(Cli::parse())?;

    let commands = AudioCommands::detect(
        config.input_source.as_deref(),
        config.output_sink.as_deref(),
    )?;
    log::info!("record command: {}", commands.record);
    log::info!("playback command: {}", commands.play);

    let transcriber: Arc<dyn Transcriber> = match config.stt {
        SttBackend::Local => {
            log::info!("loading whisper model from {}", config.model.display());
            let engine = LocalTranscriber::load(&config.model, &config.language, config.use_gpu)
                .context("failed to load the whisper model")?;
            log::info!("model loaded");
            Arc::new(engine)
        }
        SttBackend::Remote => {
            // Validated in RelayConfig::from_cli.
            let api_key = config.stt_api_key.clone().expect("remote key checked");
            Arc::new(RemoteTranscriber::new(api_key, &config.language))
        }
    };

    let synthesizer: Arc<dyn Synthesizer> = Arc::new(ElevenLabsSynthesizer::new(
        config.voice_id.clone(),
        config.api_key.clone(),
    ));
    let playback: Arc<dyn Playback> =
        Arc::new(ProcessPlayback::new(commands.decode, commands.play));

    let (hotkey_tx, hotkey_rx) = mpsc::channel(16);
    let controller = PipelineController::new(
        new_shared_state(),
        commands.record,
        RECORD_RATE,
        transcriber,
        synthesizer,
        playback,
    );

    let _listener = HotkeyListener::start(config.key, hotkey_tx);
    log::info!("ready — hold the push-to-talk key to speak");

    tokio::select! {
        result = controller.run(hotkey_rx) => {
            result.context("recorder could not be launched")?;
        }
        _ = tokio::signal::ctrl_c() => {
            log::info!("interrupted, shutting down");
        }
    }

    Ok(())
}
