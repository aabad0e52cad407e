//! In-process whisper transcription via `whisper-rs`.
//!
//! The model is loaded once at startup (slow — hundreds of MB of weights);
//! each transcription creates a fresh `WhisperState`, so the context can be
//! shared across threads without locking.  Inference is CPU/GPU-bound and
//! blocking, so it runs on the tokio blocking pool.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use super::{TranscribeError, Transcriber};

// ---------------------------------------------------------------------------
// LocalTranscriber
// ---------------------------------------------------------------------------

/// Whisper engine wrapping a shared `WhisperContext`.
///
/// `WhisperContext` is declared `Send + Sync` by whisper-rs (the weights are
/// read-only after loading), so holding it in an `Arc` lets the blocking-pool
/// inference task borrow it safely.
pub struct LocalTranscriber {
    ctx: Arc<WhisperContext>,
    language: String,
}

impl std::fmt::Debug for LocalTranscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalTranscriber")
            .field("language", &self.language)
            .finish_non_exhaustive()
    }
}

impl LocalTranscriber {
    /// Load a GGML model from `model_path`.
    ///
    /// # Errors
    ///
    /// - [`TranscribeError::ModelNotFound`] — `model_path` does not exist.
    /// - [`TranscribeError::ContextInit`]  — whisper-rs failed to load it.
    pub fn load(
        model_path: impl AsRef<Path>,
        language: &str,
        use_gpu: bool,
    ) -> Result<Self, TranscribeError> {
        let path = model_path.as_ref();

        if !path.exists() {
            return Err(TranscribeError::ModelNotFound(path.display().to_string()));
        }

        let path_str = path.to_str().ok_or_else(|| {
            TranscribeError::ModelNotFound(format!(
                "model path is not valid UTF-8: {}",
                path.display()
            ))
        })?;

        let mut ctx_params = WhisperContextParameters::default();
        ctx_params.use_gpu(use_gpu);

        let ctx = WhisperContext::new_with_params(path_str, ctx_params)
            .map_err(|e| TranscribeError::ContextInit(e.to_string()))?;

        Ok(Self {
            ctx: Arc::new(ctx),
            language: language.to_string(),
        })
    }
}

#[async_trait]
impl Transcriber for LocalTranscriber {
    /// Run inference on the blocking pool and return the concatenated segment
    /// text.  The sample rate is fixed by the model (16 kHz); the capture
    /// side records at that rate, so no resampling happens here.
    async fn transcribe(
        &self,
        samples: &[f32],
        _sample_rate: u32,
    ) -> Result<String, TranscribeError> {
        let ctx = Arc::clone(&self.ctx);
        let language = self.language.clone();
        let audio = samples.to_vec();

        tokio::task::spawn_blocking(move || run_inference(&ctx, &language, &audio))
            .await
            .map_err(|e| TranscribeError::Inference(format!("inference task failed: {e}")))?
    }
}

// ---------------------------------------------------------------------------
// Inference
// ---------------------------------------------------------------------------

fn run_inference(
    ctx: &WhisperContext,
    language: &str,
    audio: &[f32],
) -> Result<String, TranscribeError> {
    let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
    params.set_language(Some(language));
    params.set_print_progress(false);
    params.set_print_realtime(false);
    params.set_print_special(false);
    params.set_print_timestamps(false);

    let mut state = ctx
        .create_state()
        .map_err(|e| TranscribeError::ContextInit(e.to_string()))?;

    state
        .full(params, audio)
        .map_err(|e| TranscribeError::Inference(e.to_string()))?;

    let n_segments = state
        .full_n_segments()
        .map_err(|e| TranscribeError::Inference(e.to_string()))?;

    let mut text = String::new();
    for i in 0..n_segments {
        let segment = state
            .full_get_segment_text(i)
            .map_err(|e| TranscribeError::Inference(format!("segment {i}: {e}")))?;
        text.push_str(&segment);
    }

    Ok(text)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
