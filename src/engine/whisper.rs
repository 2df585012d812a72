use std::sync::Arc;

use axum::async_trait;
use tracing::info;
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use super::{EngineError, SpeechEngine};

/// whisper.cpp backend. The context is loaded once and shared; each request
/// gets its own inference state.
pub struct WhisperEngine {
    ctx: Arc<WhisperContext>,
}

impl WhisperEngine {
    pub fn new(model_path: &str) -> Result<Self, EngineError> {
        info!(model = model_path, "loading whisper model");
        let ctx = WhisperContext::new_with_params(model_path, WhisperContextParameters::default())
            .map_err(|e| EngineError::ModelLoadFailed(format!("{}: {}", model_path, e)))?;
        info!(model = model_path, "whisper model loaded");
        Ok(Self { ctx: Arc::new(ctx) })
    }
}

fn run_inference(ctx: &WhisperContext, samples: &[f32]) -> Result<String, EngineError> {
    let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
    params.set_print_special(false);
    params.set_print_progress(false);
    params.set_print_realtime(false);
    params.set_print_timestamps(false);
    params.set_translate(false);

    let mut state = ctx
        .create_state()
        .map_err(|e| EngineError::InferenceFailed(format!("state: {}", e)))?;
    state
        .full(params, samples)
        .map_err(|e| EngineError::InferenceFailed(format!("inference: {}", e)))?;

    let num_segments = state
        .full_n_segments()
        .map_err(|e| EngineError::InferenceFailed(format!("segments: {}", e)))?;

    let mut text = String::new();
    for i in 0..num_segments {
        if let Ok(segment) = state.full_get_segment_text(i) {
            text.push_str(&segment);
            text.push(' ');
        }
    }

    Ok(text.trim().to_string())
}

#[async_trait]
impl SpeechEngine for WhisperEngine {
    async fn transcribe(&self, samples: Vec<f32>) -> Result<String, EngineError> {
        // Inference is CPU-bound; keep it off the async workers.
        let ctx = self.ctx.clone();
        tokio::task::spawn_blocking(move || run_inference(&ctx, &samples))
            .await
            .map_err(|e| EngineError::InferenceFailed(format!("inference task: {}", e)))?
    }
}
