//! Speech-to-text boundary. The HTTP layer depends on [`SpeechEngine`]
//! instead of a concrete implementation, so tests can substitute a canned
//! backend through configuration.

use std::sync::Arc;

use axum::async_trait;

use crate::config::{AppConfig, EngineKind};

mod mock;
mod whisper;

pub use mock::{MockEngine, MOCK_TRANSCRIPT};
pub use whisper::WhisperEngine;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("model loading failed: {0}")]
    ModelLoadFailed(String),
    #[error("transcription failed: {0}")]
    InferenceFailed(String),
}

/// Contract consumed by the transcribe pipeline: 16 kHz mono f32 samples
/// in, transcript text out.
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    async fn transcribe(&self, samples: Vec<f32>) -> Result<String, EngineError>;
}

/// Build the engine selected by configuration. Called once at startup; the
/// result is shared read-only across requests.
pub fn build_engine(config: &AppConfig) -> Result<Arc<dyn SpeechEngine>, EngineError> {
    match config.engine {
        EngineKind::Whisper => Ok(Arc::new(WhisperEngine::new(&config.whisper_model)?)),
        EngineKind::Mock => Ok(Arc::new(MockEngine)),
    }
}
