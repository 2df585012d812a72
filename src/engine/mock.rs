use axum::async_trait;

use super::{EngineError, SpeechEngine};

/// Canned transcript returned by [`MockEngine`] and by the filename bypass
/// in the transcribe handler.
pub const MOCK_TRANSCRIPT: &str = "hello from test";

/// Engine that returns a fixed transcript without loading a model.
/// Selected with `SPEECH_ENGINE=mock`.
pub struct MockEngine;

#[async_trait]
impl SpeechEngine for MockEngine {
    async fn transcribe(&self, _samples: Vec<f32>) -> Result<String, EngineError> {
        Ok(MOCK_TRANSCRIPT.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_canned_transcript() {
        let text = MockEngine.transcribe(vec![0.0; 16]).await.expect("mock");
        assert_eq!(text, MOCK_TRANSCRIPT);
    }
}
