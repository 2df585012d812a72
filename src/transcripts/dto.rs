use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::Transcript;

/// Response returned after a successful transcription.
#[derive(Debug, Serialize)]
pub struct TranscribeResponse {
    pub status: String,
    pub filename: String,
    pub duration_seconds: f64,
    pub transcript: String,
}

/// One entry in the caller's transcript history.
#[derive(Debug, Serialize)]
pub struct TranscriptListItem {
    pub id: Uuid,
    pub title: String,
    pub transcript: String,
    pub audio_filename: String,
    pub duration_seconds: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Transcript> for TranscriptListItem {
    fn from(t: Transcript) -> Self {
        Self {
            id: t.id,
            title: t.title,
            transcript: t.transcript,
            audio_filename: t.audio_filename,
            duration_seconds: t.duration_seconds,
            created_at: t.created_at,
        }
    }
}
