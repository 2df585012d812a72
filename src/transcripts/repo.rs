use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Transcript record, owned by exactly one user and immutable after
/// creation.
#[derive(Debug, Clone, FromRow)]
pub struct Transcript {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub transcript: String,
    pub audio_filename: String,
    pub duration_seconds: f64,
    pub created_at: OffsetDateTime,
}

impl Transcript {
    pub async fn create(
        db: &PgPool,
        user_id: Uuid,
        title: &str,
        transcript: &str,
        audio_filename: &str,
        duration_seconds: f64,
    ) -> anyhow::Result<Transcript> {
        let record = sqlx::query_as::<_, Transcript>(
            r#"
            INSERT INTO transcripts (user_id, title, transcript, audio_filename, duration_seconds)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, title, transcript, audio_filename, duration_seconds, created_at
            "#,
        )
        .bind(user_id)
        .bind(title)
        .bind(transcript)
        .bind(audio_filename)
        .bind(duration_seconds)
        .fetch_one(db)
        .await?;
        Ok(record)
    }

    /// All transcripts owned by a user, newest first.
    pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Transcript>> {
        let rows = sqlx::query_as::<_, Transcript>(
            r#"
            SELECT id, user_id, title, transcript, audio_filename, duration_seconds, created_at
            FROM transcripts
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Fetch a transcript only if `user_id` owns it. Unknown ids and other
    /// users' transcripts both come back as `None`.
    pub async fn get_owned(
        db: &PgPool,
        user_id: Uuid,
        id: Uuid,
    ) -> anyhow::Result<Option<Transcript>> {
        let record = sqlx::query_as::<_, Transcript>(
            r#"
            SELECT id, user_id, title, transcript, audio_filename, duration_seconds, created_at
            FROM transcripts
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await?;
        Ok(record)
    }
}
