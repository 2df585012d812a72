use serde::Deserialize;

/// Speech engine backend selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    Whisper,
    Mock,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub upload_dir: String,
    pub engine: EngineKind,
    pub whisper_model: String,
}

impl AppConfig {
    /// Read configuration from the environment. Every value has a
    /// development default; none of the defaults are production-safe.
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| {
            format!(
                "postgres://{}:{}@{}:{}/{}",
                env_or("DB_USER", "postgres"),
                env_or("DB_PASSWORD", "postgres"),
                env_or("DB_HOST", "localhost"),
                env_or("DB_PORT", "5432"),
                env_or("DB_NAME", "speech_app"),
            )
        });

        let engine = match env_or("SPEECH_ENGINE", "whisper").to_lowercase().as_str() {
            "whisper" => EngineKind::Whisper,
            "mock" => EngineKind::Mock,
            other => anyhow::bail!("unknown SPEECH_ENGINE: {}", other),
        };

        Ok(Self {
            database_url,
            jwt_secret: env_or("JWT_SECRET", "supersecretkey"),
            upload_dir: env_or("UPLOAD_DIR", "/tmp"),
            engine,
            whisper_model: env_or("WHISPER_MODEL", "models/ggml-base.bin"),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
