use std::{str::FromStr, time::Duration};

use anyhow::Context;
use serde::Deserialize;

/// Upper bound for token lifetimes: one year.
pub const MAX_TTL_MINUTES: i64 = 60 * 24 * 365;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

/// Where the note generator gets its source material from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    /// Fetch captions and embed them in the prompt.
    Transcript,
    /// Hand the video URL straight to the model.
    Video,
}

impl FromStr for SourceMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "transcript" => Ok(SourceMode::Transcript),
            "video" | "url" => Ok(SourceMode::Video),
            other => anyhow::bail!("unknown NOTES_SOURCE_MODE {other:?}"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub source_mode: SourceMode,
    pub max_transcript_chars: usize,
    pub upstream_timeout_secs: u64,
}

impl GenerationConfig {
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }
}

/// Out-of-band admin account provisioned at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminSeed {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt: JwtConfig,
    pub generation: GenerationConfig,
    pub admin: Option<AdminSeed>,
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(v) => v.trim().parse::<T>().with_context(|| format!("invalid {key}: {v:?}")),
        None => Ok(default),
    }
}

fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    parse_or(key, std::env::var(key).ok(), default)
}

fn bounded_ttl(key: &str, minutes: i64) -> anyhow::Result<i64> {
    if !(1..=MAX_TTL_MINUTES).contains(&minutes) {
        anyhow::bail!("{key} must be between 1 and {MAX_TTL_MINUTES} minutes, got {minutes}");
    }
    Ok(minutes)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "studyportal".into()),
            audience: std::env::var("JWT_AUDIENCE")
                .unwrap_or_else(|_| "studyportal-users".into()),
            ttl_minutes: bounded_ttl("JWT_TTL_MINUTES", env_or("JWT_TTL_MINUTES", 60)?)?,
            refresh_ttl_minutes: bounded_ttl(
                "JWT_REFRESH_TTL_MINUTES",
                env_or("JWT_REFRESH_TTL_MINUTES", 60 * 24 * 14)?,
            )?,
        };

        let source_mode = match std::env::var("NOTES_SOURCE_MODE") {
            Ok(v) => v.parse()?,
            Err(_) => SourceMode::Transcript,
        };
        let generation = GenerationConfig {
            api_key: std::env::var("GEMINI_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            model: std::env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-1.5-flash".into()),
            base_url: std::env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com/v1beta".into()),
            source_mode,
            max_transcript_chars: env_or("NOTES_MAX_TRANSCRIPT_CHARS", 30_000)?,
            upstream_timeout_secs: env_or("UPSTREAM_TIMEOUT_SECS", 60)?,
        };

        let admin = match (std::env::var("ADMIN_EMAIL"), std::env::var("ADMIN_PASSWORD")) {
            (Ok(email), Ok(password)) => Some(AdminSeed {
                name: std::env::var("ADMIN_NAME").unwrap_or_else(|_| "Admin User".into()),
                email,
                password,
            }),
            _ => None,
        };

        Ok(Self {
            database_url,
            database_max_connections: env_or("DATABASE_MAX_CONNECTIONS", 10)?,
            jwt,
            generation,
            admin,
        })
    }
}
