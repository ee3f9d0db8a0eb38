use anyhow::{Context, Result};

use crate::llm_client::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::tutor::extractor::ExtractionMode;

/// Application configuration loaded from environment variables.
/// Startup fails if the model credential is missing or blank.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub llm_timeout_secs: u64,
    /// Upper bound on explanation calls in flight during one evaluation.
    pub explanation_concurrency: usize,
    pub extraction_mode: ExtractionMode,
    pub max_questions: u32,
    /// Offset used for assessment timestamps that carry no zone (IST by default).
    pub assessment_utc_offset_minutes: i32,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let gemini_api_key = require_env("GEMINI_API_KEY")?;
        if gemini_api_key.trim().is_empty() {
            anyhow::bail!("Required environment variable 'GEMINI_API_KEY' is blank");
        }

        Ok(Config {
            gemini_api_key,
            gemini_model: optional_env("GEMINI_MODEL", DEFAULT_MODEL),
            gemini_base_url: optional_env("GEMINI_BASE_URL", DEFAULT_BASE_URL),
            llm_timeout_secs: parse_env_at_least("LLM_TIMEOUT_SECS", 60, 1)?,
            explanation_concurrency: parse_env_at_least("EXPLANATION_CONCURRENCY", 4, 1)?,
            extraction_mode: parse_env("EXTRACTION_MODE", ExtractionMode::Lenient)?,
            max_questions: parse_env("MAX_QUESTIONS", 50)?,
            assessment_utc_offset_minutes: parse_env("ASSESSMENT_UTC_OFFSET_MINUTES", 330)?,
            port: parse_env("PORT", 8080)?,
            rust_log: optional_env("RUST_LOG", "info"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

/// Like `parse_env`, but raises values below `min` to `min`.
fn parse_env_at_least<T>(key: &str, default: T, min: T) -> Result<T>
where
    T: std::str::FromStr + Ord,
    T::Err: std::fmt::Display,
{
    Ok(parse_env(key, default)?.max(min))
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| anyhow::anyhow!("Invalid value for {key}: {e}"))
}
