use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::generation::ats_score::MatchMode;
use crate::generation::optimizer::check_target_score;

/// Groq's OpenAI-compatible chat completions endpoint.
pub const DEFAULT_COMPLETION_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_COMPLETION_MODEL: &str = "llama3-8b-8192";

/// Application configuration loaded from environment variables.
/// The API key is only required by commands that call the completion service.
#[derive(Debug, Clone)]
pub struct Config {
    pub completion_api_key: Option<String>,
    pub completion_api_url: String,
    pub completion_model: String,
    pub completion_max_tokens: u32,
    pub http_timeout: Duration,
    pub backoff_max_attempts: u32,
    pub backoff_base_delay: Duration,
    pub target_score: f64,
    pub optimize_max_attempts: u32,
    pub match_mode: MatchMode,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            completion_api_key: std::env::var("COMPLETION_API_KEY").ok(),
            completion_api_url: env_or("COMPLETION_API_URL", DEFAULT_COMPLETION_API_URL),
            completion_model: env_or("COMPLETION_MODEL", DEFAULT_COMPLETION_MODEL),
            completion_max_tokens: parse_env("COMPLETION_MAX_TOKENS", 4096)?,
            http_timeout: Duration::from_secs(parse_env("HTTP_TIMEOUT_SECS", 120)?),
            backoff_max_attempts: parse_env("BACKOFF_MAX_ATTEMPTS", 5)?,
            backoff_base_delay: Duration::from_millis(parse_env("BACKOFF_BASE_DELAY_MS", 1000)?),
            target_score: check_target_score(parse_env("ATS_TARGET_SCORE", 80.0)?)
                .context("ATS_TARGET_SCORE is out of range")?,
            optimize_max_attempts: parse_env("OPTIMIZE_MAX_ATTEMPTS", 3)?,
            match_mode: parse_env("ATS_MATCH_MODE", MatchMode::Substring)?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }

    pub fn api_key(&self) -> Result<&str> {
        self.completion_api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .context("Required environment variable 'COMPLETION_API_KEY' is not set")
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{key} has an invalid value '{raw}': {e}")),
        Err(_) => Ok(default),
    }
}
