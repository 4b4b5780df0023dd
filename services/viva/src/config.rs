//! Application configuration.
//!
//! Centralizes the settings for the viva service, loaded from environment
//! variables into a single struct passed through the application.

use std::env;
use std::time::Duration;
use tracing::Level;

/// Holds all configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub chat_model: String,
    pub question_count: usize,
    pub answer_timeout: Duration,
    pub log_level: Level,
}

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid log level provided for RUST_LOG: {0}")]
    InvalidLogLevel(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    // *   `OPENAI_API_KEY`: Secret key for the question/evaluation API. Required.
    // *   `CHAT_MODEL`: (Optional) Model used by the evaluator and question source. Defaults to "gpt-4o".
    // *   `VIVA_QUESTION_COUNT`: (Optional) Questions fetched per session. Defaults to 8.
    // *   `VIVA_ANSWER_TIMEOUT_SECS`: (Optional) Seconds to wait for a spoken answer. Defaults to 90.
    // *   `RUST_LOG`: (Optional) The logging level. Defaults to "INFO".
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file. Useful for local development, ignored if absent.
        dotenvy::dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    fn from_vars(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let openai_api_key = get("OPENAI_API_KEY")
            .ok_or_else(|| ConfigError::MissingVar("OPENAI_API_KEY".to_string()))?;

        let chat_model = get("CHAT_MODEL").unwrap_or_else(|| "gpt-4o".to_string());

        let question_count = match get("VIVA_QUESTION_COUNT") {
            Some(raw) => raw
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::InvalidValue("VIVA_QUESTION_COUNT", raw))?,
            None => 8,
        };

        let answer_timeout = match get("VIVA_ANSWER_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw
                    .parse::<u64>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or(ConfigError::InvalidValue("VIVA_ANSWER_TIMEOUT_SECS", raw))?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(90),
        };

        let log_level_str = get("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str
            .parse::<Level>()
            .map_err(|_| ConfigError::InvalidLogLevel(log_level_str))?;

        Ok(Self {
            openai_api_key,
            chat_model,
            question_count,
            answer_timeout,
            log_level,
        })
    }
}
