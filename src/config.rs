use std::path::PathBuf;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "DDS Report Builder";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default OpenAI-compatible endpoint for section drafting.
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";

/// Low temperature: repeated drafts of the same notes should read alike.
pub const DEFAULT_TEMPERATURE: f32 = 0.2;
pub const DEFAULT_MAX_TOKENS: u32 = 300;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

pub const ENV_BASE_URL: &str = "DDS_LLM_BASE_URL";
pub const ENV_API_KEY: &str = "DDS_LLM_API_KEY";
pub const ENV_API_KEY_FALLBACK: &str = "OPENAI_API_KEY";
pub const ENV_MODEL: &str = "DDS_LLM_MODEL";
pub const ENV_TEMPERATURE: &str = "DDS_LLM_TEMPERATURE";
pub const ENV_MAX_TOKENS: &str = "DDS_LLM_MAX_TOKENS";

/// Configured temperatures are clamped into this range.
pub const MAX_TEMPERATURE: f32 = 1.0;

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "info,dds_report=debug"
}

/// Get the application data directory.
/// ~/DDSReports/ when a home directory is known, else the working directory.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join("DDSReports"))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get the directory generated reports are written to.
pub fn exports_dir() -> PathBuf {
    app_data_dir().join("exports")
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("No API credential configured (set DDS_LLM_API_KEY or OPENAI_API_KEY)")]
    MissingApiKey,
}

/// Backend settings for the section drafting service.
#[derive(Debug, Clone)]
pub struct DraftingConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub connect_timeout_secs: u64,
}

impl DraftingConfig {
    /// Load from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup (environment, secrets store, test map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = non_empty(ENV_API_KEY)
            .or_else(|| non_empty(ENV_API_KEY_FALLBACK))
            .ok_or(ConfigError::MissingApiKey)?;

        let temperature: f32 =
            parse_or_default(ENV_TEMPERATURE, non_empty(ENV_TEMPERATURE), DEFAULT_TEMPERATURE);
        let temperature = if temperature.is_finite() {
            temperature.clamp(0.0, MAX_TEMPERATURE)
        } else {
            DEFAULT_TEMPERATURE
        };
        // Narratives are one paragraph; never allow more than the default budget.
        let max_tokens = parse_or_default(ENV_MAX_TOKENS, non_empty(ENV_MAX_TOKENS), DEFAULT_MAX_TOKENS)
            .clamp(1, DEFAULT_MAX_TOKENS);

        Ok(Self {
            base_url: non_empty(ENV_BASE_URL).unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string()),
            api_key,
            model: non_empty(ENV_MODEL).unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            temperature,
            max_tokens,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        })
    }
}

fn parse_or_default<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    let Some(raw) = raw else {
        return default;
    };
    match raw.trim().parse::<T>() {
        Ok(value) => value,
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring unparseable drafting setting");
            default
        }
    }
}
