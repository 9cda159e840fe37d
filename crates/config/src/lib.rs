//! Configuration loading and validation for Augent.
//!
//! Loads configuration from a TOML file with environment variable overrides.
//! Validates all settings at load time so the rest of the system can trust
//! the values it is handed.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// The root configuration structure.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Claude API settings
    #[serde(default)]
    pub claude: ClaudeConfig,

    /// Rate limiter settings
    #[serde(default)]
    pub limiter: LimiterConfig,

    /// Chat tool settings
    #[serde(default)]
    pub chat: ChatConfig,

    /// Tool selection and enrichment thresholds
    #[serde(default)]
    pub selection: SelectionConfig,
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("claude", &self.claude)
            .field("limiter", &self.limiter)
            .field("chat", &self.chat)
            .field("selection", &self.selection)
            .finish()
    }
}

/// Claude API client configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct ClaudeConfig {
    /// API key; overridable via AUGENT_API_KEY
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Maximum tokens per response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Default system prompt used when a caller supplies none
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// HTTP request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ClaudeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            system_prompt: default_system_prompt(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for ClaudeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaudeConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

fn default_base_url() -> String {
    "https://api.anthropic.com".into()
}
fn default_model() -> String {
    "claude-sonnet-4-20250514".into()
}
fn default_max_tokens() -> u32 {
    1024
}
fn default_temperature() -> f64 {
    0.7
}
fn default_system_prompt() -> String {
    "You are a helpful AI assistant integrated into an agent system. \
     Provide concise, accurate, and helpful responses to the user's queries. \
     Keep responses under 3 paragraphs unless specifically asked for more detail."
        .into()
}
fn default_request_timeout_secs() -> u64 {
    120
}

/// Token-bucket rate limiter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimiterConfig {
    /// Maximum requests per minute
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u32,

    /// Maximum tokens per minute (input and output combined)
    #[serde(default = "default_tokens_per_minute")]
    pub tokens_per_minute: u32,

    /// Buffer percentage (0-100) to stay under the provider limit
    #[serde(default = "default_buffer_percentage")]
    pub buffer_percentage: u32,

    /// Idle minutes after which a bucket is evicted
    #[serde(default = "default_bucket_expiration_minutes")]
    pub bucket_expiration_minutes: u64,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: default_requests_per_minute(),
            tokens_per_minute: default_tokens_per_minute(),
            buffer_percentage: default_buffer_percentage(),
            bucket_expiration_minutes: default_bucket_expiration_minutes(),
        }
    }
}

fn default_requests_per_minute() -> u32 {
    10
}
fn default_tokens_per_minute() -> u32 {
    10_000
}
fn default_buffer_percentage() -> u32 {
    10
}
fn default_bucket_expiration_minutes() -> u64 {
    60
}

/// Chat tool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Overall timeout for a streaming response, in seconds
    #[serde(default = "default_response_timeout_secs")]
    pub response_timeout_secs: u64,

    /// Stream every non-trivial query on the streaming path, not only the
    /// long-form ones the heuristics pick
    #[serde(default)]
    pub default_to_streaming: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            response_timeout_secs: default_response_timeout_secs(),
            default_to_streaming: false,
        }
    }
}

fn default_response_timeout_secs() -> u64 {
    60
}

/// Tool selection and query enrichment thresholds.
///
/// These are tuning knobs, not load-bearing correctness logic; the deterministic
/// selection path does not depend on them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Minimum intent-classifier confidence to accept its recommended tool
    #[serde(default = "default_intent_confidence_threshold")]
    pub intent_confidence_threshold: f64,

    /// Minimum sentiment score before enrichment adds a sentiment parameter
    #[serde(default = "default_sentiment_threshold")]
    pub sentiment_threshold: f64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            intent_confidence_threshold: default_intent_confidence_threshold(),
            sentiment_threshold: default_sentiment_threshold(),
        }
    }
}

fn default_intent_confidence_threshold() -> f64 {
    0.65
}
fn default_sentiment_threshold() -> f64 {
    0.7
}

impl AppConfig {
    /// Load configuration from a TOML file, apply environment overrides, and
    /// validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut config: AppConfig = toml::from_str(&raw)?;
        config.apply_env_overrides();
        config.validate()?;
        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Defaults plus environment overrides, for running without a config file.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = AppConfig::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("AUGENT_API_KEY") {
            if !key.is_empty() {
                self.claude.api_key = Some(key);
            }
        }
        if let Ok(model) = std::env::var("AUGENT_MODEL") {
            if !model.is_empty() {
                self.claude.model = model;
            }
        }
        if let Ok(url) = std::env::var("AUGENT_BASE_URL") {
            if !url.is_empty() {
                self.claude.base_url = url;
            }
        }
    }

    /// Check invariants the rest of the system relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.limiter.buffer_percentage > 100 {
            return Err(ConfigError::Invalid(
                "limiter.buffer_percentage must be between 0 and 100".into(),
            ));
        }
        if self.limiter.requests_per_minute == 0 {
            return Err(ConfigError::Invalid(
                "limiter.requests_per_minute must be positive".into(),
            ));
        }
        if self.limiter.tokens_per_minute == 0 {
            return Err(ConfigError::Invalid(
                "limiter.tokens_per_minute must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.selection.intent_confidence_threshold) {
            return Err(ConfigError::Invalid(
                "selection.intent_confidence_threshold must be in [0, 1]".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.selection.sentiment_threshold) {
            return Err(ConfigError::Invalid(
                "selection.sentiment_threshold must be in [0, 1]".into(),
            ));
        }
        if self.chat.response_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "chat.response_timeout_secs must be positive".into(),
            ));
        }
        Ok(())
    }
}
