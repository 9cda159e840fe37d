//! Error types for the Augent domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.
//!
//! Note that most public operations in this system are *total*: they return a
//! structured success/failure value (`ToolResult`, `LlmResponse`,
//! `AgentResponse`) instead of propagating errors. The types here exist for
//! the seams where an error still needs a typed representation before it is
//! converted at a component boundary.

use thiserror::Error;

/// The top-level error type for all Augent operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- LLM errors ---
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    // --- NLP errors ---
    #[error("NLP error: {0}")]
    Nlp(#[from] NlpError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name} — {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}

#[derive(Debug, Clone, Error)]
pub enum LlmError {
    #[error("API request failed: {message} (status: {status_code})")]
    Api { status_code: u16, message: String },

    #[error("Rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Clone, Error)]
pub enum NlpError {
    #[error("Intent classification failed: {0}")]
    Classification(String),

    #[error("Entity extraction failed: {0}")]
    Extraction(String),

    #[error("Sentiment analysis failed: {0}")]
    Sentiment(String),

    #[error("NLP service unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_error_displays_correctly() {
        let err = Error::Tool(ToolError::ExecutionFailed {
            tool_name: "weather".into(),
            reason: "no location given".into(),
        });
        assert!(err.to_string().contains("weather"));
        assert!(err.to_string().contains("no location given"));
    }

    #[test]
    fn llm_error_displays_correctly() {
        let err = Error::Llm(LlmError::Api {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn not_found_carries_name() {
        let err = ToolError::NotFound("frobnicator".into());
        assert!(err.to_string().contains("frobnicator"));
    }
}
