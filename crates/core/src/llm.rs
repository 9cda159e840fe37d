//! LLM service traits — the abstraction over model text backends.
//!
//! An `LlmService` knows how to send a query (plus optional context and
//! system prompt) to a model and return a structured response. The streaming
//! variant returns a live channel of incremental chunks instead.
//!
//! Both operations are *total*: transport and API failures surface inside the
//! returned `LlmResponse` / terminal `StreamingChunk`, never as panics or
//! propagated errors.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Metadata key set on rate-limited responses.
pub const META_RATE_LIMITED: &str = "rate_limited";
/// Metadata key carrying the suggested retry delay in milliseconds.
pub const META_RETRY_AFTER_MS: &str = "retry_after_ms";

/// A complete (non-streaming) response from a model backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    /// The generated text
    #[serde(default)]
    pub content: String,

    /// Whether the call succeeded
    pub success: bool,

    /// Human-readable error when `success` is false
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Model-reported token usage for this call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u32>,

    /// Backend-specific metadata (model name, usage breakdown, rate-limit info)
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl LlmResponse {
    /// A successful response with content and token usage.
    pub fn ok(content: impl Into<String>, tokens_used: u32) -> Self {
        Self {
            content: content.into(),
            success: true,
            error_message: None,
            tokens_used: Some(tokens_used),
            metadata: serde_json::Map::new(),
        }
    }

    /// A failure response carrying an error message.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            content: String::new(),
            success: false,
            error_message: Some(error.into()),
            tokens_used: None,
            metadata: serde_json::Map::new(),
        }
    }

    /// Whether this response is an admission denial from the rate limiter.
    pub fn is_rate_limited(&self) -> bool {
        self.metadata
            .get(META_RATE_LIMITED)
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    /// Suggested retry delay in milliseconds, if rate limited.
    pub fn retry_after_ms(&self) -> Option<u64> {
        self.metadata.get(META_RETRY_AFTER_MS).and_then(|v| v.as_u64())
    }
}

/// One incremental unit of streamed model output.
///
/// A chunk sequence is terminated exactly once, by either an
/// `is_complete = true` chunk or an `error`-bearing chunk. No chunk is ever
/// emitted after the terminal one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamingChunk {
    /// Partial text content (may be empty on the terminal chunk)
    #[serde(default)]
    pub content: String,

    /// Whether this is the final chunk in the sequence
    #[serde(default)]
    pub is_complete: bool,

    /// Error description; an error chunk is always terminal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Chunk-level metadata (model, event type, block index)
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl StreamingChunk {
    /// An ordinary content delta.
    pub fn content(text: impl Into<String>) -> Self {
        Self {
            content: text.into(),
            is_complete: false,
            error: None,
            metadata: serde_json::Map::new(),
        }
    }

    /// The clean end-of-stream marker.
    pub fn complete() -> Self {
        Self {
            content: String::new(),
            is_complete: true,
            error: None,
            metadata: serde_json::Map::new(),
        }
    }

    /// A terminal error chunk.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: String::new(),
            is_complete: true,
            error: Some(message.into()),
            metadata: serde_json::Map::new(),
        }
    }

    /// Whether this chunk terminates the sequence.
    pub fn is_terminal(&self) -> bool {
        self.is_complete || self.error.is_some()
    }
}

/// The core LLM service trait.
#[async_trait]
pub trait LlmService: Send + Sync {
    /// Send a query and get a complete response.
    ///
    /// `context` is prepended to the query; `system_prompt` overrides the
    /// backend's default system prompt.
    async fn generate(
        &self,
        query: &str,
        context: Option<&str>,
        system_prompt: Option<&str>,
    ) -> LlmResponse;
}

/// An LLM service that additionally supports incremental streaming output.
#[async_trait]
pub trait StreamingLlmService: LlmService {
    /// Send a query and get a live channel of response chunks.
    ///
    /// The returned receiver is fed by a background producer writing into a
    /// bounded channel; the producer observes `cancel` at every write
    /// boundary and always terminates the sequence with exactly one terminal
    /// chunk before closing the channel.
    async fn generate_streaming(
        &self,
        query: &str,
        context: Option<&str>,
        system_prompt: Option<&str>,
        cancel: CancellationToken,
    ) -> mpsc::Receiver<StreamingChunk>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_response() {
        let resp = LlmResponse::ok("Hello!", 12);
        assert!(resp.success);
        assert_eq!(resp.content, "Hello!");
        assert_eq!(resp.tokens_used, Some(12));
        assert!(!resp.is_rate_limited());
    }

    #[test]
    fn rate_limited_metadata_roundtrip() {
        let mut resp = LlmResponse::failure("busy");
        resp.metadata
            .insert(META_RATE_LIMITED.into(), serde_json::json!(true));
        resp.metadata
            .insert(META_RETRY_AFTER_MS.into(), serde_json::json!(2500));
        assert!(resp.is_rate_limited());
        assert_eq!(resp.retry_after_ms(), Some(2500));
    }

    #[test]
    fn chunk_terminality() {
        assert!(!StreamingChunk::content("hi").is_terminal());
        assert!(StreamingChunk::complete().is_terminal());
        assert!(StreamingChunk::error("boom").is_terminal());
    }

    #[test]
    fn chunk_serialization() {
        let chunk = StreamingChunk::content("partial");
        let json = serde_json::to_string(&chunk).unwrap();
        assert!(json.contains("partial"));
        let back: StreamingChunk = serde_json::from_str(&json).unwrap();
        assert_eq!(back.content, "partial");
        assert!(!back.is_complete);
    }
}
