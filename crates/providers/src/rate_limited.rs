//! Rate-limited decorator over any LLM backend.
//!
//! Wraps an inner service and gates every call through both limiter
//! dimensions: one request permit and one token permit. Denials never reach
//! the backend; they come back as a structured failure carrying the
//! `rate_limited` metadata flag and a suggested retry delay.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use augent_core::limiter::{RateLimiter, RESOURCE_REQUESTS, RESOURCE_TOKENS};
use augent_core::llm::{
    LlmResponse, LlmService, StreamingChunk, StreamingLlmService, META_RATE_LIMITED,
    META_RETRY_AFTER_MS,
};

const RATE_LIMITED_MESSAGE: &str =
    "I'm currently handling a lot of requests. Please try again in a moment.";

/// Gates an inner LLM service behind a keyed admission controller.
pub struct RateLimitedLlm<S> {
    inner: S,
    limiter: Arc<dyn RateLimiter>,
}

impl<S> RateLimitedLlm<S> {
    pub fn new(inner: S, limiter: Arc<dyn RateLimiter>) -> Self {
        Self { inner, limiter }
    }

    /// Acquire both permits, or report the denied dimension and how long
    /// until it would admit again.
    async fn admit(&self) -> Result<(), (&'static str, u64)> {
        if !self.limiter.try_acquire(RESOURCE_REQUESTS).await {
            let wait = self.limiter.time_until_next_permitted(RESOURCE_REQUESTS).await;
            return Err((RESOURCE_REQUESTS, wait.as_millis() as u64));
        }
        if !self.limiter.try_acquire(RESOURCE_TOKENS).await {
            let wait = self.limiter.time_until_next_permitted(RESOURCE_TOKENS).await;
            return Err((RESOURCE_TOKENS, wait.as_millis() as u64));
        }
        Ok(())
    }

    fn denial_response(resource: &str, retry_after_ms: u64) -> LlmResponse {
        warn!(resource, retry_after_ms, "Rate limit denial");
        let mut response = LlmResponse::failure(RATE_LIMITED_MESSAGE);
        response
            .metadata
            .insert(META_RATE_LIMITED.into(), serde_json::json!(true));
        response
            .metadata
            .insert(META_RETRY_AFTER_MS.into(), serde_json::json!(retry_after_ms));
        response
    }
}

#[async_trait]
impl<S: LlmService> LlmService for RateLimitedLlm<S> {
    async fn generate(
        &self,
        query: &str,
        context: Option<&str>,
        system_prompt: Option<&str>,
    ) -> LlmResponse {
        if let Err((resource, retry_after_ms)) = self.admit().await {
            return Self::denial_response(resource, retry_after_ms);
        }

        let response = self.inner.generate(query, context, system_prompt).await;

        if response.success {
            if let Some(tokens) = response.tokens_used {
                debug!(tokens, "Reconciling token usage");
                self.limiter
                    .record_successful_request(RESOURCE_TOKENS, tokens)
                    .await;
            }
        }

        response
    }
}

#[async_trait]
impl<S: StreamingLlmService> StreamingLlmService for RateLimitedLlm<S> {
    async fn generate_streaming(
        &self,
        query: &str,
        context: Option<&str>,
        system_prompt: Option<&str>,
        cancel: CancellationToken,
    ) -> mpsc::Receiver<StreamingChunk> {
        if let Err((resource, retry_after_ms)) = self.admit().await {
            warn!(resource, retry_after_ms, "Rate limit denial on streaming path");
            let (tx, rx) = mpsc::channel(1);
            let mut chunk = StreamingChunk::error(RATE_LIMITED_MESSAGE);
            chunk
                .metadata
                .insert(META_RATE_LIMITED.into(), serde_json::json!(true));
            chunk
                .metadata
                .insert(META_RETRY_AFTER_MS.into(), serde_json::json!(retry_after_ms));
            let _ = tx.send(chunk).await;
            return rx;
        }

        // Streamed usage is not reconciled: the byte stream does not carry a
        // reliable total, so only the admission debit applies.
        self.inner
            .generate_streaming(query, context, system_prompt, cancel)
            .await
    }
}
