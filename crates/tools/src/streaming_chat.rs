//! Streaming chat tool — incremental responses for long-form queries.
//!
//! The streaming path forwards the provider's bounded chunk stream through an
//! unbounded relay channel that closes the instant it forwards a terminal
//! chunk. The whole operation is bounded by a configurable timeout; expiry
//! (or caller cancellation) produces exactly one final cancellation chunk.
//! The non-streaming path mirrors the chat tool minus tool augmentation.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use augent_config::ChatConfig;
use augent_core::error::ToolError;
use augent_core::llm::{LlmService, StreamingChunk, StreamingLlmService};
use augent_core::tool::{StreamingTool, Tool, ToolResult};

use crate::heuristics;

const CANCELLED_MESSAGE: &str = "Response streaming was cancelled or timed out";

pub struct StreamingChatTool {
    llm: Arc<dyn StreamingLlmService>,
    config: ChatConfig,
}

impl StreamingChatTool {
    pub fn new(llm: Arc<dyn StreamingLlmService>, config: ChatConfig) -> Self {
        Self { llm, config }
    }

    fn wants_streaming(&self, query: &str, parameters: &HashMap<String, String>) -> bool {
        let requested = parameters
            .get("use_streaming")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        requested
            || heuristics::is_long_form_query(query)
            || self.config.default_to_streaming
    }

    /// Non-streaming generation shared by both entry points.
    async fn generate_plain(&self, query: &str, context: Option<&str>) -> ToolResult {
        let response = self.llm.generate(query, context, None).await;

        if !response.success {
            if response.is_rate_limited() {
                let retry_after_ms = response.retry_after_ms().unwrap_or(5000);
                return ToolResult::ok(
                    "I'm currently handling a high volume of requests. Please try again in a moment.",
                )
                .with_data("query", serde_json::json!(query))
                .with_data("response_type", serde_json::json!("rate_limited"))
                .with_data("used_llm", serde_json::json!(false))
                .with_data("streaming", serde_json::json!(false))
                .with_data("retry_after_ms", serde_json::json!(retry_after_ms));
            }
            return ToolResult::failure(format!(
                "Failed to get response from the model: {}",
                response.error_message.unwrap_or_else(|| "unknown error".into())
            ));
        }

        let model = response
            .metadata
            .get("model")
            .cloned()
            .unwrap_or_else(|| serde_json::json!("unknown"));

        ToolResult::ok(response.content)
            .with_data("query", serde_json::json!(query))
            .with_data("response_type", serde_json::json!("complex"))
            .with_data("used_llm", serde_json::json!(true))
            .with_data("streaming", serde_json::json!(false))
            .with_data("tokens_used", serde_json::json!(response.tokens_used.unwrap_or(0)))
            .with_data("model", model)
    }
}

#[async_trait]
impl Tool for StreamingChatTool {
    fn name(&self) -> &str {
        "streaming_chat"
    }

    fn description(&self) -> &str {
        "Engages in conversation with streaming support for long responses"
    }

    fn can_handle(&self, query: &str) -> bool {
        heuristics::accepts_conversation(query)
    }

    fn is_conversational(&self) -> bool {
        true
    }

    async fn execute(
        &self,
        query: &str,
        parameters: &HashMap<String, String>,
    ) -> Result<ToolResult, ToolError> {
        if heuristics::is_trivial_query(query) {
            return Ok(ToolResult::ok(heuristics::canned_response(query))
                .with_data("query", serde_json::json!(query))
                .with_data("response_type", serde_json::json!("simple"))
                .with_data("used_llm", serde_json::json!(false))
                .with_data("streaming", serde_json::json!(false)));
        }

        let context = parameters.get("context").map(String::as_str);
        Ok(self.generate_plain(query, context).await)
    }
}

#[async_trait]
impl StreamingTool for StreamingChatTool {
    async fn execute_streaming(
        &self,
        query: &str,
        parameters: &HashMap<String, String>,
        cancel: CancellationToken,
    ) -> mpsc::UnboundedReceiver<StreamingChunk> {
        let (tx, rx) = mpsc::unbounded_channel();

        if heuristics::is_trivial_query(query) {
            let _ = tx.send(StreamingChunk::content(heuristics::canned_response(query)));
            let _ = tx.send(StreamingChunk::complete());
            return rx;
        }

        let context = parameters.get("context").map(String::as_str);

        if !self.wants_streaming(query, parameters) {
            debug!("Short-form query, answering without streaming");
            let result = self.generate_plain(query, context).await;
            if result.success {
                let _ = tx.send(StreamingChunk::content(result.result));
                let _ = tx.send(StreamingChunk::complete());
            } else {
                let _ = tx.send(StreamingChunk::error(
                    result.error_message.unwrap_or_else(|| "unknown error".into()),
                ));
            }
            return rx;
        }

        // The child token lets the relay stop the provider-side producer when
        // the overall timeout fires.
        let producer_cancel = cancel.child_token();
        let mut inner = self
            .llm
            .generate_streaming(query, context, None, producer_cancel.clone())
            .await;

        let timeout = Duration::from_secs(self.config.response_timeout_secs);
        tokio::spawn(async move {
            let deadline = tokio::time::sleep(timeout);
            tokio::pin!(deadline);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("Streaming relay cancelled by caller");
                        producer_cancel.cancel();
                        let _ = tx.send(StreamingChunk::error(CANCELLED_MESSAGE));
                        return;
                    }
                    _ = &mut deadline => {
                        warn!("Streaming response timed out");
                        producer_cancel.cancel();
                        let _ = tx.send(StreamingChunk::error(CANCELLED_MESSAGE));
                        return;
                    }
                    chunk = inner.recv() => {
                        match chunk {
                            Some(chunk) => {
                                let terminal = chunk.is_terminal();
                                if tx.send(chunk).is_err() {
                                    producer_cancel.cancel();
                                    return;
                                }
                                if terminal {
                                    return;
                                }
                            }
                            // Producer hung up without a terminal chunk.
                            None => {
                                let _ = tx.send(StreamingChunk::complete());
                                return;
                            }
                        }
                    }
                }
            }
        });

        rx
    }
}
