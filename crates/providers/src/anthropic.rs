//! Anthropic Messages API client.
//!
//! Features:
//! - `x-api-key` header authentication (not Bearer)
//! - `anthropic-version` header
//! - System prompt as a top-level field
//! - Streaming via SSE with `content_block_delta` events, relayed through a
//!   bounded channel with cancellation support
//!
//! Both entry points are total: transport and API failures come back inside
//! the `LlmResponse` or as a terminal `StreamingChunk`, never as an `Err`.

use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use augent_config::ClaudeConfig;
use augent_core::llm::{LlmResponse, LlmService, StreamingChunk, StreamingLlmService};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Buffer size for streaming chunks; the producer blocks on write when the
/// consumer falls this far behind.
const CHANNEL_CAPACITY: usize = 100;

/// Anthropic Messages API backend.
pub struct ClaudeService {
    config: ClaudeConfig,
    client: reqwest::Client,
}

impl ClaudeService {
    pub fn new(config: ClaudeConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()
            .unwrap_or_default();
        Self { config, client }
    }

    /// Combine optional context with the query the way the API expects it:
    /// context first, blank line, then the query.
    fn user_content(query: &str, context: Option<&str>) -> String {
        match context {
            Some(ctx) => format!("{ctx}\n\n{query}"),
            None => query.to_string(),
        }
    }

    fn request_body(
        &self,
        query: &str,
        context: Option<&str>,
        system_prompt: Option<&str>,
        stream: bool,
    ) -> serde_json::Value {
        serde_json::json!({
            "model": self.config.model,
            "messages": [
                {"role": "user", "content": Self::user_content(query, context)}
            ],
            "system": system_prompt.unwrap_or(&self.config.system_prompt),
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "stream": stream,
        })
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.config.base_url.trim_end_matches('/'))
    }

    fn api_key(&self) -> &str {
        self.config.api_key.as_deref().unwrap_or_default()
    }
}

#[async_trait]
impl LlmService for ClaudeService {
    async fn generate(
        &self,
        query: &str,
        context: Option<&str>,
        system_prompt: Option<&str>,
    ) -> LlmResponse {
        let body = self.request_body(query, context, system_prompt, false);

        debug!(model = %self.config.model, "Sending completion request");

        let response = match self
            .client
            .post(self.messages_url())
            .header("x-api-key", self.api_key())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => return LlmResponse::failure(format!("Network error calling Claude API: {e}")),
        };

        let status = response.status().as_u16();
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, "Claude API error");
            return LlmResponse::failure(format!(
                "Error from Claude API: {status}. {error_body}"
            ));
        }

        let api_resp: ApiResponse = match response.json().await {
            Ok(r) => r,
            Err(e) => {
                return LlmResponse::failure(format!("Failed to parse Claude API response: {e}"))
            }
        };

        api_resp.into_llm_response()
    }
}

#[async_trait]
impl StreamingLlmService for ClaudeService {
    async fn generate_streaming(
        &self,
        query: &str,
        context: Option<&str>,
        system_prompt: Option<&str>,
        cancel: CancellationToken,
    ) -> mpsc::Receiver<StreamingChunk> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);

        let body = self.request_body(query, context, system_prompt, true);
        let url = self.messages_url();
        let api_key = self.api_key().to_string();
        let client = self.client.clone();
        let model = self.config.model.clone();

        tokio::spawn(async move {
            debug!(model = %model, "Sending streaming request");

            let response = match client
                .post(&url)
                .header("x-api-key", &api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .header("Content-Type", "application/json")
                .header("Accept", "text/event-stream")
                .json(&body)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    let _ = tx
                        .send(StreamingChunk::error(format!(
                            "Network error calling Claude API: {e}"
                        )))
                        .await;
                    return;
                }
            };

            let status = response.status().as_u16();
            if status != 200 {
                let error_body = response.text().await.unwrap_or_default();
                let _ = tx
                    .send(StreamingChunk::error(format!(
                        "Error from Claude API: {status}. {error_body}"
                    )))
                    .await;
                return;
            }

            let mut byte_stream = response.bytes_stream();
            let mut buffer = String::new();

            loop {
                let chunk_result = tokio::select! {
                    _ = cancel.cancelled() => {
                        let _ = tx
                            .send(StreamingChunk::error(
                                "Response streaming was cancelled or timed out",
                            ))
                            .await;
                        return;
                    }
                    next = byte_stream.next() => next,
                };

                let bytes = match chunk_result {
                    Some(Ok(b)) => b,
                    Some(Err(e)) => {
                        let _ = tx
                            .send(StreamingChunk::error(format!("Stream interrupted: {e}")))
                            .await;
                        return;
                    }
                    // Stream ended without message_stop; still terminate cleanly.
                    None => {
                        let _ = tx.send(StreamingChunk::complete()).await;
                        return;
                    }
                };

                buffer.push_str(&String::from_utf8_lossy(&bytes));

                while let Some(line_end) = buffer.find('\n') {
                    let line = buffer[..line_end].trim_end_matches('\r').to_string();
                    buffer = buffer[line_end + 1..].to_string();

                    if line.is_empty() || line.starts_with(':') {
                        continue;
                    }

                    let Some(data) = line.strip_prefix("data: ") else {
                        continue;
                    };
                    let data = data.trim();
                    if data.is_empty() {
                        continue;
                    }

                    let event: serde_json::Value = match serde_json::from_str(data) {
                        Ok(v) => v,
                        Err(e) => {
                            trace!(error = %e, "Ignoring unparseable Claude SSE line");
                            continue;
                        }
                    };

                    match event["type"].as_str().unwrap_or("") {
                        "content_block_delta" => {
                            if let Some(text) = delta_text(&event) {
                                let mut chunk = StreamingChunk::content(text);
                                chunk
                                    .metadata
                                    .insert("model".into(), serde_json::json!(model));
                                if let Some(index) = event["index"].as_u64() {
                                    chunk
                                        .metadata
                                        .insert("index".into(), serde_json::json!(index));
                                }
                                if tx.send(chunk).await.is_err() {
                                    // Consumer hung up; treat as cancellation.
                                    return;
                                }
                            }
                        }
                        "message_stop" => {
                            let _ = tx.send(StreamingChunk::complete()).await;
                            return;
                        }
                        _ => {}
                    }
                }
            }
        });

        rx
    }
}

/// Pull the text out of a `content_block_delta` event, if it carries any.
fn delta_text(event: &serde_json::Value) -> Option<&str> {
    let delta = event.get("delta")?;
    if delta["type"].as_str() != Some("text_delta") {
        return None;
    }
    delta["text"].as_str().filter(|t| !t.is_empty())
}

// --- Anthropic API response types ---

#[derive(Debug, Deserialize)]
struct ApiResponse {
    id: String,
    model: String,
    content: Vec<ContentBlock>,
    usage: ApiUsage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    input_tokens: u32,
    output_tokens: u32,
}

impl ApiResponse {
    fn into_llm_response(self) -> LlmResponse {
        let content = self
            .content
            .iter()
            .find_map(|block| match block {
                ContentBlock::Text { text } => Some(text.clone()),
                ContentBlock::Other => None,
            })
            .unwrap_or_default();

        let mut response = LlmResponse::ok(content, self.usage.output_tokens);
        response
            .metadata
            .insert("model".into(), serde_json::json!(self.model));
        response
            .metadata
            .insert("id".into(), serde_json::json!(self.id));
        response
            .metadata
            .insert("input_tokens".into(), serde_json::json!(self.usage.input_tokens));
        response
            .metadata
            .insert("output_tokens".into(), serde_json::json!(self.usage.output_tokens));
        response
    }
}
