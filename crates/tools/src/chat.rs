//! Chat tool — tool-augmented conversation.
//!
//! Handles general queries with an LLM that may call back into the other
//! tools. The dialogue loop: a first generation pass with a system prompt
//! enumerating the tool catalogue and the tagged-markup protocol, execution
//! of any `<tool name="X">` requests found in the response, splicing of
//! `<tool_response>` blocks into the transcript, and a second generation
//! pass to produce the clean final answer.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use augent_agent::ToolOrchestrator;
use augent_core::error::ToolError;
use augent_core::llm::LlmService;
use augent_core::tool::{Tool, ToolDescriptor, ToolResult};

use crate::heuristics;
use crate::markup;

const CLEANUP_SYSTEM_PROMPT: &str = "You are a helpful assistant. Your previous response \
    included tool calls and their results. Now provide a clean, final response that \
    incorporates the tool results but DOES NOT include any tool markup tags.";

pub struct ChatTool {
    llm: Arc<dyn LlmService>,
    orchestrator: Arc<ToolOrchestrator>,
}

impl ChatTool {
    pub fn new(llm: Arc<dyn LlmService>, orchestrator: Arc<ToolOrchestrator>) -> Self {
        Self { llm, orchestrator }
    }

    fn build_system_prompt(catalogue: &[ToolDescriptor]) -> String {
        let tool_list = catalogue
            .iter()
            .map(|d| format!("- {}: {}", d.name, d.description))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "You are a helpful AI assistant that can use tools to provide better answers.\n\
             \n\
             You have access to the following tools:\n\
             {tool_list}\n\
             \n\
             When a question would benefit from a tool, request it in this exact format:\n\
             <tool name=\"tool_name\">\n\
             specific query for the tool\n\
             </tool>\n\
             \n\
             The tool's output will be supplied back to you in a <tool_response> block.\n\
             \n\
             Guidelines:\n\
             - Only use a tool when it provides clear value\n\
             - Formulate concise, focused queries for tools\n\
             - For calculations, use the calculator tool rather than doing math yourself\n\
             - For searches, use the search tool\n\
             - For weather queries, use the weather tool\n\
             - Never request the chat or streaming_chat tools\n\
             \n\
             Important: use only ONE tool per response, with the EXACT tool name as listed."
        )
    }

    /// Execute each tagged tool request and splice its response into the
    /// transcript, in textual order.
    async fn process_tool_requests(&self, response: &str) -> (String, bool) {
        let requests = markup::scan(response);
        if requests.is_empty() {
            return (response.to_string(), false);
        }

        let mut transcript = response.to_string();
        for request in &requests {
            info!(tool = %request.name, query = %request.query, "Handling tagged tool request");

            let result = self
                .orchestrator
                .execute_named(&request.name, &request.query, &HashMap::new())
                .await;

            let response_text = if result.success {
                result.result
            } else {
                format!(
                    "Error: {}",
                    result.error_message.unwrap_or_else(|| "unknown error".into())
                )
            };

            transcript = markup::splice_response(&transcript, &request.span, &response_text);
        }

        (transcript, true)
    }
}

#[async_trait]
impl Tool for ChatTool {
    fn name(&self) -> &str {
        "chat"
    }

    fn description(&self) -> &str {
        "Handles complex requests conversationally, calling other tools as needed"
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
            debug!("Trivial query, answering without the model");
            return Ok(ToolResult::ok(heuristics::canned_response(query))
                .with_data("query", serde_json::json!(query))
                .with_data("response_type", serde_json::json!("simple"))
                .with_data("used_llm", serde_json::json!(false))
                .with_data("used_tools", serde_json::json!(false)));
        }

        let system_prompt = Self::build_system_prompt(&self.orchestrator.catalogue());
        let context = parameters.get("context").map(String::as_str);

        let initial = self.llm.generate(query, context, Some(&system_prompt)).await;

        if !initial.success {
            if initial.is_rate_limited() {
                let retry_after_ms = initial.retry_after_ms().unwrap_or(5000);
                return Ok(ToolResult::ok(
                    "I'm currently handling a high volume of requests. Please try again in a moment.",
                )
                .with_data("query", serde_json::json!(query))
                .with_data("response_type", serde_json::json!("rate_limited"))
                .with_data("used_llm", serde_json::json!(false))
                .with_data("used_tools", serde_json::json!(false))
                .with_data("retry_after_ms", serde_json::json!(retry_after_ms)));
            }
            return Ok(ToolResult::failure(format!(
                "Failed to get response from the model: {}",
                initial.error_message.unwrap_or_else(|| "unknown error".into())
            )));
        }

        let mut tokens_used = initial.tokens_used.unwrap_or(0);
        let (transcript, used_tools) = self.process_tool_requests(&initial.content).await;

        let final_answer = if used_tools {
            let followup = format!(
                "Please provide a final response based on the tool results. \
                 Remove all <tool> and <tool_response> tags from your answer.\n\n{transcript}"
            );
            let cleaned = self
                .llm
                .generate(&followup, None, Some(CLEANUP_SYSTEM_PROMPT))
                .await;

            if cleaned.success {
                tokens_used += cleaned.tokens_used.unwrap_or(0);
                cleaned.content
            } else {
                warn!("Final generation pass failed, stripping markup instead");
                markup::strip_markup(&transcript)
            }
        } else {
            transcript
        };

        let model = initial
            .metadata
            .get("model")
            .cloned()
            .unwrap_or_else(|| serde_json::json!("unknown"));

        Ok(ToolResult::ok(final_answer)
            .with_data("query", serde_json::json!(query))
            .with_data("response_type", serde_json::json!("complex"))
            .with_data("used_llm", serde_json::json!(true))
            .with_data("used_tools", serde_json::json!(used_tools))
            .with_data("tokens_used", serde_json::json!(tokens_used))
            .with_data("model", model))
    }
}
