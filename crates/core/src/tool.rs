//! Tool trait — the abstraction over agent capabilities.
//!
//! Tools are what give the agent the ability to act on a query: evaluate an
//! expression, look up the weather, run a search, or hold a conversation.
//! Conversational tools are flagged so that dispatch layers can keep them as
//! low-priority fallbacks and block them from recursive self-invocation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::ToolError;
use crate::llm::StreamingChunk;

/// An immutable name/description snapshot of a registered tool.
///
/// This is what gets advertised to callers and enumerated into the system
/// prompt for tool-augmented generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Unique tool name (case-insensitive lookup key)
    pub name: String,

    /// Description of what the tool does
    pub description: String,
}

/// The result of a tool execution.
///
/// Produced once per invocation; ownership passes to the caller. Failures are
/// carried in `error_message`, never thrown across a component boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the tool executed successfully
    pub success: bool,

    /// The output text
    #[serde(default)]
    pub result: String,

    /// Human-readable error when `success` is false
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Structured auxiliary data (insertion-ordered)
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub data: serde_json::Map<String, serde_json::Value>,
}

impl ToolResult {
    /// A successful result with output text and no auxiliary data.
    pub fn ok(result: impl Into<String>) -> Self {
        Self {
            success: true,
            result: result.into(),
            error_message: None,
            data: serde_json::Map::new(),
        }
    }

    /// A failure result carrying an error message.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            result: String::new(),
            error_message: Some(error.into()),
            data: serde_json::Map::new(),
        }
    }

    /// Attach a data entry, builder-style.
    pub fn with_data(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }
}

/// Per-request query context handed to tool dispatch.
///
/// Upstream enrichment (entity extraction, sentiment) may copy and augment
/// the parameter map before dispatch; the augmented copy is discarded once
/// the request completes.
#[derive(Debug, Clone, Default)]
pub struct QueryContext {
    /// The raw user query
    pub query: String,

    /// Caller-supplied and enrichment-derived key/value parameters
    pub parameters: HashMap<String, String>,
}

impl QueryContext {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            parameters: HashMap::new(),
        }
    }

    pub fn with_parameters(query: impl Into<String>, parameters: HashMap<String, String>) -> Self {
        Self {
            query: query.into(),
            parameters,
        }
    }

    /// Insert a parameter only if the key is not already present.
    /// Caller-supplied values always win over enrichment.
    pub fn add_if_absent(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.parameters.entry(key.into()).or_insert_with(|| value.into());
    }
}

/// The core Tool trait.
///
/// Each capability (calculator, weather, search, chat, streaming chat)
/// implements this trait. Tools are registered in the `ToolRegistry` and
/// dispatched by the orchestrator.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "calculator", "weather").
    fn name(&self) -> &str;

    /// A description of what this tool does (advertised to the LLM).
    fn description(&self) -> &str;

    /// Fast, synchronous heuristic: can this tool handle the query?
    fn can_handle(&self, query: &str) -> bool;

    /// Whether this tool is an open-ended dialogue tool.
    ///
    /// Conversational tools are selected only as a fallback and are
    /// denylisted from orchestrated dispatch to prevent recursion.
    fn is_conversational(&self) -> bool {
        false
    }

    /// Execute the tool against a query with caller-supplied parameters.
    ///
    /// Implementations should prefer returning a failure `ToolResult` for
    /// domain-level problems; an `Err` is reserved for conditions the tool
    /// cannot express as a result and is converted into a failure result at
    /// the orchestrator boundary.
    async fn execute(
        &self,
        query: &str,
        parameters: &HashMap<String, String>,
    ) -> std::result::Result<ToolResult, ToolError>;

    /// Build the advertised descriptor for this tool.
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name().to_string(),
            description: self.description().to_string(),
        }
    }
}

/// A tool that can additionally stream its response incrementally.
///
/// The returned receiver follows the same contract as
/// `StreamingLlmService::generate_streaming`: chunks arrive in emission order
/// and the sequence is terminated exactly once. The relay channel is
/// unbounded so a slow consumer can never stall the producer side.
#[async_trait]
pub trait StreamingTool: Tool {
    async fn execute_streaming(
        &self,
        query: &str,
        parameters: &HashMap<String, String>,
        cancel: CancellationToken,
    ) -> mpsc::UnboundedReceiver<StreamingChunk>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echoes back the input"
        }
        fn can_handle(&self, query: &str) -> bool {
            query.starts_with("echo")
        }
        async fn execute(
            &self,
            query: &str,
            _parameters: &HashMap<String, String>,
        ) -> std::result::Result<ToolResult, ToolError> {
            Ok(ToolResult::ok(query))
        }
    }

    #[tokio::test]
    async fn execute_returns_result() {
        let tool = EchoTool;
        let result = tool.execute("echo hello", &HashMap::new()).await.unwrap();
        assert!(result.success);
        assert_eq!(result.result, "echo hello");
        assert!(result.error_message.is_none());
    }

    #[test]
    fn descriptor_reflects_tool() {
        let desc = EchoTool.descriptor();
        assert_eq!(desc.name, "echo");
        assert_eq!(desc.description, "Echoes back the input");
    }

    #[test]
    fn failure_result_carries_message() {
        let result = ToolResult::failure("boom");
        assert!(!result.success);
        assert_eq!(result.error_message.as_deref(), Some("boom"));
    }

    #[test]
    fn with_data_preserves_insertion_order() {
        let result = ToolResult::ok("x")
            .with_data("first", serde_json::json!(1))
            .with_data("second", serde_json::json!(2));
        let keys: Vec<_> = result.data.keys().collect();
        assert_eq!(keys, vec!["first", "second"]);
    }

    #[test]
    fn context_add_if_absent_keeps_caller_value() {
        let mut ctx = QueryContext::new("hi");
        ctx.parameters.insert("location".into(), "Oslo".into());
        ctx.add_if_absent("location", "Paris");
        ctx.add_if_absent("units", "metric");
        assert_eq!(ctx.parameters["location"], "Oslo");
        assert_eq!(ctx.parameters["units"], "metric");
    }

    #[test]
    fn conversational_defaults_to_false() {
        assert!(!EchoTool.is_conversational());
    }
}
