//! Tool orchestration — named dispatch with a recursion guard.
//!
//! The orchestrator sits between the conversational tools and the registry.
//! Every operation is total: unknown names, refused tools, and internal
//! errors all come back as failure `ToolResult`s with diagnostic data, never
//! as propagated errors.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use augent_core::tool::{ToolDescriptor, ToolResult};

use crate::registry::ToolRegistry;

/// Conversational tool names refused by orchestrated dispatch.
///
/// The chat tools call back into the orchestrator to satisfy tagged tool
/// requests; letting them dispatch to themselves would recurse without bound.
pub const DEFAULT_DENYLIST: &[&str] = &["chat", "streaming_chat"];

/// Dispatches tool executions against a registry.
pub struct ToolOrchestrator {
    registry: Arc<ToolRegistry>,
    denylist: Vec<String>,
}

impl ToolOrchestrator {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            denylist: DEFAULT_DENYLIST.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Replace the conversational denylist.
    pub fn with_denylist(mut self, denylist: Vec<String>) -> Self {
        self.denylist = denylist;
        self
    }

    fn is_denied(&self, name: &str) -> bool {
        self.denylist.iter().any(|d| d.eq_ignore_ascii_case(name))
    }

    /// Execute a tool by name.
    ///
    /// An unknown name produces a failure result listing the currently
    /// available tools; a tool `Err` is converted into a failure result.
    pub async fn execute_named(
        &self,
        tool_name: &str,
        query: &str,
        parameters: &HashMap<String, String>,
    ) -> ToolResult {
        let Some(tool) = self.registry.resolve(tool_name) else {
            warn!(tool = tool_name, "Requested tool not found");
            return ToolResult::failure(format!("Tool '{tool_name}' not found"))
                .with_data("available_tools", serde_json::json!(self.registry.names()));
        };

        debug!(tool = tool.name(), "Executing tool");
        match tool.execute(query, parameters).await {
            Ok(result) => result,
            Err(e) => {
                warn!(tool = tool.name(), error = %e, "Tool execution failed");
                ToolResult::failure(e.to_string())
            }
        }
    }

    /// Select the best tool for the query and execute it.
    ///
    /// A selected conversational tool is refused instead of executed; the
    /// caller already *is* the conversation.
    pub async fn execute_best(
        &self,
        query: &str,
        parameters: &HashMap<String, String>,
    ) -> ToolResult {
        let Some(tool) = self.registry.select_best_async(query).await else {
            return ToolResult::failure("No tools are registered");
        };

        if self.is_denied(tool.name()) {
            debug!(tool = tool.name(), "Refusing conversational tool dispatch");
            return ToolResult::failure(format!(
                "Tool '{}' cannot be dispatched from within a conversation",
                tool.name()
            ));
        }

        self.execute_named(tool.name(), query, parameters).await
    }

    /// Registry descriptors minus the denylist, for prompt building.
    pub fn catalogue(&self) -> Vec<ToolDescriptor> {
        self.registry
            .descriptors()
            .into_iter()
            .filter(|d| !self.is_denied(&d.name))
            .collect()
    }
}
