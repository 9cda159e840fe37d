//! Agent request/response value objects — the caller-facing contract.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An incoming query for the agent service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRequest {
    /// The user's query text
    pub query: String,

    /// Caller-supplied key/value parameters
    #[serde(default)]
    pub parameters: HashMap<String, String>,

    /// Let the agent pick the best tool automatically
    #[serde(default = "default_true")]
    pub use_all_tools: bool,

    /// Restrict dispatch to these tools (first entry wins)
    #[serde(default)]
    pub specific_tools: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl AgentRequest {
    /// A request with automatic tool selection and no extra parameters.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            parameters: HashMap::new(),
            use_all_tools: true,
            specific_tools: Vec::new(),
        }
    }
}

/// The agent's answer to a single request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResponse {
    /// The response text shown to the user
    #[serde(default)]
    pub response: String,

    /// Name of the tool that produced the response
    #[serde(default)]
    pub tool_used: String,

    /// Structured data passed through from the tool result
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub data: serde_json::Map<String, serde_json::Value>,

    /// Whether the request was handled successfully
    pub success: bool,

    /// Human-readable error when `success` is false
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl AgentResponse {
    /// A failure response carrying an error message.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            response: String::new(),
            tool_used: String::new(),
            data: serde_json::Map::new(),
            success: false,
            error_message: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_defaults_to_all_tools() {
        let req: AgentRequest = serde_json::from_str(r#"{"query":"hi"}"#).unwrap();
        assert!(req.use_all_tools);
        assert!(req.specific_tools.is_empty());
        assert!(req.parameters.is_empty());
    }

    #[test]
    fn response_serialization_skips_empty_data() {
        let resp = AgentResponse {
            response: "ok".into(),
            tool_used: "chat".into(),
            data: serde_json::Map::new(),
            success: true,
            error_message: None,
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(!json.contains("data"));
        assert!(!json.contains("error_message"));
    }
}
