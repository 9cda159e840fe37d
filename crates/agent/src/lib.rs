//! Tool dispatch for Augent.
//!
//! Three layers, each total in what it exposes:
//! - `ToolRegistry` knows which tools exist and picks the best one for a
//!   query, optionally consulting an intent classifier.
//! - `ToolOrchestrator` executes tools by name or by selection, converting
//!   every internal error into a failure `ToolResult` and refusing
//!   conversational tools to prevent recursive self-invocation.
//! - `AgentService` is the caller-facing facade: request validation, optional
//!   NLP enrichment, and dispatch.

pub mod orchestrator;
pub mod registry;
pub mod service;

pub use orchestrator::ToolOrchestrator;
pub use registry::ToolRegistry;
pub use service::AgentService;
