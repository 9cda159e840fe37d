//! # Augent Core
//!
//! Domain types, traits, and error definitions for the Augent dialogue
//! orchestrator. This crate defines the domain model that all other crates
//! implement against; beyond the async plumbing (`tokio::sync`, cancellation
//! tokens) it carries no framework dependencies.
//!
//! ## Design Philosophy
//!
//! Every subsystem is defined as a trait here. Implementations live in their
//! respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod agent;
pub mod error;
pub mod limiter;
pub mod llm;
pub mod nlp;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use agent::{AgentRequest, AgentResponse};
pub use error::{Error, LlmError, NlpError, Result, ToolError};
pub use limiter::{RateLimiter, RESOURCE_REQUESTS, RESOURCE_TOKENS};
pub use llm::{LlmResponse, LlmService, StreamingChunk, StreamingLlmService};
pub use nlp::{ExtractedEntities, IntentClassification, NlpService, SentimentAnalysis};
pub use tool::{QueryContext, StreamingTool, Tool, ToolDescriptor, ToolResult};
