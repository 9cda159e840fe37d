//! LLM backend implementations for Augent.
//!
//! `ClaudeService` talks to the Anthropic Messages API, in both complete and
//! streaming form. `RateLimitedLlm` is a decorator that gates any backend
//! behind the token-bucket admission controller.

pub mod anthropic;
pub mod rate_limited;

pub use anthropic::ClaudeService;
pub use rate_limited::RateLimitedLlm;
