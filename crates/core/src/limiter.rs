//! Admission control contract for outbound model calls.
//!
//! A `RateLimiter` guards independent resource dimensions by string key. The
//! limiter only reports admission or denial; it never blocks, sleeps, or
//! retries. The decision to back off belongs to the caller.

use async_trait::async_trait;
use std::time::Duration;

/// Resource key bounding the number of model calls per minute.
pub const RESOURCE_REQUESTS: &str = "requests";

/// Resource key bounding consumed token volume per minute.
pub const RESOURCE_TOKENS: &str = "tokens";

/// Keyed admission controller in front of every outbound model call.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Attempt to acquire permission for one operation on `resource_key`.
    ///
    /// Returns true and debits one token when capacity is available; returns
    /// false without debiting otherwise.
    async fn try_acquire(&self, resource_key: &str) -> bool;

    /// Time until the next operation on `resource_key` would be permitted.
    ///
    /// Zero when a token is already available.
    async fn time_until_next_permitted(&self, resource_key: &str) -> Duration;

    /// Reconcile actual usage after a successful call.
    ///
    /// For token-volume accounting: `tokens_used - 1` additional tokens are
    /// debited (the first unit was already taken by `try_acquire`), clamped
    /// at zero.
    async fn record_successful_request(&self, resource_key: &str, tokens_used: u32);
}
