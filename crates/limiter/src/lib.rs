//! Token-bucket rate limiter bounding outbound model calls.
//!
//! Two independent dimensions are tracked by resource key: call count per
//! minute (`requests`) and consumed token volume per minute (`tokens`). Each
//! bucket's burst capacity is a small fraction of its per-minute rate, and a
//! buffer percentage discounts the nominal rate so actual throughput stays
//! safely under the provider's real limit.
//!
//! Buckets are refilled lazily by elapsed-time accrual on every access, so no
//! background timer is needed; a single mutex serializes the whole
//! get-or-create → refill → debit sequence. Idle buckets are evicted after an
//! expiration window and recreated full on next use.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use augent_core::limiter::{RateLimiter, RESOURCE_REQUESTS, RESOURCE_TOKENS};

/// Configuration for the token bucket rate limiter.
#[derive(Debug, Clone)]
pub struct RateLimiterSettings {
    /// Maximum model requests per minute
    pub requests_per_minute: u32,

    /// Maximum tokens per minute (input and output combined)
    pub tokens_per_minute: u32,

    /// Buffer percentage (0-100) to stay under the provider limit
    pub buffer_percentage: u32,

    /// Idle time after which a bucket is evicted and recreated full
    pub bucket_expiration: Duration,
}

impl Default for RateLimiterSettings {
    fn default() -> Self {
        Self {
            requests_per_minute: 10,
            tokens_per_minute: 10_000,
            buffer_percentage: 10,
            bucket_expiration: Duration::from_secs(60 * 60),
        }
    }
}

/// One refillable credit balance for a rate-limited resource.
#[derive(Debug, Clone)]
struct TokenBucket {
    /// Tokens currently available; never exceeds capacity, clamped at zero
    available_tokens: f64,

    /// When the bucket was last refilled
    last_refill: Instant,

    /// When the bucket was last read or written (drives expiration)
    last_touched: Instant,
}

/// Token-bucket implementation of [`RateLimiter`].
///
/// Pass one instance explicitly to every call site that needs admission
/// control; buckets live for the lifetime of the limiter.
pub struct TokenBucketRateLimiter {
    settings: RateLimiterSettings,
    buckets: Mutex<HashMap<String, TokenBucket>>,
}

impl TokenBucketRateLimiter {
    pub fn new(settings: RateLimiterSettings) -> Self {
        Self {
            settings,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Burst capacity for a resource key: 10% of the per-minute rate, with a
    /// floor so a fresh bucket always admits at least one operation.
    fn capacity(&self, resource_key: &str) -> f64 {
        match resource_key {
            RESOURCE_REQUESTS => f64::max(1.0, self.settings.requests_per_minute as f64 * 0.1),
            RESOURCE_TOKENS => f64::max(1000.0, self.settings.tokens_per_minute as f64 * 0.1),
            _ => 5.0,
        }
    }

    /// Refill rate in tokens per millisecond, discounted by the buffer.
    fn refill_rate_per_ms(&self, resource_key: &str) -> f64 {
        let buffer_multiplier = 1.0 - (self.settings.buffer_percentage as f64 / 100.0);
        let per_minute = match resource_key {
            RESOURCE_REQUESTS => self.settings.requests_per_minute as f64 * buffer_multiplier,
            RESOURCE_TOKENS => self.settings.tokens_per_minute as f64 * buffer_multiplier,
            _ => 10.0,
        };
        per_minute / (60.0 * 1000.0)
    }

    /// Fetch the bucket for `resource_key`, creating it full when absent or
    /// expired, and accrue elapsed-time refill up to capacity.
    ///
    /// Caller must hold the bucket-map lock.
    fn get_or_create_refilled<'a>(
        &self,
        buckets: &'a mut HashMap<String, TokenBucket>,
        resource_key: &str,
        now: Instant,
    ) -> &'a mut TokenBucket {
        let expired = buckets
            .get(resource_key)
            .map(|b| now.duration_since(b.last_touched) >= self.settings.bucket_expiration)
            .unwrap_or(false);
        if expired {
            debug!(resource = resource_key, "Evicting expired rate-limit bucket");
            buckets.remove(resource_key);
        }

        let capacity = self.capacity(resource_key);
        let rate = self.refill_rate_per_ms(resource_key);

        let bucket = buckets.entry(resource_key.to_string()).or_insert_with(|| {
            debug!(resource = resource_key, capacity, "Creating rate-limit bucket");
            TokenBucket {
                available_tokens: capacity,
                last_refill: now,
                last_touched: now,
            }
        });

        let elapsed_ms = now.duration_since(bucket.last_refill).as_secs_f64() * 1000.0;
        if elapsed_ms > 0.0 {
            bucket.available_tokens = f64::min(capacity, bucket.available_tokens + elapsed_ms * rate);
            bucket.last_refill = now;
        }
        bucket.last_touched = now;
        bucket
    }

    fn try_acquire_at(&self, resource_key: &str, now: Instant) -> bool {
        let mut buckets = self.buckets.lock().expect("bucket lock poisoned");
        let bucket = self.get_or_create_refilled(&mut buckets, resource_key, now);

        if bucket.available_tokens >= 1.0 {
            bucket.available_tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn time_until_next_permitted_at(&self, resource_key: &str, now: Instant) -> Duration {
        let rate = self.refill_rate_per_ms(resource_key);
        let mut buckets = self.buckets.lock().expect("bucket lock poisoned");
        let bucket = self.get_or_create_refilled(&mut buckets, resource_key, now);

        if bucket.available_tokens >= 1.0 {
            return Duration::ZERO;
        }
        let missing = 1.0 - bucket.available_tokens;
        Duration::from_secs_f64(missing / rate / 1000.0)
    }

    fn record_successful_request_at(&self, resource_key: &str, tokens_used: u32, now: Instant) {
        // Only the token-volume bucket reconciles actual usage; the first
        // unit was already debited by try_acquire.
        if resource_key != RESOURCE_TOKENS || tokens_used <= 1 {
            return;
        }

        let mut buckets = self.buckets.lock().expect("bucket lock poisoned");
        let bucket = self.get_or_create_refilled(&mut buckets, resource_key, now);
        bucket.available_tokens =
            f64::max(0.0, bucket.available_tokens - (tokens_used as f64 - 1.0));
    }
}

#[async_trait]
impl RateLimiter for TokenBucketRateLimiter {
    async fn try_acquire(&self, resource_key: &str) -> bool {
        let admitted = self.try_acquire_at(resource_key, Instant::now());
        if !admitted {
            warn!(resource = resource_key, "Rate limit admission denied");
        }
        admitted
    }

    async fn time_until_next_permitted(&self, resource_key: &str) -> Duration {
        self.time_until_next_permitted_at(resource_key, Instant::now())
    }

    async fn record_successful_request(&self, resource_key: &str, tokens_used: u32) {
        self.record_successful_request_at(resource_key, tokens_used, Instant::now());
    }
}
