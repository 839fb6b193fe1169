//! Per-client request budget.
//!
//! The gateway only consumes the [`RateBudget`] decision contract; the token
//! bucket below is the bundled implementation.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

use crate::config::RateLimitConfig;
use crate::gateway::DependencyInitError;

/// Outcome of a budget check.
#[derive(Debug, Clone, PartialEq)]
pub enum BudgetDecision {
    Within,
    Exceeded { reason: String },
}

/// Decision contract for request budgets.
pub trait RateBudget: Send + Sync {
    fn check_limits(&self, client_id: &str) -> BudgetDecision;

    /// Forget all per-client state.
    fn reset(&self) {}
}

/// A simple token bucket.
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(capacity: f64) -> Self {
        Self {
            tokens: capacity,
            last_update: Instant::now(),
        }
    }

    fn try_acquire(&mut self, capacity: f64, refill_rate: f64) -> bool {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();

        // Refill tokens
        self.tokens = (self.tokens + elapsed * refill_rate).min(capacity);
        self.last_update = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Token-bucket budget keyed by client identifier.
pub struct TokenBucketBudget {
    buckets: Mutex<HashMap<String, TokenBucket>>,
    rps: f64,
    burst: f64,
}

impl TokenBucketBudget {
    pub fn new(config: &RateLimitConfig) -> Result<Self, DependencyInitError> {
        if config.requests_per_second == 0 || config.burst_size == 0 {
            return Err(DependencyInitError::RateBudget(
                "requests_per_second and burst_size must be positive".to_string(),
            ));
        }
        Ok(Self {
            buckets: Mutex::new(HashMap::new()),
            rps: f64::from(config.requests_per_second),
            burst: f64::from(config.burst_size),
        })
    }

    pub fn tracked_clients(&self) -> usize {
        self.buckets.lock().expect("rate limiter mutex poisoned").len()
    }
}

impl RateBudget for TokenBucketBudget {
    fn check_limits(&self, client_id: &str) -> BudgetDecision {
        let mut buckets = self.buckets.lock().expect("rate limiter mutex poisoned");
        let bucket = buckets
            .entry(client_id.to_string())
            .or_insert_with(|| TokenBucket::new(self.burst));

        if bucket.try_acquire(self.burst, self.rps) {
            BudgetDecision::Within
        } else {
            BudgetDecision::Exceeded {
                reason: format!("Request budget of {} req/s exceeded", self.rps),
            }
        }
    }

    fn reset(&self) {
        self.buckets.lock().expect("rate limiter mutex poisoned").clear();
    }
}
