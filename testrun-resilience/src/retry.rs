//! Retry policy for contended environment claims

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry policy configuration
///
/// A pure function of the attempt count: attempt `a` waits `2^a` seconds, and
/// the request is abandoned once `a` reaches `max_retry`. No jitter: retries
/// for one request target one environment, so spreading them out buys nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts
    pub max_retry: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retry: 10 }
    }
}

impl RetryPolicy {
    /// Create a policy with the given attempt budget
    pub fn new(max_retry: u32) -> Self {
        Self { max_retry }
    }

    /// Backoff delay in whole seconds for a specific attempt (0-indexed)
    pub fn delay_seconds(&self, attempt: u32) -> u64 {
        2u64.saturating_pow(attempt)
    }

    /// Backoff delay for a specific attempt (0-indexed)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        Duration::from_secs(self.delay_seconds(attempt))
    }

    /// Whether the attempt budget is spent and no further retry is allowed
    pub fn is_exhausted(&self, attempt: u32) -> bool {
        attempt >= self.max_retry
    }
}
