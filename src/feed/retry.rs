// Retry timing for rate-limited and failed requests.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::github::RateLimit;

/// Delay policy: server-directed waits when the response says how long,
/// exponential backoff otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    base: Duration,
    max_delay: Option<Duration>,
}

impl Backoff {
    pub fn new(base: Duration, max_delay: Option<Duration>) -> Self {
        Self { base, max_delay }
    }

    /// `base * 2^attempt`, with `attempt` counted from zero.
    pub fn exponential(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.cap(self.base.saturating_mul(factor))
    }

    /// Delay after a 403/429 response.
    ///
    /// `Retry-After` wins; otherwise the reset instant is used when the quota
    /// is spent (or unreported); otherwise exponential backoff.
    pub fn rate_limit_delay(
        &self,
        attempt: u32,
        rate_limit: &RateLimit,
        now: DateTime<Utc>,
    ) -> Duration {
        if let Some(secs) = rate_limit.retry_after {
            return self.cap(Duration::from_secs(secs));
        }

        if rate_limit.remaining.is_none() || rate_limit.is_exhausted() {
            if let Some(reset_at) = rate_limit.reset_at() {
                let wait = reset_at
                    .signed_duration_since(now)
                    .to_std()
                    .unwrap_or(Duration::ZERO);
                return self.cap(wait);
            }
        }

        self.exponential(attempt)
    }

    fn cap(&self, delay: Duration) -> Duration {
        match self.max_delay {
            Some(max) => delay.min(max),
            None => delay,
        }
    }
}

/// Non-blocking wait between attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, delay: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}
