//! Adaptive, header-driven rate limiting.
//!
//! Each upstream reports how many calls are left in its window. The delay
//! before the next call is a step function of that number: plenty left means
//! little or no wait, nearly exhausted means a long wait.

use std::future::Future;
use std::time::Duration;

use aura_core::{Error, Result};
use parking_lot::Mutex;
use reqwest::header::HeaderMap;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::ProxyResponse;

/// How one upstream's quota header maps to delays.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitPolicy {
    pub name: &'static str,
    /// Response header carrying the remaining call count.
    pub header: &'static str,
    /// `(min_remaining, delay)` steps, highest threshold first.
    pub steps: &'static [(u32, Duration)],
    /// Delay before any quota header has been seen.
    pub initial_delay: Duration,
    /// Wait imposed after an explicit rate-limit response.
    pub backoff: Duration,
}

impl RateLimitPolicy {
    /// MusicBrainz: roughly one call per second, tighter as the window drains.
    pub const MUSICBRAINZ: Self = Self {
        name: "musicbrainz",
        header: "X-RateLimit-Remaining",
        steps: &[
            (10, Duration::from_millis(500)),
            (3, Duration::from_millis(1000)),
            (0, Duration::from_millis(1100)),
        ],
        initial_delay: Duration::from_millis(1000),
        backoff: Duration::from_secs(2),
    };

    /// Discogs: free-running while the window is full, backing off late.
    pub const DISCOGS: Self = Self {
        name: "discogs",
        header: "X-Discogs-Ratelimit-Remaining",
        steps: &[
            (21, Duration::ZERO),
            (11, Duration::from_millis(500)),
            (6, Duration::from_millis(1000)),
            (0, Duration::from_millis(2000)),
        ],
        initial_delay: Duration::from_millis(1000),
        backoff: Duration::from_secs(5),
    };

    /// Delay for a known or unknown remaining quota.
    pub fn delay_for(&self, remaining: Option<u32>) -> Duration {
        let Some(remaining) = remaining else {
            return self.initial_delay;
        };
        self.steps
            .iter()
            .find(|(min, _)| remaining >= *min)
            .map_or(self.backoff, |(_, delay)| *delay)
    }
}

#[derive(Debug, Default)]
struct QuotaState {
    remaining: Option<u32>,
    /// Set by a rate-limit response; consumed by the next wait.
    forced_wait: Option<Duration>,
}

/// Serializing, adaptive rate limiter for one upstream.
#[derive(Debug)]
pub struct RateLimiter {
    policy: RateLimitPolicy,
    last_call: tokio::sync::Mutex<Option<Instant>>,
    quota: Mutex<QuotaState>,
}

impl RateLimiter {
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self {
            policy,
            last_call: tokio::sync::Mutex::new(None),
            quota: Mutex::new(QuotaState::default()),
        }
    }

    pub const fn policy(&self) -> &RateLimitPolicy {
        &self.policy
    }

    /// Remaining quota from the latest response, if any.
    pub fn remaining(&self) -> Option<u32> {
        self.quota.lock().remaining
    }

    /// Suspend until the next call is allowed.
    ///
    /// Callers are served one at a time, so concurrent artists queue behind
    /// each other instead of bursting.
    pub async fn wait_if_needed(&self) {
        let mut last_call = self.last_call.lock().await;

        let (forced, delay) = {
            let mut quota = self.quota.lock();
            let forced = quota.forced_wait.take();
            (forced, self.policy.delay_for(quota.remaining))
        };

        let wait = match (forced, *last_call) {
            (Some(forced), _) => forced,
            (None, Some(last)) => delay.saturating_sub(last.elapsed()),
            (None, None) => Duration::ZERO,
        };

        if !wait.is_zero() {
            debug!(
                limiter = self.policy.name,
                wait_ms = wait.as_millis() as u64,
                "Rate limiting before request"
            );
            sleep(wait).await;
        }
        *last_call = Some(Instant::now());
    }

    /// Read the remaining-quota header from a response.
    pub fn update_from_headers(&self, headers: &HeaderMap) {
        let remaining = headers
            .get(self.policy.header)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u32>().ok());
        if let Some(remaining) = remaining {
            self.set_remaining(remaining);
        }
    }

    fn set_remaining(&self, remaining: u32) {
        self.quota.lock().remaining = Some(remaining);
    }

    /// Force the next wait up to the backoff, or longer if the server asked.
    pub fn mark_rate_limited(&self, retry_after: Option<Duration>) {
        let wait = retry_after.map_or(self.policy.backoff, |r| r.max(self.policy.backoff));
        self.quota.lock().forced_wait = Some(wait);
    }

    /// Run one rate-limited call: wait, call, read headers.
    ///
    /// Quota reported with a rate-limit error is applied as well, so the
    /// retry and later calls are paced by it.
    ///
    /// A rate-limit error triggers exactly one retry after the backoff; a
    /// second rate-limit error is returned to the caller.
    pub async fn call<T, F, Fut>(&self, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<ProxyResponse<T>>>,
    {
        let mut retried = false;
        loop {
            self.wait_if_needed().await;
            let result = op().await;
            if let Some(remaining) = result.as_ref().err().and_then(Error::remaining_quota) {
                self.set_remaining(remaining);
            }
            match result {
                Ok(response) => {
                    self.update_from_headers(&response.headers);
                    return Ok(response.body);
                }
                Err(e) if e.is_rate_limited() && !retried => {
                    warn!(limiter = self.policy.name, "Rate limited, retrying once");
                    retried = true;
                    self.mark_rate_limited(e.retry_after());
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Retry a call once after a rate-limit error, waiting for the server's
/// retry-after or `default_wait`. For upstreams without a quota header.
pub async fn retry_rate_limited<T, F, Fut>(default_wait: Duration, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    match op().await {
        Err(e) if e.is_rate_limited() => {
            let wait = e.retry_after().unwrap_or(default_wait);
            warn!(wait_ms = wait.as_millis() as u64, "Rate limited, retrying once");
            sleep(wait).await;
            op().await
        }
        other => other,
    }
}
