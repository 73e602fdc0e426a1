// Token-bucket rate limiter for the Enrichment agent's external AI calls
// (default 10/minute). Callers suspend cooperatively until a token is free;
// `until_ready_or_cancelled` races that wait against a cancellation check so
// a cancelled task doesn't sit blocked on the bucket.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as GovernorRateLimiter};

type Limiter = GovernorRateLimiter<NotKeyed, InMemoryState, DefaultClock>;

#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Limiter>,
}

impl RateLimiter {
    /// `per_minute` calls are permitted per rolling minute.
    pub fn per_minute(per_minute: u32) -> Self {
        let quota = Quota::per_minute(NonZeroU32::new(per_minute.max(1)).expect("max(1) is never zero"));
        Self { inner: Arc::new(GovernorRateLimiter::direct(quota)) }
    }

    /// The Enrichment agent's default AI-call budget: 10 calls/minute.
    pub fn default_ai_calls() -> Self {
        Self::per_minute(nonzero_ext::nonzero!(10u32).get())
    }

    /// Blocks until a token is available. Returns `false` if `cancelled` flips
    /// true before a token frees up, in which case the caller must not make
    /// the call it was about to throttle.
    pub async fn acquire_or_cancel(&self, cancelled: impl Fn() -> bool) -> bool {
        loop {
            if cancelled() {
                return false;
            }
            match self.inner.check() {
                Ok(()) => return true,
                Err(not_until) => {
                    let wait = not_until.wait_time_from(governor::clock::Clock::now(&DefaultClock::default()));
                    tokio::time::sleep(wait.min(Duration::from_millis(250))).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn throttles_calls_beyond_the_quota() {
        let limiter = RateLimiter::per_minute(1);
        assert!(limiter.acquire_or_cancel(|| false).await);

        let attempts = AtomicUsize::new(0);
        let cancelled = || attempts.fetch_add(1, Ordering::Relaxed) > 3;
        assert!(!limiter.acquire_or_cancel(cancelled).await);
    }
}
