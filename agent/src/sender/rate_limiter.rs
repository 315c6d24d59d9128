use std::num::NonZeroU32;
use std::sync::Arc;

use governor::clock::{Clock, DefaultClock};
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as Governor};
use tokio_util::sync::CancellationToken;

/// Token-bucket rate limiter shared across every send task of the agent, one
/// quota of `rate_tokens_count` cells refilled per second. `acquire` suspends
/// the caller until a token is available or the cancellation handle fires,
/// whichever comes first, matching the spec's requirement that a rate-limit
/// wait never blocks past cancellation.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Governor<NotKeyed, InMemoryState, DefaultClock>>,
    clock: DefaultClock,
}

impl RateLimiter {
    pub fn new(rate_tokens_count: u32) -> Self {
        let tokens = NonZeroU32::new(rate_tokens_count.max(1)).expect("max(1) is never zero");
        let quota = Quota::per_second(tokens);
        Self {
            inner: Arc::new(Governor::direct(quota)),
            clock: DefaultClock::default(),
        }
    }

    /// Waits for a token to become available. Returns `false` without
    /// performing any I/O if `cancel` fires while waiting.
    pub async fn acquire(&self, cancel: &CancellationToken) -> bool {
        loop {
            match self.inner.check() {
                Ok(()) => return true,
                Err(not_until) => {
                    let wait = not_until.wait_time_from(self.clock.now());
                    tokio::select! {
                        _ = cancel.cancelled() => return false,
                        _ = tokio::time::sleep(wait) => continue,
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn acquire_succeeds_immediately_when_a_token_is_available() {
        let limiter = RateLimiter::new(10);
        let cancel = CancellationToken::new();
        assert!(limiter.acquire(&cancel).await);
    }

    #[tokio::test]
    async fn acquire_returns_false_without_waiting_out_the_full_refill_when_cancelled() {
        let limiter = RateLimiter::new(1);
        let cancel = CancellationToken::new();

        assert!(limiter.acquire(&cancel).await);

        let cancel_clone = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            cancel_clone.cancel();
        });

        assert!(!limiter.acquire(&cancel).await);
    }
}
