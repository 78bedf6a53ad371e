use std::num::NonZeroU32;
use std::sync::Arc;

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};
use tracing::debug;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Client-side request budget, e.g. 5 calls per minute on the free tier.
///
/// Every upstream attempt waits for a cell before it is sent, so retries
/// count against the budget too.
#[derive(Clone)]
pub struct RequestPacer {
    limiter: Arc<DirectRateLimiter>,
    requests_per_minute: NonZeroU32,
}

impl RequestPacer {
    pub fn per_minute(requests_per_minute: NonZeroU32) -> Self {
        Self {
            limiter: Arc::new(RateLimiter::direct(Quota::per_minute(requests_per_minute))),
            requests_per_minute,
        }
    }

    pub fn requests_per_minute(&self) -> u32 {
        self.requests_per_minute.get()
    }

    /// Wait until the budget allows one more request.
    pub async fn ready(&self) {
        if self.limiter.check().is_ok() {
            return;
        }
        debug!(
            requests_per_minute = self.requests_per_minute.get(),
            "request budget spent; waiting"
        );
        self.limiter.until_ready().await;
    }

    /// Take one cell without waiting. `false` when the budget is spent.
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

impl std::fmt::Debug for RequestPacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestPacer")
            .field("requests_per_minute", &self.requests_per_minute)
            .finish()
    }
}
