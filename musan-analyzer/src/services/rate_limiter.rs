//! Upstream pacing
//!
//! Two layers keep us polite towards both services:
//! - [`BatchPacer`]: a delay enforced after each fan-out batch completes,
//!   shared by every fan-out that runs inside one request
//! - [`request_quota`]: a per-client token bucket bounding raw request rate

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Enforces a minimum gap between the end of one batch and the start of the next
#[derive(Debug)]
pub struct BatchPacer {
    last_batch_end: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl BatchPacer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            last_batch_end: Mutex::new(None),
            min_interval,
        }
    }

    /// Wait until `min_interval` has elapsed since the last completed batch
    pub async fn wait_for_slot(&self) {
        let last = *self.last_batch_end.lock().await;

        if let Some(last_time) = last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                tracing::debug!("Batch pacing: waiting {:?}", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }
    }

    /// Record that a batch has just finished
    pub async fn batch_complete(&self) {
        *self.last_batch_end.lock().await = Some(Instant::now());
    }
}

/// Direct (unkeyed) token bucket allowing `per_second` requests per second
///
/// A zero rate is clamped to one request per second.
pub fn request_quota(per_second: u32) -> DefaultDirectRateLimiter {
    let rate = NonZeroU32::new(per_second).unwrap_or(NonZeroU32::MIN);
    RateLimiter::direct(Quota::per_second(rate))
}
