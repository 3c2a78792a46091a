//! Shared outbound throttle for the API Client (spec §4.2, §5).
//!
//! Grounded on `auth_api::middleware::rate_limit::RateLimiter`'s token
//! bucket, but adapted from a reject-over-limit HTTP middleware into a
//! blocking throttle: the spec requires requests exceeding the rate to
//! *wait* for a slot rather than be rejected, since this is an outbound
//! client, not an inbound gate.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// A single global token bucket shared across every endpoint, as required
/// by "the throttle is shared across all endpoints" (§4.2).
pub struct RateLimiter {
    max_tokens: f64,
    refill_interval: Duration,
    bucket: Mutex<Bucket>,
}

impl RateLimiter {
    /// `max_requests` per `interval_ms` milliseconds, bursting up to
    /// `max_requests` allowed.
    pub fn new(max_requests: u32, interval_ms: u64) -> Self {
        Self {
            max_tokens: max_requests as f64,
            refill_interval: Duration::from_millis(interval_ms),
            bucket: Mutex::new(Bucket {
                tokens: max_requests as f64,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Blocks until a slot is available, then consumes one token.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut bucket = self.bucket.lock().await;
                let now = Instant::now();
                let elapsed = now.duration_since(bucket.last_refill);
                let refill = elapsed.as_secs_f64() / self.refill_interval.as_secs_f64() * self.max_tokens;
                bucket.tokens = (bucket.tokens + refill).min(self.max_tokens);
                bucket.last_refill = now;

                if bucket.tokens >= 1.0 {
                    bucket.tokens -= 1.0;
                    None
                } else {
                    let deficit = 1.0 - bucket.tokens;
                    let seconds_per_token = self.refill_interval.as_secs_f64() / self.max_tokens;
                    Some(Duration::from_secs_f64(deficit * seconds_per_token))
                }
            };

            match wait {
                None => return,
                Some(delay) => tokio::time::sleep(delay).await,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn bursts_up_to_max_then_blocks() {
        let limiter = RateLimiter::new(3, 1000);

        // First 3 acquisitions should be immediate (burst).
        let start = Instant::now();
        for _ in 0..3 {
            limiter.acquire().await;
        }
        assert!(Instant::now() - start < Duration::from_millis(10));

        // The 4th must wait roughly one refill slice.
        let before = Instant::now();
        limiter.acquire().await;
        assert!(Instant::now() - before >= Duration::from_millis(300));
    }
}
