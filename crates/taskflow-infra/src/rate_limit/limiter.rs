use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use taskflow_core::AppError;

#[derive(Debug, Clone)]
struct TokenBucket {
    tokens: f64,
    capacity: f64,
    refill_rate: f64, // tokens per second
    last_refill: Instant,
}

impl TokenBucket {
    fn new(capacity: f64, refill_rate: f64, now: Instant) -> Self {
        Self {
            tokens: capacity,
            capacity,
            refill_rate,
            last_refill: now,
        }
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        let tokens_to_add = elapsed * self.refill_rate;

        self.tokens = (self.tokens + tokens_to_add).min(self.capacity);
        self.last_refill = now;
    }

    fn try_acquire(&mut self, now: Instant) -> bool {
        self.refill(now);

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn time_until_next_token(&self) -> Duration {
        if self.tokens >= 1.0 {
            Duration::from_secs(0)
        } else {
            let tokens_needed = 1.0 - self.tokens;
            let seconds = tokens_needed / self.refill_rate;
            Duration::try_from_secs_f64(seconds.max(0.0)).unwrap_or(Duration::MAX)
        }
    }
}

/// Process-wide token bucket guarding request admission.
///
/// The bucket starts full with `burst` tokens and refills continuously at
/// `rate` tokens per second. A denied request consumes nothing.
#[derive(Clone)]
pub struct RateLimiter {
    bucket: Arc<Mutex<TokenBucket>>,
}

impl RateLimiter {
    pub fn new(rate: f64, burst: u32) -> Self {
        Self {
            bucket: Arc::new(Mutex::new(TokenBucket::new(
                f64::from(burst),
                rate,
                Instant::now(),
            ))),
        }
    }

    /// Try to take a token without blocking
    #[tracing::instrument(skip(self))]
    pub async fn try_acquire(&self) -> bool {
        self.admit().await.is_ok()
    }

    /// Take a token, or report how long until one becomes available.
    pub async fn admit(&self) -> Result<(), AppError> {
        let mut bucket = self.bucket.lock().await;

        if bucket.try_acquire(Instant::now()) {
            tracing::trace!(tokens_remaining = bucket.tokens, "Admission token acquired");
            Ok(())
        } else {
            let retry_after = bucket.time_until_next_token();
            tracing::debug!(
                tokens_remaining = bucket.tokens,
                retry_after_ms = retry_after.as_millis() as u64,
                "Admission token not available"
            );
            Err(AppError::RateLimited { retry_after })
        }
    }

    /// Get the current number of available tokens
    pub async fn available_tokens(&self) -> f64 {
        let mut bucket = self.bucket.lock().await;
        bucket.refill(Instant::now());
        bucket.tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_starts_full_and_drains() {
        let start = Instant::now();
        let mut bucket = TokenBucket::new(3.0, 1.0, start);

        assert!(bucket.try_acquire(start));
        assert!(bucket.try_acquire(start));
        assert!(bucket.try_acquire(start));
        assert!(!bucket.try_acquire(start));
    }

    #[test]
    fn bucket_refills_at_rate_up_to_capacity() {
        let start = Instant::now();
        let mut bucket = TokenBucket::new(2.0, 4.0, start);
        assert!(bucket.try_acquire(start));
        assert!(bucket.try_acquire(start));
        assert!(!bucket.try_acquire(start));

        // 4 tokens/s: a quarter second yields one token
        let later = start + Duration::from_millis(260);
        assert!(bucket.try_acquire(later));
        assert!(!bucket.try_acquire(later));

        // A long pause never overfills past the burst capacity
        let much_later = later + Duration::from_secs(60);
        bucket.refill(much_later);
        assert_eq!(bucket.tokens, 2.0);
    }

    #[test]
    fn denied_acquire_consumes_nothing() {
        let start = Instant::now();
        let mut bucket = TokenBucket::new(1.0, 2.0, start);
        assert!(bucket.try_acquire(start));

        for _ in 0..10 {
            assert!(!bucket.try_acquire(start));
        }
        assert!(bucket.try_acquire(start + Duration::from_millis(510)));
    }

    #[test]
    fn time_until_next_token_reflects_deficit() {
        let start = Instant::now();
        let mut bucket = TokenBucket::new(1.0, 10.0, start);
        assert_eq!(bucket.time_until_next_token(), Duration::ZERO);

        assert!(bucket.try_acquire(start));
        let wait = bucket.time_until_next_token();
        assert!(wait > Duration::from_millis(90) && wait <= Duration::from_millis(100));
    }

    #[test]
    fn wait_saturates_for_vanishing_rate() {
        let start = Instant::now();
        let mut bucket = TokenBucket::new(1.0, 1e-300, start);
        assert!(bucket.try_acquire(start));
        assert!(!bucket.try_acquire(start));
        assert_eq!(bucket.time_until_next_token(), Duration::MAX);
    }

    #[tokio::test]
    async fn limiter_rejects_past_burst() {
        let limiter = RateLimiter::new(0.5, 2);

        assert!(limiter.try_acquire().await);
        assert!(limiter.try_acquire().await);

        match limiter.admit().await {
            Err(AppError::RateLimited { retry_after }) => {
                assert!(retry_after > Duration::ZERO);
            }
            other => panic!("expected RateLimited, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn limiter_clones_share_one_bucket() {
        let limiter = RateLimiter::new(0.1, 1);
        let clone = limiter.clone();

        assert!(limiter.try_acquire().await);
        assert!(!clone.try_acquire().await);
        assert!(limiter.available_tokens().await < 1.0);
    }
}
