use std::sync::{Mutex, PoisonError};

use tokio::time::Instant;

/// Default bucket capacity.
pub const DEFAULT_BURST: u32 = 5;
/// Default refill rate, tokens per second.
pub const DEFAULT_RATE_PER_SEC: f64 = 1.0;

/// Process-wide token bucket gating request admission.
///
/// The bucket starts full. Each admitted request takes one token; tokens
/// come back continuously at `rate_per_sec` up to `burst`. Admission is the
/// only thing gated: an admitted request keeps streaming for as long as its
/// deadline allows, whatever the bucket looks like afterwards.
///
/// Time is read from [`tokio::time::Instant`], so a paused test clock drives
/// refills deterministically.
#[derive(Debug)]
pub struct TokenBucket {
    burst: f64,
    rate_per_sec: f64,
    state: Mutex<BucketState>,
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    pub fn new(burst: u32, rate_per_sec: f64) -> Self {
        let burst = f64::from(burst);
        Self {
            burst,
            rate_per_sec: rate_per_sec.max(0.0),
            state: Mutex::new(BucketState {
                tokens: burst,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Take one token if one is available. Never blocks.
    pub fn try_acquire(&self) -> bool {
        let now = Instant::now();
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        let elapsed = now.saturating_duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.rate_per_sec).min(self.burst);
        state.last_refill = now;

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

impl Default for TokenBucket {
    fn default() -> Self {
        Self::new(DEFAULT_BURST, DEFAULT_RATE_PER_SEC)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn sixth_immediate_acquire_fails() {
        let bucket = TokenBucket::default();
        for i in 0..5 {
            assert!(bucket.try_acquire(), "acquire {i} should fit in the burst");
        }
        assert!(!bucket.try_acquire(), "sixth acquire should be rejected");
    }

    #[tokio::test(start_paused = true)]
    async fn one_second_refills_exactly_one_token() {
        let bucket = TokenBucket::default();
        while bucket.try_acquire() {}

        tokio::time::advance(Duration::from_secs(1)).await;

        assert!(bucket.try_acquire());
        assert!(!bucket.try_acquire());
    }

    #[tokio::test(start_paused = true)]
    async fn refill_never_exceeds_burst() {
        let bucket = TokenBucket::new(2, 1.0);
        tokio::time::advance(Duration::from_secs(60)).await;

        assert!(bucket.try_acquire());
        assert!(bucket.try_acquire());
        assert!(!bucket.try_acquire());
    }

    #[tokio::test(start_paused = true)]
    async fn shared_bucket_admits_burst_across_tasks() {
        let bucket = Arc::new(TokenBucket::default());
        let mut handles = Vec::new();
        for _ in 0..10 {
            let b = Arc::clone(&bucket);
            handles.push(tokio::spawn(async move { b.try_acquire() }));
        }

        let mut admitted = 0;
        for h in handles {
            if h.await.unwrap() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 5);
    }
}
