//! Sliding-window rate limiter, one window per backend identity.

use std::collections::VecDeque;
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::{Instant, sleep_until};
use tracing::debug;

use crate::constants::rate_limit::{DEFAULT_CALLS_PER_MINUTE, WINDOW_SECS};

pub struct RateLimiter {
    max_calls: usize,
    window: Duration,
    /// Call timestamps per backend, oldest first
    calls: DashMap<String, VecDeque<Instant>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_CALLS_PER_MINUTE)
    }
}

impl RateLimiter {
    pub fn new(calls_per_minute: usize) -> Self {
        Self::with_window(calls_per_minute, Duration::from_secs(WINDOW_SECS))
    }

    pub fn with_window(max_calls: usize, window: Duration) -> Self {
        Self {
            max_calls: max_calls.max(1),
            window,
            calls: DashMap::new(),
        }
    }

    /// Suspend until `backend_id` has fewer than the allowed calls in the
    /// trailing window, then record this call.
    pub async fn wait(&self, backend_id: &str) {
        loop {
            // The map guard must be dropped before suspending.
            let wake_at = {
                let mut recent = self.calls.entry(backend_id.to_string()).or_default();
                let now = Instant::now();
                while recent
                    .front()
                    .is_some_and(|&oldest| now.duration_since(oldest) >= self.window)
                {
                    recent.pop_front();
                }

                match recent.front() {
                    Some(&oldest) if recent.len() >= self.max_calls => oldest + self.window,
                    _ => {
                        recent.push_back(now);
                        return;
                    }
                }
            };

            debug!(
                backend = %backend_id,
                wait_ms = wake_at.saturating_duration_since(Instant::now()).as_millis() as u64,
                "Rate limit reached, waiting"
            );
            sleep_until(wake_at).await;
        }
    }

    /// Calls currently recorded inside the window for `backend_id`
    pub fn recent_calls(&self, backend_id: &str) -> usize {
        let now = Instant::now();
        self.calls
            .get(backend_id)
            .map(|recent| {
                recent
                    .iter()
                    .filter(|&&t| now.duration_since(t) < self.window)
                    .count()
            })
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_third_call_waits_for_window() {
        let limiter = RateLimiter::new(2);
        let start = Instant::now();

        limiter.wait("openai").await;
        tokio::time::advance(Duration::from_secs(10)).await;
        limiter.wait("openai").await;
        assert!(start.elapsed() < Duration::from_secs(11));

        limiter.wait("openai").await;
        // Admitted once the first call leaves the window
        assert!(start.elapsed() >= Duration::from_secs(60));
        assert!(start.elapsed() < Duration::from_secs(61));
        assert_eq!(limiter.recent_calls("openai"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backends_are_independent() {
        let limiter = RateLimiter::new(1);
        let start = Instant::now();

        limiter.wait("openai").await;
        limiter.wait("anthropic").await;
        assert_eq!(start.elapsed(), Duration::ZERO);

        limiter.wait("openai").await;
        assert!(start.elapsed() >= Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_under_limit_never_waits() {
        let limiter = RateLimiter::with_window(5, Duration::from_secs(1));
        let start = Instant::now();
        for _ in 0..5 {
            limiter.wait("gemini").await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(limiter.recent_calls("gemini"), 5);
        assert_eq!(limiter.recent_calls("unknown"), 0);
    }
}
