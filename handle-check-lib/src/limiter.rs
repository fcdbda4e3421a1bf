//! Sliding-window rate limiter.
//!
//! Bounds outbound probes to a configured quota Q per rolling 60-second
//! window. Keeps the timestamps of the last Q admissions; when the window is
//! full, `acquire` sleeps until the oldest admission ages out. This is a
//! sliding-window limiter with no burst allowance, not a leaky bucket.
//!
//! Timestamps come from `tokio::time::Instant` so tests can drive the
//! limiter on a paused clock.

use crate::error::HandleCheckError;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Length of the rolling admission window.
pub const WINDOW: Duration = Duration::from_secs(60);

/// Admits at most `quota` operations in any trailing 60-second interval.
pub struct RateLimiter {
    quota: usize,
    window: Duration,
    admissions: VecDeque<Instant>,
}

impl RateLimiter {
    /// Create a limiter with the given per-minute quota.
    ///
    /// The quota is fixed at construction and immutable afterwards.
    pub fn new(quota: u32) -> Result<Self, HandleCheckError> {
        if quota == 0 {
            return Err(HandleCheckError::config(
                "rate quota must be at least 1 probe per minute",
            ));
        }
        Ok(Self {
            quota: quota as usize,
            window: WINDOW,
            admissions: VecDeque::with_capacity(quota as usize),
        })
    }

    /// The configured per-window quota.
    pub fn quota(&self) -> usize {
        self.quota
    }

    /// Block until another operation may be admitted, then record it.
    ///
    /// Admits immediately while fewer than `quota` admissions are recorded.
    /// Otherwise sleeps for whatever remains of the window measured from the
    /// oldest recorded admission, which may be up to the full window length.
    pub async fn acquire(&mut self) {
        let now = Instant::now();

        if self.admissions.len() < self.quota {
            self.admissions.push_back(now);
            return;
        }

        let oldest = match self.admissions.front() {
            Some(instant) => *instant,
            None => {
                self.admissions.push_back(now);
                return;
            }
        };

        let elapsed = now.duration_since(oldest);
        if elapsed < self.window {
            let wait = self.window - elapsed;
            tracing::debug!(
                wait_ms = wait.as_millis() as u64,
                quota = self.quota,
                "rate window full, sleeping"
            );
            sleep(wait).await;
        }

        self.admissions.pop_front();
        self.admissions.push_back(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_quota_rejected() {
        assert!(RateLimiter::new(0).is_err());
        assert_eq!(RateLimiter::new(30).unwrap().quota(), 30);
    }

    #[tokio::test(start_paused = true)]
    async fn test_under_quota_admits_immediately() {
        let mut limiter = RateLimiter::new(5).unwrap();
        let start = Instant::now();

        for _ in 0..5 {
            limiter.acquire().await;
        }

        assert_eq!(
            start.elapsed(),
            Duration::ZERO,
            "first quota admissions must not sleep"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_quota_plus_one_waits_full_window() {
        let mut limiter = RateLimiter::new(3).unwrap();
        let start = Instant::now();

        for _ in 0..3 {
            limiter.acquire().await;
        }
        limiter.acquire().await; // 4th call

        assert!(
            start.elapsed() >= WINDOW,
            "the (Q+1)-th acquire returned after only {:?}",
            start.elapsed()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_slides_per_admission() {
        let mut limiter = RateLimiter::new(1).unwrap();
        let start = Instant::now();

        limiter.acquire().await;
        assert_eq!(start.elapsed(), Duration::ZERO);

        limiter.acquire().await;
        assert!(start.elapsed() >= WINDOW);
        assert!(start.elapsed() < WINDOW * 2);

        limiter.acquire().await;
        assert!(start.elapsed() >= WINDOW * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_aged_out_window_admits_without_sleep() {
        let mut limiter = RateLimiter::new(2).unwrap();

        limiter.acquire().await;
        limiter.acquire().await;

        // Let the whole window age out
        sleep(WINDOW + Duration::from_secs(1)).await;

        let before = Instant::now();
        limiter.acquire().await;
        assert_eq!(before.elapsed(), Duration::ZERO);
    }
}
