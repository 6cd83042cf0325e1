use std::time::{Duration, Instant};

use dashmap::DashMap;

const MAX_FAILURES: u32 = 5;
const WINDOW: Duration = Duration::from_secs(15 * 60);

/// Per-username login brute force limiter: 5 failures per 15 minutes.
pub struct LoginRateLimiter {
    /// username -> (failed_count, window_start)
    entries: DashMap<String, (u32, Instant)>,
}

impl LoginRateLimiter {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Returns Err with the seconds left in the window once the limit is hit.
    /// Does not count the attempt; call `record_failure()` for that.
    pub fn check(&self, username: &str) -> Result<(), u64> {
        let now = Instant::now();
        let Some(entry) = self.entries.get(&username.to_lowercase()) else {
            return Ok(());
        };

        let (count, start) = entry.value();
        if now.duration_since(*start) > WINDOW || *count < MAX_FAILURES {
            return Ok(());
        }

        let elapsed = now.duration_since(*start).as_secs();
        Err(WINDOW.as_secs().saturating_sub(elapsed))
    }

    pub fn record_failure(&self, username: &str) {
        let now = Instant::now();
        let mut entry = self
            .entries
            .entry(username.to_lowercase())
            .or_insert((0, now));
        let (count, start) = entry.value_mut();

        if now.duration_since(*start) > WINDOW {
            *count = 1;
            *start = now;
        } else {
            *count += 1;
        }
    }

    /// Forget failures after a successful login.
    pub fn reset(&self, username: &str) {
        self.entries.remove(&username.to_lowercase());
    }

    /// Remove windows that have expired.
    pub fn cleanup(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries
            .retain(|_, (_, start)| now.duration_since(*start) <= WINDOW);
        before.saturating_sub(self.entries.len())
    }
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
