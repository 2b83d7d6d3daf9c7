use serde::Deserialize;
use std::time::Duration;

/// How often, and how patiently, a URL is retried.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Fixed pause between attempts, never before the first.
    pub delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            delay_ms: 25_000,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay_ms: u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Single attempt, no waiting.
    pub fn once() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Worst-case time spent sleeping for one URL.
    pub fn max_wait(&self) -> Duration {
        self.delay() * self.max_attempts.saturating_sub(1)
    }
}
