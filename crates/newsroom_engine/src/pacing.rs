//! Politeness delays between requests to third-party hosts.
//!
//! None of these affect correctness; tests run with [`Pacing::none`].

use std::time::Duration;

use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    pub min: Duration,
    pub max: Duration,
}

impl DelayRange {
    pub const ZERO: DelayRange = DelayRange::fixed(Duration::ZERO);

    pub const fn fixed(delay: Duration) -> Self {
        Self {
            min: delay,
            max: delay,
        }
    }

    pub fn between_millis(min: u64, max: u64) -> Self {
        Self {
            min: Duration::from_millis(min.min(max)),
            max: Duration::from_millis(max.max(min)),
        }
    }

    /// Uniform sample in `[min, max]`.
    pub fn sample(&self) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        let lo = self.min.as_millis() as u64;
        let hi = self.max.as_millis() as u64;
        Duration::from_millis(rand::rng().random_range(lo..=hi))
    }

    pub async fn pause(&self) {
        let delay = self.sample();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub between_sources: DelayRange,
    pub between_posts: DelayRange,
    pub between_publishes: DelayRange,
    pub after_download: DelayRange,
}

impl Pacing {
    pub fn none() -> Self {
        Self {
            between_sources: DelayRange::ZERO,
            between_posts: DelayRange::ZERO,
            between_publishes: DelayRange::ZERO,
            after_download: DelayRange::ZERO,
        }
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            between_sources: DelayRange::between_millis(1_000, 3_000),
            between_posts: DelayRange::between_millis(500, 1_500),
            between_publishes: DelayRange::between_millis(2_000, 5_000),
            after_download: DelayRange::fixed(Duration::from_millis(500)),
        }
    }
}
