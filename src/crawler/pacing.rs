//! Request pacing
//!
//! Every wait in the crawler is a jittered draw from a configured range so
//! that requests never follow a fixed-interval signature. Waiting is an async
//! timer (`tokio::time::sleep`), never a blocking sleep.

use crate::config::{PacingConfig, MAX_DELAY_SECS};
use rand::Rng;
use std::time::Duration;

/// A `[min, max]` range of seconds to draw delays from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayRange {
    min: f64,
    max: f64,
}

impl DelayRange {
    /// Creates a range; negative or non-finite bounds collapse to zero, bounds
    /// above [`MAX_DELAY_SECS`] are capped and the bounds are ordered
    pub fn new(min: f64, max: f64) -> Self {
        let clean = |v: f64| {
            if v.is_finite() && v > 0.0 {
                v.min(MAX_DELAY_SECS)
            } else {
                0.0
            }
        };
        let (min, max) = (clean(min), clean(max));
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// A range that never waits
    pub fn zero() -> Self {
        Self { min: 0.0, max: 0.0 }
    }

    /// Draws a delay uniformly from the range
    pub fn sample(&self) -> Duration {
        let secs = if self.max <= self.min {
            self.min
        } else {
            rand::thread_rng().gen_range(self.min..=self.max)
        };
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO)
    }

    /// The range with both bounds multiplied by `factor`
    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(self.min * factor, self.max * factor)
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

/// Draws the delays the crawler waits on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pacer {
    /// Before every request
    politeness: DelayRange,

    /// After a 503 block signal
    block_cooldown: DelayRange,

    /// Between search result pages
    page_pause: DelayRange,
}

impl Pacer {
    pub fn new(politeness: DelayRange, block_cooldown: DelayRange, page_pause: DelayRange) -> Self {
        Self {
            politeness,
            block_cooldown,
            page_pause,
        }
    }

    /// A pacer that never waits
    pub fn immediate() -> Self {
        Self::new(DelayRange::zero(), DelayRange::zero(), DelayRange::zero())
    }

    pub fn from_config(config: &PacingConfig) -> Self {
        Self::new(
            DelayRange::new(config.min_delay, config.max_delay),
            DelayRange::new(config.block_cooldown_min, config.block_cooldown_max),
            DelayRange::new(config.page_pause_min, config.page_pause_max),
        )
    }

    pub fn politeness_delay(&self) -> Duration {
        self.politeness.sample()
    }

    /// Delay after a transport error: the politeness range doubled
    pub fn transport_backoff(&self) -> Duration {
        self.politeness.scaled(2.0).sample()
    }

    pub fn block_cooldown(&self) -> Duration {
        self.block_cooldown.sample()
    }

    pub fn page_pause(&self) -> Duration {
        self.page_pause.sample()
    }

    /// Suspends the current task for `delay`
    pub async fn pause(&self, delay: Duration) {
        if !delay.is_zero() {
            tracing::trace!("Pausing for {:?}", delay);
            tokio::time::sleep(delay).await;
        }
    }
}

impl Default for Pacer {
    fn default() -> Self {
        Self::from_config(&PacingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_stays_in_range() {
        let range = DelayRange::new(1.0, 3.0);
        for _ in 0..200 {
            let d = range.sample().as_secs_f64();
            assert!((1.0..=3.0).contains(&d), "sampled {}", d);
        }
    }

    #[test]
    fn test_degenerate_ranges() {
        assert_eq!(DelayRange::zero().sample(), Duration::ZERO);
        assert_eq!(DelayRange::new(2.0, 2.0).sample(), Duration::from_secs(2));
        assert_eq!(DelayRange::new(-1.0, f64::NAN), DelayRange::zero());
    }

    #[test]
    fn test_huge_bounds_are_capped() {
        let range = DelayRange::new(1e20, 1e20);
        assert_eq!(range.max(), MAX_DELAY_SECS);
        assert_eq!(range.sample(), Duration::from_secs_f64(MAX_DELAY_SECS));

        let pacer = Pacer::new(range, range, range);
        assert_eq!(pacer.transport_backoff(), Duration::from_secs_f64(MAX_DELAY_SECS));
    }

    #[test]
    fn test_reversed_bounds_are_ordered() {
        let range = DelayRange::new(3.0, 1.0);
        assert_eq!(range.min(), 1.0);
        assert_eq!(range.max(), 3.0);
    }

    #[test]
    fn test_transport_backoff_doubles_politeness() {
        let pacer = Pacer::new(
            DelayRange::new(1.0, 3.0),
            DelayRange::new(10.0, 15.0),
            DelayRange::new(2.0, 4.0),
        );
        for _ in 0..100 {
            let d = pacer.transport_backoff().as_secs_f64();
            assert!((2.0..=6.0).contains(&d), "backoff {}", d);
        }
    }

    #[test]
    fn test_from_default_config() {
        let pacer = Pacer::default();
        for _ in 0..50 {
            let cooldown = pacer.block_cooldown().as_secs_f64();
            assert!((10.0..=15.0).contains(&cooldown));
            let pause = pacer.page_pause().as_secs_f64();
            assert!((2.0..=4.0).contains(&pause));
        }
    }

    #[tokio::test]
    async fn test_immediate_pacer_does_not_wait() {
        let pacer = Pacer::immediate();
        let start = std::time::Instant::now();
        pacer.pause(pacer.politeness_delay()).await;
        pacer.pause(pacer.transport_backoff()).await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }
}
