//! Playback configuration.
//!
//! Cadence bounds that were hardcoded in an earlier iteration live here so a
//! visualization can pick its own pace. Out-of-range speeds are clamped, not
//! rejected.

use std::time::Duration;

/// Default interval between automatic ticks.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Fastest allowed playback cadence.
pub const MIN_TICK_INTERVAL: Duration = Duration::from_millis(50);

/// Slowest allowed playback cadence.
pub const MAX_TICK_INTERVAL: Duration = Duration::from_millis(500);

/// Upper bound on the simulated replica lag of the non-linearizable policy.
///
/// The actual delay of each write is drawn uniformly below this cap.
pub const DEFAULT_MAX_PROPAGATION_DELAY: Duration = Duration::from_millis(1000);

/// Cadence bounds for one [`Player`](crate::Player).
#[derive(Debug, Clone)]
pub struct PlayerConfig {
    /// Interval used by `start()` until `set_speed` changes it.
    pub tick_interval: Duration,
    pub min_tick_interval: Duration,
    pub max_tick_interval: Duration,
}

impl PlayerConfig {
    pub fn new(tick_interval: Duration, min: Duration, max: Duration) -> Self {
        Self {
            tick_interval,
            min_tick_interval: min,
            max_tick_interval: max,
        }
    }

    /// Clamp a requested speed into the configured bounds.
    pub fn clamp(&self, interval: Duration) -> Duration {
        interval.clamp(self.min_tick_interval, self.max_tick_interval)
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            min_tick_interval: MIN_TICK_INTERVAL,
            max_tick_interval: MAX_TICK_INTERVAL,
        }
    }
}
