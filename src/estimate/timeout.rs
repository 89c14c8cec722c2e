use std::time::Duration;

use crate::config::TimeoutConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimeoutBudget {
    pub seconds: u64,
}

impl TimeoutBudget {
    pub fn from_secs(seconds: u64) -> Self {
        Self { seconds }
    }

    pub fn minutes(&self) -> u64 {
        self.seconds / 60
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.seconds)
    }
}

/// Adaptive timeout: `minutes_per_gb * (gb + 1)` minutes, never below the floor.
/// The `+ 1` is a fixed per-run overhead that does not depend on size.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutPlanner {
    minutes_per_gb: f64,
    minimum_secs: u64,
}

impl TimeoutPlanner {
    pub fn new(minutes_per_gb: f64, minimum_secs: u64) -> Self {
        Self {
            minutes_per_gb: minutes_per_gb.max(0.0),
            minimum_secs,
        }
    }

    pub fn from_config(config: &TimeoutConfig) -> Self {
        Self::new(config.minutes_per_gb, config.minimum_secs)
    }

    pub fn plan(&self, gb: f64) -> TimeoutBudget {
        let gb = if gb.is_finite() { gb.max(0.0) } else { 0.0 };
        let minutes = self.minutes_per_gb * (gb + 1.0);
        // Float-to-int `as` saturates, so huge sizes cap at u64::MAX.
        let seconds = (minutes * 60.0) as u64;
        TimeoutBudget::from_secs(seconds.max(self.minimum_secs))
    }
}
