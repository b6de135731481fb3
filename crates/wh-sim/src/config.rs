//! Run configuration.

use wh_core::Seconds;
use wh_fleet::PlannerConfig;

use crate::{SimError, SimResult};

#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimConfig {
    /// Events at or after this time are not processed.
    pub horizon: Seconds,

    /// Master RNG seed.  The same seed always produces identical runs.
    pub seed: u64,

    /// Delay before a robot that could not move tries again.
    pub retry_delay: Seconds,

    /// Drop claims that ended before the current time every this many
    /// simulated seconds.  `0` disables pruning.
    pub prune_interval: Seconds,

    pub planner: PlannerConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            horizon:        600.0,
            seed:           42,
            retry_delay:    1.0,
            prune_interval: 60.0,
            planner:        PlannerConfig::default(),
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> SimResult<()> {
        if self.horizon.is_nan() || self.horizon < 0.0 {
            return Err(SimError::Config(format!("horizon must be non-negative, got {}", self.horizon)));
        }
        if !(self.retry_delay.is_finite() && self.retry_delay > 0.0) {
            return Err(SimError::Config(format!("retry_delay must be positive, got {}", self.retry_delay)));
        }
        if self.prune_interval.is_nan() || self.prune_interval < 0.0 {
            return Err(SimError::Config(format!(
                "prune_interval must be non-negative, got {}",
                self.prune_interval
            )));
        }
        Ok(())
    }
}
