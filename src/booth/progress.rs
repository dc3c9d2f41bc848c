//! Simulated progress for the single outstanding request

use std::time::Duration;

use crate::config::BoothConfig;

/// Progress reported once an operation has finished
pub const COMPLETE: u8 = 100;

/// Linear progress that advances in fixed steps and stalls below completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressCurve {
    pub step: u8,
    pub interval: Duration,
    pub cap: u8,
}

impl ProgressCurve {
    pub fn from_config(config: &BoothConfig) -> Self {
        Self {
            step: config.progress_step,
            interval: Duration::from_millis(config.progress_interval_ms.max(1)),
            cap: config.progress_cap.min(COMPLETE),
        }
    }

    /// Percentage shown after `elapsed` of an in-flight request
    pub fn at(&self, elapsed: Duration) -> u8 {
        let ticks = elapsed.as_millis() / self.interval.as_millis().max(1);
        let value = ticks.saturating_mul(u128::from(self.step));
        value.min(u128::from(self.cap)) as u8
    }
}

impl Default for ProgressCurve {
    fn default() -> Self {
        Self::from_config(&BoothConfig::default())
    }
}
