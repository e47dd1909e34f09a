//! Path buffer configuration.
//!
//! The thresholds and trim fraction are uncalibrated defaults. Long
//! recordings may want different values.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::effect::clamp_or_f64;

/// Bounded trail history settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct PathBufferConfig {
    /// Hard cap on stored points.
    pub max_size: u32,
    /// Length at which only every 2nd point is stored.
    pub medium_threshold: u32,
    /// Length at which only every 3rd point is stored.
    pub high_threshold: u32,
    /// Fraction of `max_size` kept when the buffer overflows.
    pub trim_fraction: f64,
}

impl Default for PathBufferConfig {
    fn default() -> Self {
        Self {
            max_size: 5000,
            medium_threshold: 3000,
            high_threshold: 4000,
            trim_fraction: 0.8,
        }
    }
}

impl PathBufferConfig {
    /// Validate and clamp settings to acceptable ranges.
    ///
    /// Keeps `medium_threshold <= high_threshold <= max_size`.
    pub fn validate(&mut self) {
        self.max_size = self.max_size.clamp(10, 1_000_000);
        self.high_threshold = self.high_threshold.min(self.max_size);
        self.medium_threshold = self.medium_threshold.min(self.high_threshold);
        self.trim_fraction = clamp_or_f64(self.trim_fraction, 0.1, 0.95, 0.8);
    }

    /// Number of points retained after a trim.
    pub fn retained_len(&self) -> usize {
        (self.max_size as f64 * self.trim_fraction).floor() as usize
    }
}
