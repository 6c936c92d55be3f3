use std::ops::RangeInclusive;
use std::time::Duration;

use serde::Serialize;

pub const CAPACITY_BOUNDS: RangeInclusive<usize> = 1..=100;
pub const THRESHOLD_BOUNDS: RangeInclusive<u32> = 1..=255;
pub const INTERVAL_MS_BOUNDS: RangeInclusive<u64> = 1..=1000;

pub const DEFAULT_CAPACITY: usize = 10;
pub const DEFAULT_THRESHOLD: u32 = 10;
pub const DEFAULT_INTERVAL_MS: u64 = 1000;

/// The numeric capture settings: history capacity, difference threshold and
/// tick interval.
///
/// Only constructible inside the declared bounds, so an engine never holds
/// an out-of-range value. Settings are replaced as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Settings {
    capacity: usize,
    threshold: u32,
    interval_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            threshold: DEFAULT_THRESHOLD,
            interval_ms: DEFAULT_INTERVAL_MS,
        }
    }
}

impl Settings {
    /// Validate all three fields; rejects the whole set if any is out of range.
    pub fn new(capacity: usize, threshold: u32, interval_ms: u64) -> Result<Self, SettingsError> {
        if !CAPACITY_BOUNDS.contains(&capacity) {
            return Err(SettingsError::OutOfBounds {
                field: "capacity",
                value: capacity as i64,
                min: *CAPACITY_BOUNDS.start() as i64,
                max: *CAPACITY_BOUNDS.end() as i64,
            });
        }
        if !THRESHOLD_BOUNDS.contains(&threshold) {
            return Err(SettingsError::OutOfBounds {
                field: "threshold",
                value: threshold as i64,
                min: *THRESHOLD_BOUNDS.start() as i64,
                max: *THRESHOLD_BOUNDS.end() as i64,
            });
        }
        if !INTERVAL_MS_BOUNDS.contains(&interval_ms) {
            return Err(SettingsError::OutOfBounds {
                field: "interval_ms",
                value: interval_ms as i64,
                min: *INTERVAL_MS_BOUNDS.start() as i64,
                max: *INTERVAL_MS_BOUNDS.end() as i64,
            });
        }
        Ok(Self {
            capacity,
            threshold,
            interval_ms,
        })
    }

    /// Spin-box behaviour: pin each value into its range.
    pub fn clamped(capacity: i64, threshold: i64, interval_ms: i64) -> Self {
        let clamp = |v: i64, lo: i64, hi: i64| v.clamp(lo, hi);
        Self {
            capacity: clamp(
                capacity,
                *CAPACITY_BOUNDS.start() as i64,
                *CAPACITY_BOUNDS.end() as i64,
            ) as usize,
            threshold: clamp(
                threshold,
                *THRESHOLD_BOUNDS.start() as i64,
                *THRESHOLD_BOUNDS.end() as i64,
            ) as u32,
            interval_ms: clamp(
                interval_ms,
                *INTERVAL_MS_BOUNDS.start() as i64,
                *INTERVAL_MS_BOUNDS.end() as i64,
            ) as u64,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("{field} = {value} is outside [{min}, {max}]")]
    OutOfBounds {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
}
