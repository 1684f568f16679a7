//! Session Statistics
//!
//! Aggregates a timestamped stream of safety states into:
//! - Per-state percentages over a trailing window (default 60s)
//! - A gap-filled alertness trend bucketed into fixed intervals (default 5s)
//! - Session duration and elevated-state episode counts

mod aggregator;
mod chart;
mod error;
mod window;

pub use aggregator::{SessionAggregator, WindowSnapshot};
pub use chart::format_bucket_label;
pub use error::WindowError;
pub use window::{WindowConfig, DEFAULT_BUCKET, DEFAULT_WINDOW};

use drowsiness::SafetyState;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// One observed state in the session log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusLogEntry {
    pub timestamp: Instant,
    pub state: SafetyState,
}

/// One point of the alertness trend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    /// `mm:ss` of the bucket start, measured from the first recorded entry
    pub bucket_label: String,
    /// Mean alertness score of the bucket, in [0, 100]
    pub alertness_value: f64,
}

/// Windowed session statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatistics {
    pub alert_pct: u8,
    pub warning_pct: u8,
    pub danger_pct: u8,
    /// Seconds since the first entry ever recorded (not just the visible window)
    pub duration_seconds: u32,
}

impl Default for SessionStatistics {
    fn default() -> Self {
        Self {
            alert_pct: 100,
            warning_pct: 0,
            danger_pct: 0,
            duration_seconds: 0,
        }
    }
}

impl SessionStatistics {
    /// Percentage for a single state
    pub fn pct(&self, state: SafetyState) -> u8 {
        match state {
            SafetyState::Alert => self.alert_pct,
            SafetyState::Warning => self.warning_pct,
            SafetyState::Danger => self.danger_pct,
        }
    }
}

/// Number of transitions into an elevated state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeCounts {
    pub warning: u32,
    pub danger: u32,
}
