//! Session aggregator over the state log

use std::collections::VecDeque;
use std::time::Instant;

use drowsiness::SafetyState;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chart::bucket_series;
use crate::{ChartPoint, EpisodeCounts, SessionStatistics, StatusLogEntry, WindowConfig};

/// Statistics and trend computed for one point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSnapshot {
    pub statistics: SessionStatistics,
    pub chart: Vec<ChartPoint>,
    pub episodes: EpisodeCounts,
}

/// Owns the append-only state log of one monitoring session
#[derive(Debug, Clone)]
pub struct SessionAggregator {
    config: WindowConfig,
    /// Entries that can still fall inside a window, ascending by timestamp
    log: VecDeque<StatusLogEntry>,
    /// Timestamp of the first entry ever recorded
    first_recorded: Option<Instant>,
    last_state: Option<SafetyState>,
    episodes: EpisodeCounts,
    statistics: SessionStatistics,
    total_recorded: u64,
}

impl SessionAggregator {
    /// Create an empty aggregator
    pub fn new(config: WindowConfig) -> Self {
        Self {
            config,
            log: VecDeque::new(),
            first_recorded: None,
            last_state: None,
            episodes: EpisodeCounts::default(),
            statistics: SessionStatistics::default(),
            total_recorded: 0,
        }
    }

    /// Append an observation. Timestamps must not go backwards.
    pub fn record(&mut self, now: Instant, state: SafetyState) {
        if self.last_state != Some(state) {
            match state {
                SafetyState::Warning => self.episodes.warning += 1,
                SafetyState::Danger => self.episodes.danger += 1,
                SafetyState::Alert => {}
            }
        }
        self.last_state = Some(state);
        self.first_recorded.get_or_insert(now);
        self.total_recorded += 1;

        self.log.push_back(StatusLogEntry {
            timestamp: now,
            state,
        });
        self.prune(now);
    }

    /// Drop entries that no later window can include
    fn prune(&mut self, now: Instant) {
        let window = self.config.window();
        while let Some(front) = self.log.front() {
            if now.saturating_duration_since(front.timestamp) >= window {
                self.log.pop_front();
            } else {
                break;
            }
        }
    }

    /// Recompute statistics and trend for `now`.
    ///
    /// With nothing in the window the previous statistics are kept and the
    /// trend is empty.
    pub fn compute_window(&mut self, now: Instant) -> WindowSnapshot {
        let visible = self.visible(now);

        let (Some(origin), false) = (self.first_recorded, visible.is_empty()) else {
            return WindowSnapshot {
                statistics: self.statistics,
                chart: Vec::new(),
                episodes: self.episodes,
            };
        };

        let total = visible.len() as f64;
        let pct = |state: SafetyState| {
            let count = visible.iter().filter(|e| e.state == state).count() as f64;
            (100.0 * count / total).round() as u8
        };

        self.statistics = SessionStatistics {
            alert_pct: pct(SafetyState::Alert),
            warning_pct: pct(SafetyState::Warning),
            danger_pct: pct(SafetyState::Danger),
            duration_seconds: now.saturating_duration_since(origin).as_secs_f64().round() as u32,
        };

        let chart = bucket_series(&visible, now, &self.config, origin);

        debug!(
            "Window: {} entries, {} buckets, alert={}% warning={}% danger={}%",
            visible.len(),
            chart.len(),
            self.statistics.alert_pct,
            self.statistics.warning_pct,
            self.statistics.danger_pct
        );

        WindowSnapshot {
            statistics: self.statistics,
            chart,
            episodes: self.episodes,
        }
    }

    /// Entries with `now - timestamp < window`
    pub fn visible(&self, now: Instant) -> Vec<StatusLogEntry> {
        let window = self.config.window();
        self.log
            .iter()
            .filter(|e| now.saturating_duration_since(e.timestamp) < window)
            .copied()
            .collect()
    }

    /// Last computed statistics
    pub fn statistics(&self) -> SessionStatistics {
        self.statistics
    }

    /// Elevated-state episode counts
    pub fn episodes(&self) -> EpisodeCounts {
        self.episodes
    }

    /// Most recently recorded state
    pub fn last_state(&self) -> Option<SafetyState> {
        self.last_state
    }

    /// Timestamp of the first recorded entry
    pub fn first_recorded(&self) -> Option<Instant> {
        self.first_recorded
    }

    /// Total entries recorded since creation or reset
    pub fn total_recorded(&self) -> u64 {
        self.total_recorded
    }

    /// Entries currently retained
    pub fn len(&self) -> usize {
        self.log.len()
    }

    /// Check if nothing is retained
    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    /// Window configuration
    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    /// Clear the log and return to session-start defaults
    pub fn reset(&mut self) {
        *self = Self::new(self.config);
    }
}

impl Default for SessionAggregator {
    fn default() -> Self {
        Self::new(WindowConfig::default())
    }
}
