//! Monitoring session lifecycle

use std::time::{Duration, Instant};

use drowsiness::{Classification, JitterSource, SafetyState, StateClassifier};
use ocular_signal::SignalGenerator;
use rand::rngs::StdRng;
use rand::SeedableRng;
use session_stats::{
    ChartPoint, EpisodeCounts, SessionAggregator, SessionStatistics, WindowSnapshot,
};
use tracing::{debug, info};

use crate::{ConfigError, MonitorConfig};

/// One driver monitoring session
///
/// Owns the frame counter, the classifier, and the state log. All methods are
/// synchronous; share it across tasks through [`crate::SharedSession`].
pub struct MonitorSession {
    config: MonitorConfig,
    generator: SignalGenerator,
    classifier: StateClassifier,
    aggregator: SessionAggregator,
    jitter: Box<dyn JitterSource + Send>,
    tick_period: Duration,
    frame: u64,
    active: bool,
    last: Option<Classification>,
}

impl MonitorSession {
    /// Create a stopped session from a validated configuration
    pub fn new(config: MonitorConfig) -> Result<Self, ConfigError> {
        let settings = config.validate()?;

        let jitter: Box<dyn JitterSource + Send> = match config.jitter_seed {
            Some(seed) => Box::new(StdRng::seed_from_u64(seed)),
            None => Box::new(StdRng::from_entropy()),
        };

        info!(
            "Creating monitor session: cycle={} frames, tick={:?}, window={:?}, bucket={:?}",
            settings.cycle_length,
            settings.tick_period,
            settings.window.window(),
            settings.window.bucket()
        );

        Ok(Self {
            generator: SignalGenerator::new(settings.cycle_length),
            classifier: StateClassifier::new(settings.thresholds),
            aggregator: SessionAggregator::new(settings.window),
            jitter,
            tick_period: settings.tick_period,
            frame: 0,
            active: false,
            last: None,
            config,
        })
    }

    /// Replace the confidence jitter source
    pub fn with_jitter(mut self, jitter: impl JitterSource + Send + 'static) -> Self {
        self.jitter = Box::new(jitter);
        self
    }

    /// Begin (or resume) monitoring. Returns false if already active.
    pub fn start_session(&mut self) -> bool {
        if self.active {
            return false;
        }
        self.active = true;
        info!("Monitoring started at frame {}", self.frame);
        true
    }

    /// Halt monitoring; the log and statistics are kept. Returns false if already stopped.
    pub fn stop_session(&mut self) -> bool {
        if !self.active {
            return false;
        }
        self.active = false;
        info!(
            "Monitoring stopped after {} frames ({} entries recorded)",
            self.frame,
            self.aggregator.total_recorded()
        );
        true
    }

    /// Clear the log, the frame counter, and the statistics
    pub fn reset_session(&mut self) {
        self.aggregator.reset();
        self.frame = 0;
        self.last = None;
        info!("Session reset");
    }

    /// Advance one frame at the current time
    pub fn on_tick(&mut self) -> Option<Classification> {
        self.tick_at(Instant::now())
    }

    /// Advance one frame, classify it, and record the state at `now`.
    ///
    /// Returns `None` without touching the log while the session is stopped.
    pub fn tick_at(&mut self, now: Instant) -> Option<Classification> {
        if !self.active {
            debug!("Tick ignored: session not active");
            return None;
        }

        let sample = self.generator.sample(self.frame);
        let classification = self.classifier.assess(sample, self.jitter.as_mut());
        let previous = self.current_state();

        self.aggregator.record(now, classification.state);
        self.frame += 1;
        self.last = Some(classification);

        metrics::counter!("monitor_ticks_total", "state" => classification.state.as_str())
            .increment(1);
        if previous != classification.state {
            info!(
                "Driver state {} -> {} (conf={:.2})",
                previous, classification.state, classification.confidence
            );
            metrics::counter!(
                "monitor_state_transitions_total",
                "to" => classification.state.as_str()
            )
            .increment(1);
        }

        Some(classification)
    }

    /// Statistics and trend for `now`
    pub fn snapshot(&mut self, now: Instant) -> WindowSnapshot {
        let snapshot = self.aggregator.compute_window(now);
        metrics::gauge!("monitor_alertness_pct").set(f64::from(snapshot.statistics.alert_pct));
        snapshot
    }

    /// Windowed statistics for `now`
    pub fn get_statistics(&mut self, now: Instant) -> SessionStatistics {
        self.snapshot(now).statistics
    }

    /// Trend series for `now`
    pub fn get_chart_series(&mut self, now: Instant) -> Vec<ChartPoint> {
        self.snapshot(now).chart
    }

    /// Most recent state (`Alert` before the first tick)
    pub fn current_state(&self) -> SafetyState {
        self.last.map(|c| c.state).unwrap_or_default()
    }

    /// Most recent classification
    pub fn last_classification(&self) -> Option<&Classification> {
        self.last.as_ref()
    }

    /// Elevated-state episode counts since the last reset
    pub fn episodes(&self) -> EpisodeCounts {
        self.aggregator.episodes()
    }

    /// Check if monitoring is active
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Next frame to be generated
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Entries recorded since the last reset
    pub fn recorded(&self) -> u64 {
        self.aggregator.total_recorded()
    }

    /// Configured drive loop period
    pub fn tick_period(&self) -> Duration {
        self.tick_period
    }

    /// Configuration the session was built from
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }
}

impl std::fmt::Debug for MonitorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorSession")
            .field("frame", &self.frame)
            .field("active", &self.active)
            .field("current_state", &self.current_state())
            .field("recorded", &self.aggregator.total_recorded())
            .finish()
    }
}
