//! Periodic drive loop

use std::sync::Arc;
use std::time::Duration;

use drowsiness::{Classification, SafetyState};
use serde::{Deserialize, Serialize};
use session_stats::WindowSnapshot;
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::{ConfigError, MonitorSession};

/// Session shared between the drive loop and readers.
///
/// Appends and snapshots both happen under this one lock.
pub type SharedSession = Arc<Mutex<MonitorSession>>;

/// Capacity of the state change channel
const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Published after every tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickReport {
    pub classification: Classification,
    pub snapshot: WindowSnapshot,
}

/// Published when the classified state differs from the previous tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateChange {
    pub from: SafetyState,
    pub to: SafetyState,
    pub confidence: f64,
    pub frame: u64,
}

/// Drives a session on a fixed period
pub struct DriveLoop {
    session: SharedSession,
    period: Duration,
    reports: watch::Sender<Option<TickReport>>,
    changes: broadcast::Sender<StateChange>,
}

impl DriveLoop {
    /// Create a loop ticking `session` every `period`; the period must be non-zero
    pub fn new(session: SharedSession, period: Duration) -> Result<Self, ConfigError> {
        if period.is_zero() {
            return Err(ConfigError::invalid("tick_period_ms", "must be greater than 0"));
        }

        let (reports, _) = watch::channel(None);
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(Self {
            session,
            period,
            reports,
            changes,
        })
    }

    /// Latest tick report (for presentation refresh)
    pub fn subscribe_reports(&self) -> watch::Receiver<Option<TickReport>> {
        self.reports.subscribe()
    }

    /// State change notifications (for alert sounds or toasts)
    pub fn subscribe_changes(&self) -> broadcast::Receiver<StateChange> {
        self.changes.subscribe()
    }

    /// Spawn the loop on the current runtime
    pub fn spawn(self) -> DriveHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let reports = self.reports.subscribe();
        let changes = self.changes.clone();
        let task = tokio::spawn(self.run(shutdown_rx));

        DriveHandle {
            shutdown: shutdown_tx,
            task,
            reports,
            changes,
        }
    }

    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!("Starting drive loop (period {:?})", self.period);

        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = interval.tick() => self.tick().await,
            }
        }

        info!("Drive loop stopped");
    }

    async fn tick(&self) {
        let now = Instant::now().into_std();

        let (classification, snapshot, previous) = {
            let mut session = self.session.lock().await;
            let previous = session.current_state();
            let Some(classification) = session.tick_at(now) else {
                return;
            };
            (classification, session.snapshot(now), previous)
        };

        if previous != classification.state {
            // No subscribers is fine
            let _ = self.changes.send(StateChange {
                from: previous,
                to: classification.state,
                confidence: classification.confidence,
                frame: classification.sample.frame,
            });
        }

        debug!(
            "Tick frame {}: {} alert={}%",
            classification.sample.frame, classification.state, snapshot.statistics.alert_pct
        );

        self.reports.send_replace(Some(TickReport {
            classification,
            snapshot,
        }));
    }
}

/// Handle to a running drive loop
pub struct DriveHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
    reports: watch::Receiver<Option<TickReport>>,
    changes: broadcast::Sender<StateChange>,
}

impl DriveHandle {
    /// Signal the loop and wait for it to exit (at most one period).
    ///
    /// A tick already in progress completes first.
    pub async fn stop(self) {
        self.request_stop();
        if let Err(e) = self.task.await {
            warn!("Drive loop task ended abnormally: {}", e);
        }
    }

    /// Signal the loop without waiting for it to exit
    pub fn request_stop(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Latest tick report
    pub fn reports(&self) -> watch::Receiver<Option<TickReport>> {
        self.reports.clone()
    }

    /// State change notifications
    pub fn subscribe_changes(&self) -> broadcast::Receiver<StateChange> {
        self.changes.subscribe()
    }

    /// Check if the loop task has exited
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
