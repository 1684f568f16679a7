//! Drowsiness Monitor
//!
//! Wires the signal generator, the state classifier, and the session
//! aggregator into a monitoring session:
//! - Validated configuration (file + environment layers)
//! - Explicit start / stop / reset lifecycle
//! - Periodic drive loop publishing tick reports and state changes

pub mod config;
pub mod driver;
mod error;
pub mod session;

pub use crate::config::{load_layered, EngineSettings, MonitorConfig};
pub use driver::{DriveHandle, DriveLoop, SharedSession, StateChange, TickReport};
pub use error::ConfigError;
pub use session::MonitorSession;

pub use drowsiness::{Classification, SafetyState, Sensitivity, Thresholds};
pub use session_stats::{ChartPoint, EpisodeCounts, SessionStatistics, WindowSnapshot};
