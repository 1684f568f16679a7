//! Drowsiness State Classification
//!
//! Turns continuous ocular signals into a discrete driver safety state:
//! - Ordered threshold rules over EAR and head pitch
//! - Per-state confidence bands with injectable jitter
//! - Sensitivity presets for the threshold set

pub mod classifier;
pub mod state;
pub mod thresholds;

pub use classifier::{Classification, ConfidenceBand, ConstantJitter, JitterSource, StateClassifier};
pub use state::SafetyState;
pub use thresholds::{Sensitivity, Thresholds};
