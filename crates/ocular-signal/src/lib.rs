//! Ocular Signal Simulation
//!
//! Produces the per-frame signals a driver-facing vision pipeline would report:
//! - Eye aspect ratio (EAR), the openness proxy used for drowsiness
//! - Blink rate estimate (blinks/minute)
//! - Head pose (yaw, pitch, roll) in degrees
//!
//! Every value is a pure function of the frame counter and the cycle length,
//! so sequences are replayable.

mod generator;

pub use generator::{
    calculate_blink_rate, calculate_ear, calculate_head_pose, cycle_position, generate,
    SignalGenerator, DEFAULT_CYCLE_LENGTH, DROWSY_BLINK_RATE, DROWSY_EAR, NORMAL_BLINK_RATE,
    NORMAL_EAR,
};

use serde::{Deserialize, Serialize};

/// Head pose (Euler angles)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HeadPose {
    /// Yaw (left-right rotation) in degrees
    pub yaw: f64,
    /// Pitch (up-down tilt) in degrees
    pub pitch: f64,
    /// Roll (side tilt) in degrees
    pub roll: f64,
}

/// Phase of the repeating drowsiness cycle a frame falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CyclePhase {
    /// `position < 0.6`: eyes open, steady blinking
    Attentive,
    /// `0.6 <= position < 0.8`: EAR and blink rate falling
    Declining,
    /// `position >= 0.8`: eyes nearly closed, head nodding
    Drowsy,
}

/// One frame worth of simulated ocular signals
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalSample {
    /// Frame counter the sample was generated for
    pub frame: u64,
    /// Phase within the cycle, in [0, 1)
    pub position: f64,
    /// Eye aspect ratio, in [0, 1]
    pub ear: f64,
    /// Blinks per minute, in [0, 60]
    pub blink_rate: f64,
    /// Head orientation
    pub head_pose: HeadPose,
}

impl SignalSample {
    /// Build a sample from raw signal values (frame and position zeroed)
    pub fn new(ear: f64, blink_rate: f64, head_pose: HeadPose) -> Self {
        Self {
            frame: 0,
            position: 0.0,
            ear,
            blink_rate,
            head_pose,
        }
    }

    /// Cycle phase this sample was generated in
    pub fn phase(&self) -> CyclePhase {
        CyclePhase::of(self.position)
    }
}

impl CyclePhase {
    /// Phase for a cycle position in [0, 1)
    pub fn of(position: f64) -> Self {
        if position < generator::DECLINE_START {
            CyclePhase::Attentive
        } else if position < generator::DECLINE_END {
            CyclePhase::Declining
        } else {
            CyclePhase::Drowsy
        }
    }
}
