//! Cycle-driven signal generator

use std::num::NonZeroU32;

use crate::{HeadPose, SignalSample};

/// Open-eye EAR (typical alert range 0.25-0.30)
pub const NORMAL_EAR: f64 = 0.28;
/// Nearly-closed EAR reached in the drowsy phase
pub const DROWSY_EAR: f64 = 0.15;
/// Blinks per minute while attentive
pub const NORMAL_BLINK_RATE: f64 = 15.0;
/// Blinks per minute once drowsy
pub const DROWSY_BLINK_RATE: f64 = 5.0;

/// Default cycle: 18 frames (10 attentive, then decline, then drowsy)
pub const DEFAULT_CYCLE_LENGTH: NonZeroU32 = match NonZeroU32::new(18) {
    Some(n) => n,
    None => unreachable!(),
};

pub(crate) const DECLINE_START: f64 = 0.6;
pub(crate) const DECLINE_END: f64 = 0.8;
const DECLINE_SPAN: f64 = 0.2;

const YAW_AMPLITUDE: f64 = 10.0;
const ROLL_AMPLITUDE: f64 = 5.0;
const RESTING_PITCH_AMPLITUDE: f64 = 5.0;
const NODDING_PITCH_AMPLITUDE: f64 = 20.0;

/// Position of `frame` within the cycle, in [0, 1)
pub fn cycle_position(frame: u64, cycle_length: NonZeroU32) -> f64 {
    let len = u64::from(cycle_length.get());
    (frame % len) as f64 / len as f64
}

/// Three-segment shape: `from` until 0.6, linear to `to` by 0.8, then `to`
fn declining(position: f64, from: f64, to: f64) -> f64 {
    if position < DECLINE_START {
        from
    } else if position < DECLINE_END {
        let progress = (position - DECLINE_START) / DECLINE_SPAN;
        (from - progress * (from - to)).max(to)
    } else {
        to
    }
}

/// Simulated eye aspect ratio for a frame
pub fn calculate_ear(frame: u64, cycle_length: NonZeroU32) -> f64 {
    declining(cycle_position(frame, cycle_length), NORMAL_EAR, DROWSY_EAR)
}

/// Simulated blink rate (blinks/minute) for a frame
pub fn calculate_blink_rate(frame: u64, cycle_length: NonZeroU32) -> f64 {
    declining(
        cycle_position(frame, cycle_length),
        NORMAL_BLINK_RATE,
        DROWSY_BLINK_RATE,
    )
}

/// Simulated head pose; pitch amplitude jumps in the drowsy phase (nodding)
pub fn calculate_head_pose(frame: u64, position: f64) -> HeadPose {
    let f = frame as f64;
    let pitch_amplitude = if position >= DECLINE_END {
        NODDING_PITCH_AMPLITUDE
    } else {
        RESTING_PITCH_AMPLITUDE
    };

    HeadPose {
        yaw: YAW_AMPLITUDE * (f / 5.0).sin(),
        pitch: pitch_amplitude * (f / 2.0).sin(),
        roll: ROLL_AMPLITUDE * (f / 7.0).sin(),
    }
}

/// Generate the full sample for a frame
pub fn generate(frame: u64, cycle_length: NonZeroU32) -> SignalSample {
    let position = cycle_position(frame, cycle_length);

    SignalSample {
        frame,
        position,
        ear: declining(position, NORMAL_EAR, DROWSY_EAR),
        blink_rate: declining(position, NORMAL_BLINK_RATE, DROWSY_BLINK_RATE),
        head_pose: calculate_head_pose(frame, position),
    }
}

/// Generator bound to a fixed cycle length
#[derive(Debug, Clone, Copy)]
pub struct SignalGenerator {
    cycle_length: NonZeroU32,
}

impl SignalGenerator {
    /// Create a generator for the given cycle length
    pub fn new(cycle_length: NonZeroU32) -> Self {
        Self { cycle_length }
    }

    /// Cycle length in frames
    pub fn cycle_length(&self) -> NonZeroU32 {
        self.cycle_length
    }

    /// Sample for a frame
    pub fn sample(&self, frame: u64) -> SignalSample {
        generate(frame, self.cycle_length)
    }
}

impl Default for SignalGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_CYCLE_LENGTH)
    }
}
