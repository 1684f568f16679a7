//! Threshold-based state classifier

use ocular_signal::SignalSample;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{SafetyState, Thresholds};

/// Source of confidence jitter, yielding values in [0, 1)
///
/// Any `rand` generator works; seed it for reproducible confidences.
pub trait JitterSource {
    fn next_unit(&mut self) -> f64;
}

impl<R: rand::RngCore> JitterSource for R {
    fn next_unit(&mut self) -> f64 {
        rand::Rng::gen::<f64>(self)
    }
}

/// Jitter source that always yields the same value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantJitter(f64);

impl ConstantJitter {
    /// Fixed jitter; `None` unless `value` lies in [0, 1)
    pub fn new(value: f64) -> Option<Self> {
        (0.0..1.0).contains(&value).then_some(Self(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl JitterSource for ConstantJitter {
    fn next_unit(&mut self) -> f64 {
        self.0
    }
}

/// Confidence band `[floor, floor + span)` for a state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceBand {
    pub floor: f64,
    pub span: f64,
}

impl ConfidenceBand {
    /// Band assigned to each classified state
    pub fn for_state(state: SafetyState) -> Self {
        match state {
            SafetyState::Alert => Self { floor: 0.85, span: 0.15 },
            SafetyState::Warning => Self { floor: 0.75, span: 0.15 },
            SafetyState::Danger => Self { floor: 0.90, span: 0.10 },
        }
    }

    /// Pick a confidence inside the band.
    ///
    /// Units a source yields outside [0, 1) are pinned to the band edges.
    pub fn sample<J: JitterSource + ?Sized>(&self, jitter: &mut J) -> f64 {
        let unit = jitter.next_unit();
        let unit = if unit.is_nan() { 0.0 } else { unit.max(0.0) };
        let confidence = self.floor + unit * self.span;
        confidence.min(self.floor + self.span - f64::EPSILON)
    }

    /// Check whether a confidence lies inside the band
    pub fn contains(&self, confidence: f64) -> bool {
        confidence >= self.floor && confidence < self.floor + self.span
    }
}

/// Result of classifying one sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub state: SafetyState,
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// Sample the state was derived from
    pub sample: SignalSample,
}

/// Maps ocular signals to a safety state using ordered threshold rules
#[derive(Debug, Clone, Copy, Default)]
pub struct StateClassifier {
    thresholds: Thresholds,
}

impl StateClassifier {
    /// Create a classifier with the given thresholds
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    /// Active thresholds
    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Classify a sample; first matching rule wins
    ///
    /// 1. `ear < ear_danger` -> Danger
    /// 2. `ear < ear_warning` -> Warning
    /// 3. `|pitch| > pitch_warning` -> Warning
    /// 4. otherwise Alert
    ///
    /// Blink rate is carried in the sample but does not take part in the rules.
    pub fn classify(&self, sample: &SignalSample) -> SafetyState {
        if sample.ear < self.thresholds.ear_danger {
            SafetyState::Danger
        } else if sample.ear < self.thresholds.ear_warning {
            SafetyState::Warning
        } else if sample.head_pose.pitch.abs() > self.thresholds.pitch_warning {
            SafetyState::Warning
        } else {
            SafetyState::Alert
        }
    }

    /// Classify a sample and attach a confidence drawn from the state's band
    pub fn assess<J: JitterSource + ?Sized>(
        &self,
        sample: SignalSample,
        jitter: &mut J,
    ) -> Classification {
        let state = self.classify(&sample);
        let confidence = ConfidenceBand::for_state(state).sample(jitter);

        debug!(
            "Frame {}: ear={:.3} pitch={:.1} -> {} (conf={:.2})",
            sample.frame, sample.ear, sample.head_pose.pitch, state, confidence
        );

        Classification {
            state,
            confidence,
            sample,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ocular_signal::{generate, HeadPose, DEFAULT_CYCLE_LENGTH};
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn sample(ear: f64, pitch: f64) -> SignalSample {
        SignalSample::new(
            ear,
            15.0,
            HeadPose {
                pitch,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_rule_order() {
        let classifier = StateClassifier::default();

        assert_eq!(classifier.classify(&sample(0.28, 0.0)), SafetyState::Alert);
        assert_eq!(classifier.classify(&sample(0.20, 0.0)), SafetyState::Warning);
        assert_eq!(classifier.classify(&sample(0.10, 0.0)), SafetyState::Danger);
        // Low EAR wins over nodding
        assert_eq!(classifier.classify(&sample(0.10, 30.0)), SafetyState::Danger);
    }

    #[test]
    fn test_threshold_boundaries() {
        let classifier = StateClassifier::default();

        assert_eq!(classifier.classify(&sample(0.18, 0.0)), SafetyState::Warning);
        assert_eq!(classifier.classify(&sample(0.21, 0.0)), SafetyState::Alert);
        assert_eq!(classifier.classify(&sample(0.25, 15.0)), SafetyState::Alert);
        assert_eq!(classifier.classify(&sample(0.25, -15.1)), SafetyState::Warning);
    }

    #[test]
    fn test_confidence_exact_for_seed() {
        let classifier = StateClassifier::default();
        let mut rng = StdRng::seed_from_u64(7);
        let mut expected_rng = StdRng::seed_from_u64(7);

        let alert = classifier.assess(sample(0.28, 0.0), &mut rng);
        assert_eq!(alert.confidence, 0.85 + expected_rng.gen::<f64>() * 0.15);

        let danger = classifier.assess(sample(0.10, 0.0), &mut rng);
        assert_eq!(danger.confidence, 0.90 + expected_rng.gen::<f64>() * 0.10);
    }

    #[test]
    fn test_constant_jitter() {
        let classifier = StateClassifier::default();
        let mut jitter = ConstantJitter::new(0.5).unwrap();
        let warning = classifier.assess(sample(0.20, 0.0), &mut jitter);
        assert_eq!(warning.state, SafetyState::Warning);
        assert!((warning.confidence - 0.825).abs() < 1e-12);
    }

    #[test]
    fn test_constant_jitter_rejects_out_of_range() {
        assert!(ConstantJitter::new(1.0).is_none());
        assert!(ConstantJitter::new(-0.1).is_none());
        assert!(ConstantJitter::new(f64::NAN).is_none());
        assert_eq!(ConstantJitter::new(0.0).map(|j| j.value()), Some(0.0));
    }

    struct Saturated(f64);

    impl JitterSource for Saturated {
        fn next_unit(&mut self) -> f64 {
            self.0
        }
    }

    #[test]
    fn test_band_pins_out_of_range_units() {
        for state in SafetyState::ALL {
            let band = ConfidenceBand::for_state(state);
            for unit in [1.0, 7.5, -3.0, f64::NAN, f64::INFINITY] {
                let confidence = band.sample(&mut Saturated(unit));
                assert!(band.contains(confidence), "{state} {unit} -> {confidence}");
            }
        }
        assert_eq!(
            ConfidenceBand::for_state(SafetyState::Alert).sample(&mut Saturated(-1.0)),
            0.85
        );
    }

    #[test]
    fn test_default_cycle_states() {
        let classifier = StateClassifier::default();
        let states: Vec<_> = (0..18)
            .map(|frame| classifier.classify(&generate(frame, DEFAULT_CYCLE_LENGTH)))
            .collect();

        assert!(states[..=12].iter().all(|s| *s == SafetyState::Alert));
        assert_eq!(states[13], SafetyState::Warning);
        assert!(states[14..].iter().all(|s| *s == SafetyState::Danger));
    }

    #[test]
    fn test_custom_thresholds() {
        let classifier = StateClassifier::new(Thresholds::strict());
        assert_eq!(classifier.classify(&sample(0.22, 0.0)), SafetyState::Warning);
        assert_eq!(classifier.classify(&sample(0.25, 13.0)), SafetyState::Warning);
    }

    proptest! {
        #[test]
        fn classify_is_pure(ear in 0.0f64..1.0, pitch in -30.0f64..30.0) {
            let classifier = StateClassifier::default();
            let s = sample(ear, pitch);
            prop_assert_eq!(classifier.classify(&s), classifier.classify(&s));
        }

        #[test]
        fn confidence_stays_in_band(ear in 0.0f64..1.0, pitch in -30.0f64..30.0, seed in any::<u64>()) {
            let classifier = StateClassifier::default();
            let mut rng = StdRng::seed_from_u64(seed);
            let result = classifier.assess(sample(ear, pitch), &mut rng);
            prop_assert!(ConfidenceBand::for_state(result.state).contains(result.confidence));
        }
    }
}
