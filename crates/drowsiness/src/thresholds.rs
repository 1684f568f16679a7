//! Classification thresholds

use serde::{Deserialize, Serialize};

/// Threshold set for the state classifier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// EAR below this is at least a warning
    pub ear_warning: f64,

    /// EAR below this is danger
    pub ear_danger: f64,

    /// Absolute head pitch (degrees) above this is a warning (nodding)
    pub pitch_warning: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            ear_warning: 0.21,
            ear_danger: 0.18,
            pitch_warning: 15.0,
        }
    }
}

impl Thresholds {
    /// Create strict thresholds (react earlier)
    pub fn strict() -> Self {
        Self {
            ear_warning: 0.23,
            ear_danger: 0.20,
            pitch_warning: 12.0,
        }
    }

    /// Create lenient thresholds (react later)
    pub fn lenient() -> Self {
        Self {
            ear_warning: 0.19,
            ear_danger: 0.16,
            pitch_warning: 20.0,
        }
    }
}

/// Detection sensitivity preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sensitivity {
    Low,
    #[default]
    Medium,
    High,
}

impl Sensitivity {
    /// Threshold set for this preset
    pub fn thresholds(self) -> Thresholds {
        match self {
            Sensitivity::Low => Thresholds::lenient(),
            Sensitivity::Medium => Thresholds::default(),
            Sensitivity::High => Thresholds::strict(),
        }
    }
}

impl From<Sensitivity> for Thresholds {
    fn from(sensitivity: Sensitivity) -> Self {
        sensitivity.thresholds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_ordered() {
        let low = Sensitivity::Low.thresholds();
        let medium = Sensitivity::Medium.thresholds();
        let high = Sensitivity::High.thresholds();

        assert!(low.ear_danger < medium.ear_danger && medium.ear_danger < high.ear_danger);
        assert!(low.pitch_warning > medium.pitch_warning);
        assert!(high.pitch_warning < medium.pitch_warning);
        assert_eq!(medium, Thresholds::default());
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let thresholds: Thresholds = serde_json::from_str(r#"{"pitch_warning": 10.0}"#).unwrap();
        assert_eq!(thresholds.pitch_warning, 10.0);
        assert_eq!(thresholds.ear_warning, 0.21);
    }
}
