//! Driver safety state

use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete driver safety state
///
/// Ordered by severity (`Alert < Warning < Danger`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SafetyState {
    /// Eyes open, driver attentive
    #[default]
    Alert,
    /// Eyes closing or head nodding
    Warning,
    /// Eyes closed
    Danger,
}

impl SafetyState {
    /// All states in severity order
    pub const ALL: [SafetyState; 3] = [SafetyState::Alert, SafetyState::Warning, SafetyState::Danger];

    /// Alertness score used for trend charts (0-100)
    pub fn score(self) -> f64 {
        match self {
            SafetyState::Alert => 100.0,
            SafetyState::Warning => 50.0,
            SafetyState::Danger => 10.0,
        }
    }

    /// Stable lowercase name (metrics labels, logs)
    pub fn as_str(self) -> &'static str {
        match self {
            SafetyState::Alert => "alert",
            SafetyState::Warning => "warning",
            SafetyState::Danger => "danger",
        }
    }

    /// Whether this state needs the driver's attention
    pub fn is_elevated(self) -> bool {
        self > SafetyState::Alert
    }
}

impl fmt::Display for SafetyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(SafetyState::Alert < SafetyState::Warning);
        assert!(SafetyState::Warning < SafetyState::Danger);
        assert_eq!(SafetyState::ALL.iter().max(), Some(&SafetyState::Danger));
    }

    #[test]
    fn test_scores() {
        assert_eq!(SafetyState::Alert.score(), 100.0);
        assert_eq!(SafetyState::Warning.score(), 50.0);
        assert_eq!(SafetyState::Danger.score(), 10.0);
    }

    #[test]
    fn test_default_is_alert() {
        assert_eq!(SafetyState::default(), SafetyState::Alert);
        assert!(!SafetyState::Alert.is_elevated());
        assert!(SafetyState::Danger.is_elevated());
    }
}
