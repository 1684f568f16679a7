//! Sliding window configuration

use std::time::Duration;

use crate::WindowError;

/// Default trailing window (60s)
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Default chart bucket width (5s)
pub const DEFAULT_BUCKET: Duration = Duration::from_secs(5);

/// Trailing window and bucket width for aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowConfig {
    window: Duration,
    bucket: Duration,
}

impl WindowConfig {
    /// Validate and build a window configuration
    pub fn new(window: Duration, bucket: Duration) -> Result<Self, WindowError> {
        if window.is_zero() {
            return Err(WindowError::ZeroWindow);
        }
        if bucket.is_zero() {
            return Err(WindowError::ZeroBucket);
        }
        if bucket > window {
            return Err(WindowError::BucketExceedsWindow { bucket, window });
        }
        Ok(Self { window, bucket })
    }

    /// Trailing window length
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Chart bucket width
    pub fn bucket(&self) -> Duration {
        self.bucket
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            bucket: DEFAULT_BUCKET,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_pairs() {
        assert_eq!(
            WindowConfig::new(Duration::ZERO, DEFAULT_BUCKET),
            Err(WindowError::ZeroWindow)
        );
        assert_eq!(
            WindowConfig::new(DEFAULT_WINDOW, Duration::ZERO),
            Err(WindowError::ZeroBucket)
        );
        assert!(matches!(
            WindowConfig::new(Duration::from_secs(5), Duration::from_secs(10)),
            Err(WindowError::BucketExceedsWindow { .. })
        ));
    }

    #[test]
    fn test_bucket_equal_to_window_is_allowed() {
        let config = WindowConfig::new(DEFAULT_BUCKET, DEFAULT_BUCKET).unwrap();
        assert_eq!(config.window(), config.bucket());
    }
}
