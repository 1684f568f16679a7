//! Window configuration errors

use std::time::Duration;
use thiserror::Error;

/// Invalid window/bucket configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowError {
    #[error("window length must be greater than zero")]
    ZeroWindow,

    #[error("bucket length must be greater than zero")]
    ZeroBucket,

    #[error("bucket length {bucket:?} exceeds window length {window:?}")]
    BucketExceedsWindow { bucket: Duration, window: Duration },
}
