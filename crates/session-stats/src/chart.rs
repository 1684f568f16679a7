//! Alertness trend bucketing

use std::time::{Duration, Instant};

use crate::{ChartPoint, StatusLogEntry, WindowConfig};

/// Format an offset as `mm:ss`
pub fn format_bucket_label(offset: Duration) -> String {
    let secs = offset.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Bucket the visible log into a gap-filled trend series.
///
/// `visible` must be ascending by timestamp and non-empty. Buckets start at
/// `max(now - window, earliest visible)` and step by the bucket width up to
/// and including `now`. Empty buckets repeat the previous value; leading
/// empty buckets are omitted.
pub(crate) fn bucket_series(
    visible: &[StatusLogEntry],
    now: Instant,
    config: &WindowConfig,
    origin: Instant,
) -> Vec<ChartPoint> {
    let Some(earliest) = visible.first().map(|e| e.timestamp) else {
        return Vec::new();
    };

    let start = now
        .checked_sub(config.window())
        .map_or(earliest, |cutoff| cutoff.max(earliest));

    let mut points = Vec::new();
    let mut last_value: Option<f64> = None;
    let mut cursor = 0;
    let mut t = start;

    while t <= now {
        let end = t + config.bucket();

        // Skip entries that precede this bucket (only possible for the first one)
        while cursor < visible.len() && visible[cursor].timestamp < t {
            cursor += 1;
        }

        let mut sum = 0.0;
        let mut count = 0usize;
        while cursor < visible.len() && visible[cursor].timestamp < end {
            sum += visible[cursor].state.score();
            count += 1;
            cursor += 1;
        }

        let value = if count > 0 {
            Some(sum / count as f64)
        } else {
            last_value
        };

        if let Some(alertness_value) = value {
            points.push(ChartPoint {
                bucket_label: format_bucket_label(t.saturating_duration_since(origin)),
                alertness_value,
            });
            last_value = Some(alertness_value);
        }

        t = end;
    }

    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use drowsiness::SafetyState;

    fn entry(base: Instant, secs: u64, state: SafetyState) -> StatusLogEntry {
        StatusLogEntry {
            timestamp: base + Duration::from_secs(secs),
            state,
        }
    }

    #[test]
    fn test_label_format() {
        assert_eq!(format_bucket_label(Duration::ZERO), "00:00");
        assert_eq!(format_bucket_label(Duration::from_secs(65)), "01:05");
        assert_eq!(format_bucket_label(Duration::from_millis(59_999)), "00:59");
    }

    #[test]
    fn test_mean_per_bucket() {
        let base = Instant::now();
        let log = vec![
            entry(base, 0, SafetyState::Alert),
            entry(base, 1, SafetyState::Warning),
            entry(base, 6, SafetyState::Danger),
        ];

        let points = bucket_series(&log, base + Duration::from_secs(7), &WindowConfig::default(), base);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].alertness_value, 75.0);
        assert_eq!(points[0].bucket_label, "00:00");
        assert_eq!(points[1].alertness_value, 10.0);
        assert_eq!(points[1].bucket_label, "00:05");
    }

    #[test]
    fn test_gap_fill_carries_last_value() {
        let base = Instant::now();
        let mut log = Vec::new();
        for (secs, state) in [
            (0, SafetyState::Alert),
            (1, SafetyState::Alert),
            (2, SafetyState::Alert),
            (3, SafetyState::Warning),
            (4, SafetyState::Warning),
        ] {
            log.push(entry(base, secs, state));
        }
        log.push(entry(base, 20, SafetyState::Danger));

        let points = bucket_series(&log, base + Duration::from_secs(22), &WindowConfig::default(), base);
        let values: Vec<f64> = points.iter().map(|p| p.alertness_value).collect();
        assert_eq!(values, vec![80.0, 80.0, 80.0, 80.0, 10.0]);
    }

    #[test]
    fn test_empty_log_yields_no_points() {
        let base = Instant::now();
        assert!(bucket_series(&[], base, &WindowConfig::default(), base).is_empty());
    }
}
