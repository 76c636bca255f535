use chrono::{DateTime, Duration, TimeDelta, Utc};
use serde::Serialize;

use crate::error::ClipError;

/// A closed time interval `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ClipError> {
        if start > end {
            return Err(ClipError::InvalidArgument(format!(
                "window start {} is after its end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// The window between two instants, in either order.
    pub fn spanning(a: DateTime<Utc>, b: DateTime<Utc>) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    /// The window of `seconds` length ending at `end`.
    pub fn ending_at(end: DateTime<Utc>, seconds: f64) -> Result<Self, ClipError> {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(ClipError::InvalidArgument(format!(
                "window length must be a non-negative number of seconds, got {}",
                seconds
            )));
        }
        let out_of_range = || {
            ClipError::InvalidArgument(format!(
                "a window of {} seconds ending at {} is out of range",
                seconds, end
            ))
        };
        let millis = (seconds * 1000.0).round();
        if millis >= i64::MAX as f64 {
            return Err(out_of_range());
        }
        let start = TimeDelta::try_milliseconds(millis as i64)
            .and_then(|length| end.checked_sub_signed(length))
            .ok_or_else(out_of_range)?;
        Self::new(start, end)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn length(&self) -> Duration {
        self.end - self.start
    }

    /// Inclusive on both ends: windows that only touch still overlap.
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Length of the intersection, or `None` when the windows are disjoint.
    pub fn overlap_duration(&self, other: &TimeWindow) -> Option<Duration> {
        if !self.overlaps(other) {
            return None;
        }
        Some(self.end.min(other.end) - self.start.max(other.start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn w(start: i64, end: i64) -> TimeWindow {
        TimeWindow::new(
            Utc.timestamp_opt(start, 0).unwrap(),
            Utc.timestamp_opt(end, 0).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_overlap_cases() {
        let clip = w(100, 160);
        assert!(clip.overlaps(&w(90, 110)));
        assert!(clip.overlaps(&w(150, 200)));
        assert!(clip.overlaps(&w(120, 130)));
        assert!(clip.overlaps(&w(50, 300)));
        assert!(!clip.overlaps(&w(10, 99)));
        assert!(!clip.overlaps(&w(161, 200)));

        assert!(clip.overlaps(&w(150, 200)));
        assert!(!clip.overlaps(&w(0, 50)));
        assert!(clip.overlaps(&w(90, 300)));
        assert!(!clip.overlaps(&w(161, 170)));
    }

    #[test]
    fn test_touching_bounds_overlap() {
        let clip = w(100, 160);
        assert!(clip.overlaps(&w(160, 170)));
        assert!(clip.overlaps(&w(90, 100)));
        assert_eq!(clip.overlap_duration(&w(160, 170)), Some(Duration::zero()));
    }

    #[test]
    fn test_overlap_duration() {
        let clip = w(100, 160);
        assert_eq!(clip.overlap_duration(&w(90, 110)), Some(Duration::seconds(10)));
        assert_eq!(clip.overlap_duration(&w(50, 300)), Some(Duration::seconds(60)));
        assert_eq!(clip.overlap_duration(&w(10, 20)), None);
    }

    #[test]
    fn test_ending_at() {
        let end = Utc.timestamp_opt(160, 0).unwrap();
        let window = TimeWindow::ending_at(end, 60.0).unwrap();
        assert_eq!(window, w(100, 160));
        assert_eq!(TimeWindow::ending_at(end, 0.0).unwrap().length(), Duration::zero());
        assert!(TimeWindow::ending_at(end, -1.0).is_err());
        assert!(TimeWindow::ending_at(end, f64::NAN).is_err());
    }

    #[test]
    fn test_ending_at_out_of_range() {
        let end = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        for seconds in [1e13, 1e17, f64::MAX] {
            assert!(matches!(
                TimeWindow::ending_at(end, seconds),
                Err(ClipError::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn test_reversed_window_rejected() {
        let a = Utc.timestamp_opt(10, 0).unwrap();
        let b = Utc.timestamp_opt(5, 0).unwrap();
        assert!(matches!(
            TimeWindow::new(a, b),
            Err(ClipError::InvalidArgument(_))
        ));
    }
}
