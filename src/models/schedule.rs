//! Keyword schedule model.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Smallest accepted schedule interval.
pub const MIN_INTERVAL_HOURS: i32 = 1;
/// Largest accepted schedule interval (30 days).
pub const MAX_INTERVAL_HOURS: i32 = 720;

/// Clamp an interval into the accepted range.
pub fn clamp_interval_hours(hours: i32) -> i32 {
    hours.clamp(MIN_INTERVAL_HOURS, MAX_INTERVAL_HOURS)
}

/// A recurring binding between a keyword and a cadence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordSchedule {
    pub id: i64,
    pub keyword_id: i64,
    pub interval_hours: i32,
    pub active: bool,
    pub last_run_at: Option<DateTime<Utc>>,
    pub next_run_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl KeywordSchedule {
    /// Whether this schedule should fire at `now`.
    ///
    /// An active schedule without a cursor is immediately due.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.active && self.next_run_at.map_or(true, |next| next <= now)
    }

    /// The interval as a chrono duration.
    pub fn interval(&self) -> Duration {
        Duration::hours(i64::from(self.interval_hours))
    }

    /// Move the cursor after a successful execution at `now`.
    pub fn advance(&mut self, now: DateTime<Utc>) {
        self.last_run_at = Some(now);
        self.next_run_at = Some(now + self.interval());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule(next_run_at: Option<DateTime<Utc>>) -> KeywordSchedule {
        KeywordSchedule {
            id: 1,
            keyword_id: 1,
            interval_hours: 24,
            active: true,
            last_run_at: None,
            next_run_at,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_null_cursor_is_due() {
        assert!(schedule(None).is_due(Utc::now()));
    }

    #[test]
    fn test_due_boundaries() {
        let now = Utc::now();
        assert!(!schedule(Some(now + Duration::seconds(1))).is_due(now));
        assert!(schedule(Some(now - Duration::seconds(1))).is_due(now));
        assert!(schedule(Some(now)).is_due(now));
    }

    #[test]
    fn test_inactive_never_due() {
        let mut s = schedule(None);
        s.active = false;
        assert!(!s.is_due(Utc::now()));
    }

    #[test]
    fn test_advance() {
        let now = Utc::now();
        let mut s = schedule(None);
        s.advance(now);
        assert_eq!(s.last_run_at, Some(now));
        assert_eq!(s.next_run_at, Some(now + Duration::hours(24)));
    }

    #[test]
    fn test_clamp_interval() {
        assert_eq!(clamp_interval_hours(0), 1);
        assert_eq!(clamp_interval_hours(48), 48);
        assert_eq!(clamp_interval_hours(10_000), 720);
    }
}
