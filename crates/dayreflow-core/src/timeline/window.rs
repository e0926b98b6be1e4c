//! The calendar day an operation works on.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Timelike};

/// Half-open window `[start, end)` covering one calendar day in a fixed offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

impl DayWindow {
    /// The day containing `now`, in `now`'s own offset.
    pub fn containing(now: DateTime<FixedOffset>) -> Self {
        let since_midnight = Duration::seconds(i64::from(now.num_seconds_from_midnight()))
            + Duration::nanoseconds(i64::from(now.nanosecond() % 1_000_000_000));
        let start = now - since_midnight;
        Self {
            start,
            end: start + Duration::days(1),
        }
    }

    /// The given date in the given offset.
    pub fn for_date(date: NaiveDate, offset: FixedOffset) -> Option<Self> {
        let start = date.and_hms_opt(0, 0, 0)?.and_local_timezone(offset).single()?;
        Some(Self {
            start,
            end: start + Duration::days(1),
        })
    }

    pub fn contains(&self, instant: DateTime<FixedOffset>) -> bool {
        self.start <= instant && instant < self.end
    }

    pub fn length(&self) -> Duration {
        self.end - self.start
    }

    /// Time left in the day after `now`; zero once the day is over.
    pub fn remaining(&self, now: DateTime<FixedOffset>) -> Duration {
        if now >= self.end {
            Duration::zero()
        } else if now < self.start {
            self.length()
        } else {
            self.end - now
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[test]
    fn containing_uses_local_midnight() {
        let w = DayWindow::containing(at("2024-05-01T18:45:30.250+05:30"));
        assert_eq!(w.start, at("2024-05-01T00:00:00+05:30"));
        assert_eq!(w.end, at("2024-05-02T00:00:00+05:30"));
        assert_eq!(w.length(), Duration::hours(24));
    }

    #[test]
    fn remaining_counts_down_to_midnight() {
        let now = at("2024-05-01T22:30:00Z");
        let w = DayWindow::containing(now);
        assert_eq!(w.remaining(now), Duration::minutes(90));
        assert_eq!(w.remaining(at("2024-05-02T01:00:00Z")), Duration::zero());
        assert_eq!(w.remaining(at("2024-04-30T23:00:00Z")), Duration::hours(24));
    }

    #[test]
    fn contains_is_half_open() {
        let w = DayWindow::containing(at("2024-05-01T12:00:00Z"));
        assert!(w.contains(at("2024-05-01T00:00:00Z")));
        assert!(!w.contains(at("2024-05-02T00:00:00Z")));
    }

    #[test]
    fn for_date_builds_window() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let offset = FixedOffset::west_opt(3600).unwrap();
        let w = DayWindow::for_date(date, offset).unwrap();
        assert_eq!(w.start, at("2024-02-29T00:00:00-01:00"));
        assert_eq!(w.end, at("2024-03-01T00:00:00-01:00"));
    }
}
