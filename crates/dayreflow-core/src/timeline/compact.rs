//! Proportional compaction of a timeline into a time budget.

use chrono::{DateTime, Duration, FixedOffset};

use crate::error::{ReflowError, Result};
use crate::timeline::Timeline;

/// Redistribute every event into `budget`, keeping order and duration ratios.
///
/// The first event starts at `anchor` and each following event starts exactly
/// where the previous one ends. Boundaries are computed from cumulative shares
/// in whole microseconds, so the durations add up to `budget` exactly and no
/// rounding drift builds up along the chain.
///
/// # Errors
/// - `EmptyBudget` if `budget` is not positive
/// - `NothingToCompact` if the timeline has no occupied time
/// - `BudgetTooSmall` if some event's share rounds to zero length
pub fn compact(timeline: &Timeline, anchor: DateTime<FixedOffset>, budget: Duration) -> Result<Timeline> {
    if budget <= Duration::zero() {
        return Err(ReflowError::EmptyBudget {
            budget_secs: budget.num_seconds(),
        });
    }

    let total = micros(timeline.total_occupied());
    if timeline.is_empty() || total <= 0 {
        return Err(ReflowError::NothingToCompact);
    }

    redistribute(timeline, anchor, budget, total)
}

/// Shared by compaction and urgent insertion: chain events from `anchor`,
/// each taking `duration / total * budget`.
pub(crate) fn redistribute(
    timeline: &Timeline,
    anchor: DateTime<FixedOffset>,
    budget: Duration,
    total: i128,
) -> Result<Timeline> {
    let budget = micros(budget);
    let mut cumulative: i128 = 0;
    let mut prev_end = anchor;
    let mut out = Vec::with_capacity(timeline.len());

    for event in timeline {
        cumulative += micros(event.duration());
        // cumulative <= total, so the offset never exceeds budget
        let offset = (cumulative * budget / total) as i64;
        let end = anchor
            .checked_add_signed(Duration::microseconds(offset))
            .ok_or_else(|| ReflowError::OutOfRange {
                event: event.label().to_string(),
            })?;

        if end <= prev_end {
            return Err(ReflowError::BudgetTooSmall {
                event: event.label().to_string(),
            });
        }

        // Keep each event's own offset; instants are what the chain compares.
        let offset_tz = *event.start.offset();
        out.push(event.with_bounds(prev_end.with_timezone(&offset_tz), end.with_timezone(&offset_tz)));
        prev_end = end;
    }

    tracing::debug!(
        events = out.len(),
        anchor = %anchor.to_rfc3339(),
        budget_us = budget as i64,
        "redistributed timeline"
    );

    Timeline::new(out)
}

pub(crate) fn micros(d: Duration) -> i128 {
    i128::from(d.num_microseconds().unwrap_or(i64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;

    fn at(hm: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(&format!("2024-05-01T{hm}:00Z")).unwrap()
    }

    fn ev(id: &str, start: &str, end: &str) -> Event {
        Event::new(format!("Event {id}"), at(start), at(end)).with_id(id)
    }

    fn bounds(tl: &Timeline) -> Vec<(String, String)> {
        tl.iter()
            .map(|e| (e.start.format("%H:%M").to_string(), e.end.format("%H:%M").to_string()))
            .collect()
    }

    #[test]
    fn halves_two_events_keeping_ratio() {
        let tl = Timeline::new(vec![ev("a", "09:00", "09:30"), ev("b", "09:30", "10:30")]).unwrap();
        let out = compact(&tl, at("09:00"), Duration::minutes(45)).unwrap();

        assert_eq!(
            bounds(&out),
            vec![
                ("09:00".to_string(), "09:15".to_string()),
                ("09:15".to_string(), "09:45".to_string()),
            ]
        );
        assert_eq!(out.total_occupied(), Duration::minutes(45));
    }

    #[test]
    fn closes_gaps_and_reanchors() {
        let tl = Timeline::new(vec![
            ev("a", "08:00", "09:00"),
            ev("b", "11:00", "12:00"),
            ev("c", "15:00", "17:00"),
        ])
        .unwrap();
        let out = compact(&tl, at("13:00"), Duration::hours(2)).unwrap();

        assert!(out.is_contiguous());
        assert_eq!(out.first_start(), Some(at("13:00")));
        assert_eq!(out.last_end(), Some(at("15:00")));
        let minutes: Vec<_> = out.iter().map(|e| e.duration().num_minutes()).collect();
        assert_eq!(minutes, vec![30, 30, 60]);
    }

    #[test]
    fn same_budget_same_anchor_is_identity_for_contiguous_day() {
        let tl = Timeline::new(vec![ev("a", "09:00", "09:20"), ev("b", "09:20", "10:00")]).unwrap();
        let out = compact(&tl, at("09:00"), tl.total_occupied()).unwrap();
        assert_eq!(out, tl);
    }

    #[test]
    fn non_divisible_budget_still_sums_exactly() {
        let tl = Timeline::new(vec![
            ev("a", "09:00", "09:07"),
            ev("b", "09:07", "09:18"),
            ev("c", "09:18", "09:31"),
        ])
        .unwrap();
        let budget = Duration::seconds(1000);
        let out = compact(&tl, at("12:00"), budget).unwrap();
        assert_eq!(out.total_occupied(), budget);
        assert!(out.is_contiguous());
    }

    #[test]
    fn metadata_survives() {
        let mut a = ev("a", "09:00", "10:00");
        a.description = Some("notes".into());
        a.attendees = Some(serde_json::json!([{"email": "x@example.com"}]));
        let tl = Timeline::new(vec![a.clone()]).unwrap();

        let out = compact(&tl, at("11:00"), Duration::minutes(10)).unwrap();
        let moved = &out.events()[0];
        assert_eq!(moved.description, a.description);
        assert_eq!(moved.attendees, a.attendees);
        assert_eq!(moved.id, a.id);
    }

    #[test]
    fn rejects_empty_budget() {
        let tl = Timeline::new(vec![ev("a", "09:00", "10:00")]).unwrap();
        assert!(matches!(
            compact(&tl, at("09:00"), Duration::zero()),
            Err(ReflowError::EmptyBudget { budget_secs: 0 })
        ));
        assert!(matches!(
            compact(&tl, at("09:00"), Duration::minutes(-5)),
            Err(ReflowError::EmptyBudget { .. })
        ));
    }

    #[test]
    fn empty_timeline_is_nothing_to_compact() {
        assert!(matches!(
            compact(&Timeline::empty(), at("09:00"), Duration::hours(1)),
            Err(ReflowError::NothingToCompact)
        ));
    }

    #[test]
    fn share_rounding_to_zero_is_rejected() {
        let tl = Timeline::new(vec![ev("tiny", "09:00", "09:01"), ev("huge", "09:01", "20:00")]).unwrap();
        match compact(&tl, at("09:00"), Duration::microseconds(10)) {
            Err(ReflowError::BudgetTooSmall { event }) => assert_eq!(event, "tiny"),
            other => panic!("expected BudgetTooSmall, got {other:?}"),
        }
    }

    #[test]
    fn events_keep_their_own_offset() {
        let start = DateTime::parse_from_rfc3339("2024-05-01T11:00:00+02:00").unwrap();
        let tl = Timeline::new(vec![Event::new("x", start, start + Duration::hours(1))]).unwrap();
        let out = compact(&tl, at("10:00"), Duration::minutes(30)).unwrap();
        let e = &out.events()[0];
        assert_eq!(e.start.offset().local_minus_utc(), 7200);
        assert_eq!(e.start, at("10:00"));
    }
}
