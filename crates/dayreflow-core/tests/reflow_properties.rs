//! Property tests for the timeline computations and snapshot capture.

use chrono::{DateTime, Duration, FixedOffset};
use dayreflow_core::snapshot::{restore, SnapshotRecord, SnapshotStore};
use dayreflow_core::{compact, insert_urgent, overlaps, ColorTag, Event, ShrinkPolicy, Timeline, UrgentRequest};
use proptest::prelude::*;

fn base() -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339("2024-05-01T06:00:00+02:00").unwrap()
}

/// Build a day from (gap, duration) pairs in minutes.
fn day(layout: &[(i64, i64)]) -> Timeline {
    let mut cursor = base();
    let events = layout
        .iter()
        .enumerate()
        .map(|(i, &(gap, minutes))| {
            let start = cursor + Duration::minutes(gap);
            let end = start + Duration::minutes(minutes);
            cursor = end;
            let mut e = Event::new(format!("item {i}"), start, end).with_id(format!("evt-{i}"));
            if i % 3 == 0 {
                e.location = Some(format!("room {i}"));
                e.recurrence = Some(vec!["RRULE:FREQ=DAILY".into()]);
            }
            if i % 2 == 1 {
                e = e.with_color(ColorTag::Sage);
            }
            e
        })
        .collect();
    Timeline::new(events).unwrap()
}

fn layout() -> impl Strategy<Value = Vec<(i64, i64)>> {
    prop::collection::vec((0i64..60, 1i64..180), 1..12)
}

fn ids(t: &Timeline) -> Vec<String> {
    t.iter().map(|e| e.label().to_string()).collect()
}

proptest! {
    #[test]
    fn compact_fills_budget_exactly_and_keeps_order(
        layout in layout(),
        budget_mins in 1i64..1440,
        anchor_offset in 0i64..600,
    ) {
        let before = day(&layout);
        let anchor = base() + Duration::minutes(anchor_offset);
        let budget = Duration::minutes(budget_mins);

        let after = compact(&before, anchor, budget).unwrap();

        prop_assert_eq!(after.len(), before.len());
        prop_assert_eq!(after.total_occupied(), budget);
        prop_assert_eq!(ids(&after), ids(&before));
        prop_assert_eq!(after.first_start(), Some(anchor));
        prop_assert!(after.is_contiguous());
        for pair in after.events().windows(2) {
            prop_assert_eq!(pair[0].end, pair[1].start);
        }
        for (old, new) in before.iter().zip(after.iter()) {
            prop_assert_eq!(&old.summary, &new.summary);
            prop_assert_eq!(&old.location, &new.location);
            prop_assert_eq!(&old.color, &new.color);
            prop_assert_eq!(&old.recurrence, &new.recurrence);
        }
    }

    #[test]
    fn compacting_into_own_total_keeps_durations(layout in layout()) {
        let before = day(&layout);
        let anchor = before.first_start().unwrap();

        let after = compact(&before, anchor, before.total_occupied()).unwrap();

        for (old, new) in before.iter().zip(after.iter()) {
            prop_assert_eq!(old.duration(), new.duration());
        }
    }

    #[test]
    fn overlap_is_symmetric(a in 0i64..1000, la in 0i64..200, b in 0i64..1000, lb in 0i64..200) {
        prop_assert_eq!(overlaps(a, a + la, b, b + lb), overlaps(b, b + lb, a, a + la));
    }

    #[test]
    fn zero_length_overlaps_nothing(p in 0i64..1000, b in 0i64..1000, lb in 0i64..200) {
        prop_assert!(!overlaps(p, p, b, b + lb));
        prop_assert!(!overlaps(p, p, p, p));
    }

    #[test]
    fn urgent_event_follows_shrunk_day(layout in layout(), pick in any::<u32>()) {
        let before = day(&layout);
        let total = before.total_occupied().num_minutes();
        prop_assume!(total > 1);
        let requested = 1 + i64::from(pick) % (total - 1);

        let request = UrgentRequest::new("urgent", Duration::minutes(requested), base());
        let plan = insert_urgent(&before, &request, ShrinkPolicy::Budget).unwrap();

        prop_assert_eq!(plan.existing.first_start(), before.first_start());
        prop_assert_eq!(plan.existing.last_end(), Some(plan.new_event.start));
        prop_assert_eq!(plan.new_event.duration(), Duration::minutes(requested));
        prop_assert!(plan.new_event.id.is_none());

        let full = plan.timeline();
        prop_assert_eq!(full.total_occupied(), before.total_occupied());
        for (i, a) in full.iter().enumerate() {
            for b in full.iter().skip(i + 1) {
                prop_assert!(!overlaps(a.start, a.end, b.start, b.end));
            }
        }
    }

    #[test]
    fn legacy_policy_shrinks_into_requested(layout in layout(), requested in 1i64..240) {
        let before = day(&layout);
        let request = UrgentRequest::new("urgent", Duration::minutes(requested), base());

        let plan = insert_urgent(&before, &request, ShrinkPolicy::Legacy).unwrap();

        prop_assert_eq!(plan.existing.total_occupied(), Duration::minutes(requested));
        prop_assert_eq!(plan.existing.last_end(), Some(plan.new_event.start));
    }

    #[test]
    fn restore_of_capture_reconstructs_events(layout in layout()) {
        let before = day(&layout);
        let records = SnapshotRecord::capture(before.events()).unwrap();

        let restored: Vec<Event> = restore(&records).unwrap().into_iter().map(|c| c.event).collect();
        prop_assert_eq!(restored.as_slice(), before.events());

        let store = SnapshotStore::open_memory().unwrap();
        let id = store.save("compact", &records, base()).unwrap();
        let loaded = store.load(id).unwrap().unwrap();
        prop_assert_eq!(loaded.records, records);
    }
}

#[test]
fn compact_example_from_two_events() {
    let at = |s: &str| DateTime::parse_from_rfc3339(&format!("2024-05-01T{s}:00Z")).unwrap();
    let day = Timeline::new(vec![
        Event::new("A", at("09:00"), at("09:30")),
        Event::new("B", at("09:30"), at("10:30")),
    ])
    .unwrap();

    let after = compact(&day, at("09:00"), Duration::minutes(45)).unwrap();
    let bounds: Vec<_> = after.iter().map(|e| (e.start, e.end)).collect();
    assert_eq!(bounds, [(at("09:00"), at("09:15")), (at("09:15"), at("09:45"))]);
}
