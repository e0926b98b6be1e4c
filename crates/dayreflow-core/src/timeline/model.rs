//! In-memory timeline for a single day.

use chrono::{DateTime, Duration, FixedOffset};
use serde::Serialize;

use crate::error::Result;
use crate::event::Event;

/// Events of one day, in the order the calendar returned them.
///
/// The order is never changed: the remote lists events by start time and
/// every transformation preserves that sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Timeline {
    events: Vec<Event>,
}

impl Timeline {
    /// Build a timeline, rejecting any event with a non-positive duration.
    pub fn new(events: Vec<Event>) -> Result<Self> {
        for event in &events {
            event.validate()?;
        }
        Ok(Self { events })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Sum of all event durations.
    pub fn total_occupied(&self) -> Duration {
        self.events
            .iter()
            .fold(Duration::zero(), |acc, e| acc + e.duration())
    }

    pub fn first_start(&self) -> Option<DateTime<FixedOffset>> {
        self.events.first().map(|e| e.start)
    }

    /// Latest end among all events (not necessarily the last event's end).
    pub fn last_end(&self) -> Option<DateTime<FixedOffset>> {
        self.events.iter().map(|e| e.end).max()
    }

    /// Time from the first start to the latest end, gaps included.
    pub fn span(&self) -> Duration {
        match (self.first_start(), self.last_end()) {
            (Some(start), Some(end)) => end - start,
            _ => Duration::zero(),
        }
    }

    /// True when every event starts exactly where its predecessor ends.
    pub fn is_contiguous(&self) -> bool {
        self.events.windows(2).all(|w| w[1].start == w[0].end)
    }
}

impl<'a> IntoIterator for &'a Timeline {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReflowError;

    fn at(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    fn ev(id: &str, start: &str, end: &str) -> Event {
        Event::new(id, at(start), at(end)).with_id(id)
    }

    #[test]
    fn totals_and_span() {
        let tl = Timeline::new(vec![
            ev("a", "2024-05-01T09:00:00Z", "2024-05-01T09:30:00Z"),
            ev("b", "2024-05-01T10:00:00Z", "2024-05-01T11:00:00Z"),
        ])
        .unwrap();

        assert_eq!(tl.total_occupied(), Duration::minutes(90));
        assert_eq!(tl.span(), Duration::minutes(120));
        assert!(!tl.is_contiguous());
    }

    #[test]
    fn empty_timeline_has_no_occupied_time() {
        let tl = Timeline::empty();
        assert!(tl.is_empty());
        assert_eq!(tl.total_occupied(), Duration::zero());
        assert_eq!(tl.span(), Duration::zero());
        assert!(tl.first_start().is_none());
    }

    #[test]
    fn rejects_zero_length_event() {
        let result = Timeline::new(vec![
            ev("a", "2024-05-01T09:00:00Z", "2024-05-01T09:30:00Z"),
            ev("b", "2024-05-01T10:00:00Z", "2024-05-01T10:00:00Z"),
        ]);
        match result {
            Err(ReflowError::InvalidEvent { event, .. }) => assert_eq!(event, "b"),
            other => panic!("expected InvalidEvent, got {other:?}"),
        }
    }

    #[test]
    fn keeps_given_order() {
        // Deliberately out of start order: the model must not re-sort.
        let tl = Timeline::new(vec![
            ev("late", "2024-05-01T15:00:00Z", "2024-05-01T16:00:00Z"),
            ev("early", "2024-05-01T08:00:00Z", "2024-05-01T09:00:00Z"),
        ])
        .unwrap();
        let ids: Vec<_> = tl.iter().map(|e| e.label()).collect();
        assert_eq!(ids, vec!["late", "early"]);
    }
}
