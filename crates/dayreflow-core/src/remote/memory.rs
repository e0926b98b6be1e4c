//! In-process calendar for dry runs and tests.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use super::CalendarRemote;
use crate::error::RemoteError;
use crate::event::Event;
use crate::timeline::DayWindow;

#[derive(Default)]
struct State {
    events: Vec<Event>,
    next_id: u64,
    failing: HashSet<String>,
    offline: bool,
}

impl State {
    fn assign_id(&mut self) -> String {
        self.next_id += 1;
        format!("evt-{}", self.next_id)
    }

    fn check(&self, key: &str) -> Result<(), RemoteError> {
        if self.offline {
            return Err(RemoteError::Unavailable("calendar is offline".into()));
        }
        if self.failing.contains(key) {
            return Err(RemoteError::Http {
                status: 500,
                message: format!("injected failure for {key}"),
            });
        }
        Ok(())
    }
}

/// A calendar held in memory. Failures can be injected per event.
#[derive(Default)]
pub struct MemoryCalendar {
    state: Mutex<State>,
}

impl MemoryCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with `events`; any without an id gets one.
    pub fn with_events(events: impl IntoIterator<Item = Event>) -> Self {
        let calendar = Self::new();
        {
            let mut state = calendar.lock();
            for mut event in events {
                if event.id.is_none() {
                    event.id = Some(state.assign_id());
                }
                state.events.push(event);
            }
        }
        calendar
    }

    /// Make every write touching `key` (an event id or a summary) fail.
    pub fn fail_on(&self, key: impl Into<String>) {
        self.lock().failing.insert(key.into());
    }

    /// Make every call fail until switched back.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Everything currently stored, in insertion order.
    pub fn events(&self) -> Vec<Event> {
        self.lock().events.clone()
    }

    pub fn get(&self, id: &str) -> Option<Event> {
        self.lock()
            .events
            .iter()
            .find(|e| e.id.as_deref() == Some(id))
            .cloned()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panic while holding the lock leaves plain data behind; keep using it.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CalendarRemote for MemoryCalendar {
    fn list_events(&self, window: &DayWindow) -> Result<Vec<Event>, RemoteError> {
        let state = self.lock();
        if state.offline {
            return Err(RemoteError::Unavailable("calendar is offline".into()));
        }
        let mut events: Vec<Event> = state
            .events
            .iter()
            .filter(|e| window.contains(e.start))
            .cloned()
            .collect();
        events.sort_by_key(|e| e.start);
        Ok(events)
    }

    fn create_event(&self, event: &Event) -> Result<Event, RemoteError> {
        let mut state = self.lock();
        state.check(&event.summary)?;
        let mut created = event.clone();
        created.id = Some(state.assign_id());
        state.events.push(created.clone());
        Ok(created)
    }

    fn update_event(&self, id: &str, event: &Event) -> Result<Event, RemoteError> {
        let mut state = self.lock();
        state.check(id)?;
        state.check(&event.summary)?;
        let slot = state
            .events
            .iter_mut()
            .find(|e| e.id.as_deref() == Some(id))
            .ok_or_else(|| RemoteError::NotFound(id.to_string()))?;
        let mut updated = event.clone();
        updated.id = Some(id.to_string());
        *slot = updated.clone();
        Ok(updated)
    }

    fn delete_event(&self, id: &str) -> Result<(), RemoteError> {
        let mut state = self.lock();
        state.check(id)?;
        let before = state.events.len();
        state.events.retain(|e| e.id.as_deref() != Some(id));
        if state.events.len() == before {
            return Err(RemoteError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration};

    fn event(summary: &str, start: &str, minutes: i64) -> Event {
        let start = DateTime::parse_from_rfc3339(start).unwrap();
        Event::new(summary, start, start + Duration::minutes(minutes))
    }

    #[test]
    fn list_filters_by_day_and_sorts() {
        let cal = MemoryCalendar::with_events([
            event("late", "2024-05-01T15:00:00Z", 30),
            event("tomorrow", "2024-05-02T09:00:00Z", 30),
            event("early", "2024-05-01T08:00:00Z", 30),
        ]);
        let window = DayWindow::containing(DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z").unwrap());
        let listed = cal.list_events(&window).unwrap();
        let names: Vec<_> = listed.iter().map(|e| e.summary.as_str()).collect();
        assert_eq!(names, ["early", "late"]);
        assert_eq!(listed[0].id.as_deref(), Some("evt-3"));
    }

    #[test]
    fn create_update_delete() {
        let cal = MemoryCalendar::new();
        let created = cal.create_event(&event("new", "2024-05-01T10:00:00Z", 15)).unwrap();
        let id = created.id.clone().unwrap();

        let moved = created.with_bounds(created.start + Duration::hours(1), created.end + Duration::hours(1));
        cal.update_event(&id, &moved).unwrap();
        assert_eq!(cal.get(&id).unwrap().start, moved.start);

        cal.delete_event(&id).unwrap();
        assert!(cal.events().is_empty());
        assert!(matches!(cal.delete_event(&id), Err(RemoteError::NotFound(_))));
    }

    #[test]
    fn injected_failures() {
        let cal = MemoryCalendar::with_events([event("a", "2024-05-01T10:00:00Z", 15)]);
        cal.fail_on("evt-1");
        let e = cal.get("evt-1").unwrap();
        assert!(matches!(cal.update_event("evt-1", &e), Err(RemoteError::Http { status: 500, .. })));

        cal.set_offline(true);
        let window = DayWindow::containing(e.start);
        assert!(matches!(cal.list_events(&window), Err(RemoteError::Unavailable(_))));
    }
}
