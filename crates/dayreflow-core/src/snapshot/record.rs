//! Per-event captures taken before a day is reflowed.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::error::{ReflowError, Result};
use crate::event::Event;

/// Immutable capture of one event's identity, boundaries and metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub id: String,
    pub summary: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub color: Option<String>,
    pub attendees: Option<serde_json::Value>,
    pub recurrence: Option<Vec<String>>,
    pub reminders: Option<serde_json::Value>,
    /// Unmodeled remote fields, restored as they were.
    #[serde(default)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SnapshotRecord {
    /// Capture `events` in the order given.
    ///
    /// Every event must already exist remotely; an event without an id
    /// could never be restored.
    pub fn capture(events: &[Event]) -> Result<Vec<SnapshotRecord>> {
        events.iter().map(Self::from_event).collect()
    }

    pub fn from_event(event: &Event) -> Result<SnapshotRecord> {
        let id = event
            .id
            .clone()
            .ok_or_else(|| ReflowError::invalid_event(event.label(), "cannot snapshot an event without an id"))?;
        Ok(SnapshotRecord {
            id,
            summary: event.summary.clone(),
            location: event.location.clone(),
            description: event.description.clone(),
            start: event.start,
            end: event.end,
            color: event.color.clone(),
            attendees: event.attendees.clone(),
            recurrence: event.recurrence.clone(),
            reminders: event.reminders.clone(),
            extra: event.extra.clone(),
        })
    }

    /// The event as it was when captured.
    pub fn to_event(&self) -> Event {
        Event {
            id: Some(self.id.clone()),
            summary: self.summary.clone(),
            start: self.start,
            end: self.end,
            color: self.color.clone(),
            location: self.location.clone(),
            description: self.description.clone(),
            attendees: self.attendees.clone(),
            recurrence: self.recurrence.clone(),
            reminders: self.reminders.clone(),
            extra: self.extra.clone(),
        }
    }
}
