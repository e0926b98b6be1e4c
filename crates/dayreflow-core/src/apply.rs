//! Sending computed changes to the remote calendar.
//!
//! A batch is applied one operation at a time. A failing operation does not
//! stop the batch; every outcome is reported so the caller can tell a fully
//! applied reflow from a partial one.

use serde::Serialize;

use crate::error::RemoteError;
use crate::event::Event;
use crate::remote::CalendarRemote;
use crate::snapshot::UpdateCommand;

/// One write against the remote calendar.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum WriteOp {
    Update { id: String, event: Event },
    Create { event: Event },
}

impl WriteOp {
    /// What the operation is about, for logs and reports.
    pub fn target(&self) -> &str {
        match self {
            WriteOp::Update { id, .. } => id,
            WriteOp::Create { event } => &event.summary,
        }
    }

    pub fn kind(&self) -> WriteKind {
        match self {
            WriteOp::Update { .. } => WriteKind::Update,
            WriteOp::Create { .. } => WriteKind::Create,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteKind {
    Update,
    Create,
}

/// Ordered list of writes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_update(&mut self, id: impl Into<String>, event: Event) {
        self.ops.push(WriteOp::Update { id: id.into(), event });
    }

    pub fn push_create(&mut self, event: Event) {
        self.ops.push(WriteOp::Create { event });
    }

    /// One update per restore command, in command order.
    pub fn from_updates(commands: Vec<UpdateCommand>) -> Self {
        Self {
            ops: commands
                .into_iter()
                .map(|c| WriteOp::Update {
                    id: c.event_id,
                    event: c.event,
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    /// Send every operation in order. Failures are recorded and skipped.
    pub fn apply(self, remote: &dyn CalendarRemote) -> BatchReport {
        let mut outcomes = Vec::with_capacity(self.ops.len());
        for op in self.ops {
            let target = op.target().to_string();
            let kind = op.kind();
            let result = match &op {
                WriteOp::Update { id, event } => remote.update_event(id, event),
                WriteOp::Create { event } => remote.create_event(event),
            };
            let status = match result {
                Ok(event) => WriteStatus::Applied(event),
                Err(err) => {
                    tracing::warn!(event = %target, ?kind, error = %err, "calendar write failed");
                    WriteStatus::Failed(err)
                }
            };
            outcomes.push(WriteOutcome { target, kind, status });
        }

        let report = BatchReport { outcomes };
        tracing::info!(
            applied = report.succeeded(),
            failed = report.failed(),
            "write batch finished"
        );
        report
    }
}

#[derive(Debug)]
pub enum WriteStatus {
    /// The event as the remote stored it.
    Applied(Event),
    Failed(RemoteError),
}

#[derive(Debug)]
pub struct WriteOutcome {
    pub target: String,
    pub kind: WriteKind,
    pub status: WriteStatus,
}

impl WriteOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self.status, WriteStatus::Applied(_))
    }
}

/// Per-operation results of [`WriteBatch::apply`], in batch order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<WriteOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_applied()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// True when every operation went through.
    pub fn is_complete(&self) -> bool {
        self.failed() == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &RemoteError)> + '_ {
        self.outcomes.iter().filter_map(|o| match &o.status {
            WriteStatus::Failed(err) => Some((o.target.as_str(), err)),
            WriteStatus::Applied(_) => None,
        })
    }

    /// The first event created by the batch, with its remote id.
    pub fn created_event(&self) -> Option<&Event> {
        self.outcomes.iter().find_map(|o| match (&o.kind, &o.status) {
            (WriteKind::Create, WriteStatus::Applied(event)) => Some(event),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MemoryCalendar;
    use chrono::{DateTime, Duration};

    fn event(summary: &str, start: &str) -> Event {
        let start = DateTime::parse_from_rfc3339(start).unwrap();
        Event::new(summary, start, start + Duration::minutes(30))
    }

    #[test]
    fn failures_do_not_stop_the_batch() {
        let cal = MemoryCalendar::with_events([
            event("a", "2024-05-01T09:00:00Z"),
            event("b", "2024-05-01T10:00:00Z"),
            event("c", "2024-05-01T11:00:00Z"),
        ]);
        cal.fail_on("evt-2");

        let mut batch = WriteBatch::new();
        for id in ["evt-1", "evt-2", "evt-3"] {
            let moved = cal.get(id).unwrap();
            let moved = moved.with_bounds(moved.start - Duration::minutes(5), moved.end);
            batch.push_update(id, moved);
        }
        batch.push_create(event("urgent", "2024-05-01T12:00:00Z"));
        assert_eq!(batch.len(), 4);

        let report = batch.apply(&cal);
        assert_eq!(report.succeeded(), 3);
        assert_eq!(report.failed(), 1);
        assert!(!report.is_complete());
        assert_eq!(report.failures().next().map(|(t, _)| t), Some("evt-2"));
        assert_eq!(report.created_event().and_then(|e| e.id.as_deref()), Some("evt-4"));

        assert_eq!(cal.get("evt-1").unwrap().start, DateTime::parse_from_rfc3339("2024-05-01T08:55:00Z").unwrap());
        assert_eq!(cal.get("evt-2").unwrap().start, DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z").unwrap());
    }

    #[test]
    fn empty_batch_is_complete() {
        let cal = MemoryCalendar::new();
        let report = WriteBatch::new().apply(&cal);
        assert!(report.is_complete());
        assert!(report.created_event().is_none());
    }

    #[test]
    fn from_updates_keeps_command_order() {
        let commands = vec![
            UpdateCommand { event_id: "x".into(), event: event("x", "2024-05-01T09:00:00Z") },
            UpdateCommand { event_id: "y".into(), event: event("y", "2024-05-01T10:00:00Z") },
        ];
        let batch = WriteBatch::from_updates(commands);
        let targets: Vec<_> = batch.ops().iter().map(WriteOp::target).collect();
        assert_eq!(targets, ["x", "y"]);
    }
}
