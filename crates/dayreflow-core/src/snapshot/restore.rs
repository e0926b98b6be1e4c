//! Turning a capture back into calendar updates.

use serde::Serialize;

use super::record::SnapshotRecord;
use crate::apply::{BatchReport, WriteBatch};
use crate::error::{ReflowError, Result};
use crate::event::Event;
use crate::remote::CalendarRemote;

/// Instruction to overwrite one remote event with captured values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateCommand {
    pub event_id: String,
    pub event: Event,
}

/// One update per captured record, keyed by event id, in capture order.
///
/// Replaying the same commands twice leaves the remote in the same state:
/// each command is a full replace with fixed values.
///
/// # Errors
/// `SnapshotMissing` when there is nothing to restore.
pub fn restore(records: &[SnapshotRecord]) -> Result<Vec<UpdateCommand>> {
    if records.is_empty() {
        return Err(ReflowError::SnapshotMissing);
    }
    Ok(records
        .iter()
        .map(|r| UpdateCommand {
            event_id: r.id.clone(),
            event: r.to_event(),
        })
        .collect())
}

/// Push `records` back onto `remote`, one update per event.
///
/// Events that fail to update are listed in the report; the rest are
/// still restored.
pub fn replay(records: &[SnapshotRecord], remote: &dyn CalendarRemote) -> Result<BatchReport> {
    let commands = restore(records)?;
    let report = WriteBatch::from_updates(commands).apply(remote);
    tracing::info!(
        restored = report.succeeded(),
        failed = report.failed(),
        "snapshot replayed"
    );
    Ok(report)
}
