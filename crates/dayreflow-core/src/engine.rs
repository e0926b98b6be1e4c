//! Reflow engine: reads a day, snapshots it, computes new boundaries and
//! writes them back.
//!
//! Every operation follows the same order:
//!
//! 1. Read the day from the remote calendar (a failure here aborts).
//! 2. Compute the new shape (a computation error aborts before any write).
//! 3. Store a snapshot of the day as it was.
//! 4. Send updates, then creates, one at a time, collecting a report.
//!
//! The `plan_*` methods stop after step 2 and never write anything.
//!
//! There is no locking against other writers. Two invocations against the
//! same calendar can interleave their reads and writes; re-running after such
//! a race recomputes from a fresh read.

use chrono::{DateTime, Duration, FixedOffset};

use crate::apply::{BatchReport, WriteBatch};
use crate::error::{ReflowError, Result};
use crate::event::{ColorTag, Event};
use crate::remote::CalendarRemote;
use crate::snapshot::{self, Snapshot, SnapshotId, SnapshotRecord, SnapshotStore};
use crate::storage::ReflowConfig;
use crate::timeline::{self, DayWindow, ShrinkPolicy, Timeline, UrgentPlan, UrgentRequest};

const COMPACT_LABEL: &str = "compact";
const URGENT_LABEL: &str = "urgent";

/// Computed compaction of the rest of a day.
#[derive(Debug, Clone)]
pub struct ShrinkPlan {
    pub window: DayWindow,
    pub budget: Duration,
    pub before: Timeline,
    pub after: Timeline,
}

/// Computed urgent insertion.
#[derive(Debug, Clone)]
pub struct UrgentPreview {
    pub before: Timeline,
    pub plan: UrgentPlan,
    /// Events of `before` that overlap the new event's final slot.
    pub conflicts: Vec<Event>,
}

/// What a write operation did.
#[derive(Debug)]
pub struct ReflowOutcome {
    /// Capture taken before writing; `None` when the day was empty.
    pub snapshot: Option<SnapshotId>,
    /// The shape that was sent to the remote.
    pub timeline: Timeline,
    pub report: BatchReport,
    pub conflicts: Vec<Event>,
}

/// Orchestrates reflows against one remote calendar and one snapshot store.
pub struct ReflowEngine<'a> {
    remote: &'a dyn CalendarRemote,
    store: &'a SnapshotStore,
    policy: ShrinkPolicy,
    default_color: ColorTag,
}

impl<'a> ReflowEngine<'a> {
    pub fn new(remote: &'a dyn CalendarRemote, store: &'a SnapshotStore) -> Self {
        Self {
            remote,
            store,
            policy: ShrinkPolicy::default(),
            default_color: ColorTag::default(),
        }
    }

    pub fn from_config(remote: &'a dyn CalendarRemote, store: &'a SnapshotStore, config: &ReflowConfig) -> Self {
        Self::new(remote, store)
            .with_policy(config.urgent_policy)
            .with_default_color(config.default_color())
    }

    pub fn with_policy(mut self, policy: ShrinkPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Color given to urgent events whose request names none.
    pub fn with_default_color(mut self, color: ColorTag) -> Self {
        self.default_color = color;
        self
    }

    pub fn policy(&self) -> ShrinkPolicy {
        self.policy
    }

    /// Read the events starting inside `window`.
    pub fn load_day(&self, window: &DayWindow) -> Result<Timeline> {
        let events = self.remote.list_events(window).map_err(ReflowError::RemoteUnavailable)?;
        Timeline::new(events)
    }

    /// Events of the day containing `start` that overlap `[start, end)`.
    pub fn check_conflicts(&self, start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> Result<Vec<Event>> {
        let day = self.load_day(&DayWindow::containing(start))?;
        Ok(timeline::find_conflicts(start, end, &day).into_iter().cloned().collect())
    }

    /// Compact today's events into the time left between `now` and midnight.
    pub fn plan_shrink(&self, now: DateTime<FixedOffset>) -> Result<ShrinkPlan> {
        let window = DayWindow::containing(now);
        let before = self.load_day(&window)?;
        let budget = window.remaining(now);
        let after = timeline::compact(&before, now, budget)?;
        Ok(ShrinkPlan {
            window,
            budget,
            before,
            after,
        })
    }

    pub fn shrink_remaining_day(&self, now: DateTime<FixedOffset>) -> Result<ReflowOutcome> {
        let plan = self.plan_shrink(now)?;
        let snapshot = self.capture(COMPACT_LABEL, &plan.before, now)?;

        let mut batch = WriteBatch::new();
        push_updates(&mut batch, &plan.after);
        let report = batch.apply(self.remote);

        tracing::info!(
            snapshot = %snapshot,
            events = plan.after.len(),
            budget_mins = plan.budget.num_minutes(),
            complete = report.is_complete(),
            "compacted remaining day"
        );
        Ok(ReflowOutcome {
            snapshot: Some(snapshot),
            timeline: plan.after,
            report,
            conflicts: Vec::new(),
        })
    }

    /// Make room for `request` in the day containing `now`.
    pub fn plan_urgent(&self, request: &UrgentRequest, now: DateTime<FixedOffset>) -> Result<UrgentPreview> {
        let before = self.load_day(&DayWindow::containing(now))?;
        let mut request = request.clone();
        request.color.get_or_insert(self.default_color);
        let plan = timeline::insert_urgent(&before, &request, self.policy)?;

        let slot = &plan.new_event;
        let conflicts: Vec<Event> = timeline::find_conflicts(slot.start, slot.end, &before)
            .into_iter()
            .cloned()
            .collect();
        if !conflicts.is_empty() {
            let ids: Vec<&str> = conflicts.iter().map(Event::label).collect();
            tracing::warn!(
                summary = %request.summary,
                conflicts = ?ids,
                "urgent slot overlaps the original schedule"
            );
        }

        Ok(UrgentPreview {
            before,
            plan,
            conflicts,
        })
    }

    pub fn insert_urgent(&self, request: &UrgentRequest, now: DateTime<FixedOffset>) -> Result<ReflowOutcome> {
        let preview = self.plan_urgent(request, now)?;
        let snapshot = if preview.before.is_empty() {
            None
        } else {
            Some(self.capture(URGENT_LABEL, &preview.before, now)?)
        };

        let mut batch = WriteBatch::new();
        push_updates(&mut batch, &preview.plan.existing);
        batch.push_create(preview.plan.new_event.clone());
        let report = batch.apply(self.remote);

        tracing::info!(
            summary = %request.summary,
            shrunk = preview.plan.existing.len(),
            complete = report.is_complete(),
            "inserted urgent event"
        );
        Ok(ReflowOutcome {
            snapshot,
            timeline: preview.plan.timeline(),
            report,
            conflicts: preview.conflicts,
        })
    }

    /// Undo the most recent reflow.
    ///
    /// A restore whose every write succeeded consumes the snapshot, so calling
    /// this again steps back through earlier reflows. A partial restore keeps
    /// the snapshot for a retry.
    pub fn restore_latest(&self) -> Result<ReflowOutcome> {
        let snap = self.store.latest()?.ok_or(ReflowError::SnapshotMissing)?;
        self.replay(snap)
    }

    /// Restore a specific snapshot; consumed on success like [`Self::restore_latest`].
    pub fn restore_snapshot(&self, id: SnapshotId) -> Result<ReflowOutcome> {
        let snap = self.store.load(id)?.ok_or(ReflowError::SnapshotMissing)?;
        self.replay(snap)
    }

    fn replay(&self, snap: Snapshot) -> Result<ReflowOutcome> {
        let timeline = Timeline::new(snap.records.iter().map(SnapshotRecord::to_event).collect())?;
        let report = snapshot::replay(&snap.records, self.remote)?;
        if report.is_complete() {
            self.store.discard(snap.id)?;
            tracing::info!(snapshot = %snap.id, label = %snap.label, "restored snapshot");
        } else {
            tracing::warn!(
                snapshot = %snap.id,
                failed = report.failed(),
                "restore incomplete, keeping snapshot"
            );
        }
        Ok(ReflowOutcome {
            snapshot: Some(snap.id),
            timeline,
            report,
            conflicts: Vec::new(),
        })
    }

    fn capture(&self, label: &str, day: &Timeline, now: DateTime<FixedOffset>) -> Result<SnapshotId> {
        let records = SnapshotRecord::capture(day.events())?;
        Ok(self.store.save(label, &records, now)?)
    }
}

fn push_updates(batch: &mut WriteBatch, timeline: &Timeline) {
    for event in timeline {
        if let Some(id) = &event.id {
            batch.push_update(id.clone(), event.clone());
        }
    }
}
