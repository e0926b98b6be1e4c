//! Urgent insertion: make room for a new event by shrinking the day.

use chrono::{DateTime, Duration, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::error::{ReflowError, Result};
use crate::event::{ColorTag, Event};
use crate::timeline::compact::{micros, redistribute};
use crate::timeline::Timeline;

/// How existing events are shrunk to make room for an urgent one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShrinkPolicy {
    /// Existing events share `total_occupied - requested`; the day's occupied
    /// time is conserved once the new event is appended.
    #[default]
    Budget,
    /// Existing events share `requested` itself. Repeated inserts compound
    /// the shrinkage. Kept for parity with the old scripts.
    Legacy,
}

/// A new event to squeeze into the day.
#[derive(Debug, Clone)]
pub struct UrgentRequest {
    pub summary: String,
    pub duration: Duration,
    /// `None` leaves the color to the caller's default (the engine fills in
    /// the configured one) or to the remote calendar.
    pub color: Option<ColorTag>,
    /// Start of the new event when the day is empty, usually "now".
    pub anchor: DateTime<FixedOffset>,
}

impl UrgentRequest {
    pub fn new(summary: impl Into<String>, duration: Duration, anchor: DateTime<FixedOffset>) -> Self {
        Self {
            summary: summary.into(),
            duration,
            color: None,
            anchor,
        }
    }

    pub fn with_color(mut self, color: ColorTag) -> Self {
        self.color = Some(color);
        self
    }
}

/// Result of planning an urgent insertion.
#[derive(Debug, Clone)]
pub struct UrgentPlan {
    /// Existing events with their new boundaries, in original order.
    pub existing: Timeline,
    /// The event to create, placed after the last existing event.
    pub new_event: Event,
}

impl UrgentPlan {
    /// The full day after insertion: existing events then the new one.
    pub fn timeline(&self) -> Timeline {
        let mut events = self.existing.events().to_vec();
        events.push(self.new_event.clone());
        // Every event was validated while the plan was built.
        Timeline::new(events).unwrap_or_default()
    }
}

/// Plan the insertion of `request` into `timeline`.
///
/// An empty day places the new event at `request.anchor`. Otherwise existing
/// events are re-chained from the first event's original start with shrunk
/// durations (see [`ShrinkPolicy`]) and the new event follows the last one.
pub fn insert_urgent(timeline: &Timeline, request: &UrgentRequest, policy: ShrinkPolicy) -> Result<UrgentPlan> {
    if request.duration <= Duration::zero() {
        return Err(ReflowError::invalid_event(
            &request.summary,
            format!("requested duration must be positive, got {}s", request.duration.num_seconds()),
        ));
    }

    let Some(anchor) = timeline.first_start() else {
        let new_event = place(request, request.anchor)?;
        return Ok(UrgentPlan {
            existing: Timeline::empty(),
            new_event,
        });
    };

    let total = micros(timeline.total_occupied());
    if total <= 0 {
        return Err(ReflowError::NothingToCompact);
    }

    let budget = match policy {
        ShrinkPolicy::Budget => timeline.total_occupied() - request.duration,
        ShrinkPolicy::Legacy => request.duration,
    };
    if budget <= Duration::zero() {
        return Err(ReflowError::EmptyBudget {
            budget_secs: budget.num_seconds(),
        });
    }

    let existing = redistribute(timeline, anchor, budget, total)?;
    let after = existing.last_end().unwrap_or(anchor);
    let new_event = place(request, after)?;

    tracing::debug!(
        ?policy,
        shrunk = existing.len(),
        new_start = %new_event.start.to_rfc3339(),
        "planned urgent insertion"
    );

    Ok(UrgentPlan { existing, new_event })
}

fn place(request: &UrgentRequest, start: DateTime<FixedOffset>) -> Result<Event> {
    let end = start
        .checked_add_signed(request.duration)
        .ok_or_else(|| ReflowError::OutOfRange {
            event: request.summary.clone(),
        })?;
    let mut event = Event::new(request.summary.clone(), start, end);
    if let Some(color) = request.color {
        event = event.with_color(color);
    }
    event.validate()?;
    Ok(event)
}
