//! Day timeline and the reflow computations over it.
//!
//! This module provides:
//! - The in-memory model of one day's events
//! - Half-open overlap detection
//! - Proportional compaction into a time budget
//! - Urgent insertion by proportional shrinking
//!
//! Nothing in here talks to a remote calendar.

mod compact;
mod model;
mod overlap;
mod urgent;
mod window;

pub use compact::compact;
pub use model::Timeline;
pub use overlap::{find_conflicts, overlaps};
pub use urgent::{insert_urgent, ShrinkPolicy, UrgentPlan, UrgentRequest};
pub use window::DayWindow;
