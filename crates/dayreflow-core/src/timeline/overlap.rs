//! Half-open interval overlap detection.

use chrono::{DateTime, FixedOffset};

use crate::event::Event;

/// Whether `[start_a, end_a)` and `[start_b, end_b)` intersect.
///
/// Touching boundaries do not overlap, and a zero-length interval overlaps
/// nothing, not even itself.
pub fn overlaps<T: Ord + Copy>(start_a: T, end_a: T, start_b: T, end_b: T) -> bool {
    start_a.max(start_b) < end_a.min(end_b)
}

/// Events overlapping the candidate interval, in the order given.
pub fn find_conflicts<'a, I>(
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
    events: I,
) -> Vec<&'a Event>
where
    I: IntoIterator<Item = &'a Event>,
{
    events
        .into_iter()
        .filter(|e| overlaps(start, end, e.start, e.end))
        .collect()
}
