//! Versioned captures of a day before it is reflowed, and their replay.
//!
//! Every compaction or urgent insertion stores its own snapshot, so each one
//! can be undone independently of later ones.

mod record;
mod restore;
mod store;


pub use record::SnapshotRecord;
pub use restore::{replay, restore, UpdateCommand};
pub use store::{Snapshot, SnapshotId, SnapshotStore, SnapshotSummary};
