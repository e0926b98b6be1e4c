//! # Dayreflow Core Library
//!
//! Reshapes one calendar day when plans change. A day that started late can be
//! squeezed into the time that is left, and an urgent event can be pushed into
//! a full day by shrinking everything else to make room. Every change is
//! preceded by a snapshot so it can be undone.
//!
//! ## Architecture
//!
//! - **Timeline**: in-memory day model, overlap detection, proportional
//!   compaction and urgent insertion. Pure computation.
//! - **Snapshots**: versioned SQLite captures of a day before it changes, and
//!   their replay.
//! - **Remote**: the calendar the day is read from and written back to
//!   (Google Calendar REST, or in memory).
//! - **Engine**: ties the above together in a fixed read, compute, snapshot,
//!   write order.
//!
//! ## Key Components
//!
//! - [`ReflowEngine`]: the operations a host application calls
//! - [`Timeline`]: one day of events
//! - [`SnapshotStore`]: snapshot persistence
//! - [`CalendarRemote`]: trait for calendar services
//! - [`Config`]: application configuration management

pub mod apply;
pub mod engine;
pub mod error;
pub mod event;
pub mod logging;
pub mod remote;
pub mod snapshot;
pub mod storage;
pub mod timeline;

pub use apply::{BatchReport, WriteBatch, WriteOp, WriteOutcome, WriteStatus};
pub use engine::{ReflowEngine, ReflowOutcome, ShrinkPlan, UrgentPreview};
pub use error::{ConfigError, ReflowError, RemoteError, Result, StorageError};
pub use event::{ColorTag, Event};
pub use logging::init_logging;
pub use remote::{CalendarRemote, GoogleCalendar, MemoryCalendar};
pub use snapshot::{Snapshot, SnapshotId, SnapshotRecord, SnapshotStore, SnapshotSummary, UpdateCommand};
pub use storage::{data_dir, Config};
pub use timeline::{compact, find_conflicts, insert_urgent, overlaps, DayWindow, ShrinkPolicy, Timeline, UrgentPlan, UrgentRequest};
