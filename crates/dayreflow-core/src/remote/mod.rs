//! Remote calendar collaborators.
//!
//! The reflow engine only needs four calls from a calendar service. Everything
//! behind them (auth, pagination, wire format) stays in the implementation.

mod google;
pub mod google_codec;
mod memory;


pub use google::GoogleCalendar;
pub use memory::MemoryCalendar;

use crate::error::RemoteError;
use crate::event::Event;
use crate::timeline::DayWindow;

/// A calendar that events are read from and written back to.
///
/// Implementations are synchronous; each call is one round trip.
pub trait CalendarRemote {
    /// Timed events starting inside `window`, ordered by start.
    fn list_events(&self, window: &DayWindow) -> Result<Vec<Event>, RemoteError>;

    /// Create `event` and return it with the id the remote assigned.
    fn create_event(&self, event: &Event) -> Result<Event, RemoteError>;

    /// Replace the event stored under `id` with `event`.
    fn update_event(&self, id: &str, event: &Event) -> Result<Event, RemoteError>;

    fn delete_event(&self, id: &str) -> Result<(), RemoteError>;
}
