//! `services` crate — the pieces of the admin backend that are more than a
//! pass-through call: the analytics response cache and the calendar
//! integration with its attendee sync.

pub mod cache;
pub mod calendar;
pub mod error;
pub mod mock;
pub mod sync;

pub use cache::ResponseCache;
pub use calendar::{CalendarConfig, CalendarProvider, CreatedEvent, GoogleCalendar, NewCalendarEvent};
pub use error::CalendarError;
pub use sync::{sync_attendees, Attendee, InterviewSlot, SyncOptions, SyncReport};
