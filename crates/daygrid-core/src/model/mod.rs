//! Calendar event model.
//!
//! Records arrive from the data-fetch layer as [`EventRecord`]s with raw
//! timestamp strings and are validated into tagged [`CalendarEvent`]s.

pub mod event;
pub mod timestamp;

pub use event::{
    CalendarEvent, EventCore, EventRecord, EventSource, ParsedEvents, SyncedJiraEvent,
    fingerprint, parse_records,
};
pub use timestamp::{MINUTES_PER_DAY, day_start, minutes_between, parse_date, parse_timestamp};
