#![forbid(unsafe_code)]
//! daygrid-layout library.
//!
//! Places a day's timed events on a 24-hour grid.
//!
//! ```text
//! [CalendarEvent] ─▶ group::OverlapGraph ─▶ group_events(policy) ─▶ [OverlapGroup]
//!                                                                      │
//!                          grid::TimeGrid ──▶ compose::CompositeStrategy ─▶ DayLayout
//! ```
//!
//! # Conventions
//!
//! - **Purity**: layout functions never mutate their input and keep no state
//!   between calls. View state lives in [`scroll::LaneScrollState`] and
//!   refresh state in [`refresh::RefreshCoordinator`].
//! - **Errors**: bad records are skipped and reported in
//!   [`compose::DayLayout::skipped`], never returned as `Err`.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `debug!`).

pub mod compose;
pub mod grid;
pub mod group;
pub mod refresh;
pub mod scroll;

pub use compose::{
    CompositeStrategy, DayLaneStrategy, DayLayout, EventPlacement, GroupLayout, LayoutOptions,
    MonthCell, RenderMode, SkippedEvent, WeekLayout, WeekRepresentativeStrategy, layout_day,
    layout_day_records, layout_week, layout_week_records,
};
pub use grid::{BlockGeometry, TimeGrid};
pub use group::{GroupId, OverlapGraph, OverlapGroup, OverlapStats, group_events};
pub use refresh::{ChangeSignal, FetchTicket, RefreshCoordinator, RefreshOutcome};
pub use scroll::{LaneScrollState, ScrollAffordance, ScrollMetrics};
