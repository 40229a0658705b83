//! Layout compositing: turn overlap groups into positioned blocks.
//!
//! # Overview
//!
//! [`layout_day`] is the engine entry point. It selects the events that
//! belong on a date, moves all-day events to their own lane, groups the timed
//! ones (see [`crate::group`]) and hands every group to a
//! [`CompositeStrategy`], which decides how the group is drawn:
//!
//! | strategy                        | multi-event group drawn as                    |
//! |---------------------------------|-----------------------------------------------|
//! | [`day::DayLaneStrategy`]        | one envelope box with a scrollable member row |
//! | [`week::WeekRepresentativeStrategy`] | earliest member plus a "+N more" badge   |
//!
//! Every function here is pure: same input, same [`DayLayout`].

use std::collections::HashSet;

use chrono::{NaiveDate, NaiveDateTime};
use daygrid_core::config::{GroupingPolicy, ProjectConfig, WeekStart};
use daygrid_core::model::{CalendarEvent, EventCore, EventRecord, day_start, fingerprint, parse_records};
use daygrid_core::timing::{self, Stage};
use daygrid_core::{ErrorCode, EventError};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::grid::{BlockGeometry, TimeGrid};
use crate::group::{GroupId, OverlapGraph, OverlapGroup, chronological, group_events};

pub mod day;
pub mod month;
pub mod week;

pub use day::DayLaneStrategy;
pub use month::{MonthCell, month_cell, month_grid};
pub use week::{
    WeekLayout, WeekRepresentativeStrategy, layout_week, layout_week_records, week_start_for,
};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Everything the compositor needs besides the events themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutOptions {
    pub grid: TimeGrid,
    pub lane_member_width_px: f64,
    /// Scroll-lane members beyond this are hidden and counted instead.
    pub max_lane_members: usize,
    pub policy: GroupingPolicy,
    pub week_start: WeekStart,
    pub month_visible: usize,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self::from(&ProjectConfig::default())
    }
}

impl From<&ProjectConfig> for LayoutOptions {
    fn from(config: &ProjectConfig) -> Self {
        Self {
            grid: TimeGrid::from(&config.grid),
            lane_member_width_px: config.lane.member_width_px,
            max_lane_members: config.lane.max_visible_members.max(1),
            policy: config.grouping.policy,
            week_start: config.week.starts_on,
            month_visible: config.month.visible_per_cell.max(1),
        }
    }
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// How a block is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RenderMode {
    #[serde(rename = "single")]
    Single,
    #[serde(rename = "scrollLane")]
    ScrollLane,
    #[serde(rename = "representative+count")]
    RepresentativeWithCount,
}

impl RenderMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::ScrollLane => "scrollLane",
            Self::RepresentativeWithCount => "representative+count",
        }
    }
}

/// Position and mode of one timed event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPlacement {
    pub event_id: String,
    pub top: f64,
    pub height: f64,
    pub group_id: GroupId,
    pub render_mode: RenderMode,
    /// Position inside a scroll lane, left to right.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lane: Option<usize>,
    /// Horizontal offset inside a scroll lane.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<f64>,
    pub visible: bool,
    /// "+N more" count carried by a representative.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hidden_count: Option<usize>,
}

/// One rendered group: its container box plus its members.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupLayout {
    pub group_id: GroupId,
    pub render_mode: RenderMode,
    pub top: f64,
    pub height: f64,
    pub member_count: usize,
    /// Members not drawn as blocks of their own.
    pub overflow_count: usize,
    /// Scrollable width of a lane row.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_width: Option<f64>,
    pub placements: Vec<EventPlacement>,
}

impl GroupLayout {
    /// A one-event group drawn at the event's own geometry.
    pub(crate) fn single(id: GroupId, event: &EventCore, geometry: BlockGeometry) -> Self {
        Self {
            group_id: id,
            render_mode: RenderMode::Single,
            top: geometry.top,
            height: geometry.height,
            member_count: 1,
            overflow_count: 0,
            content_width: None,
            placements: vec![EventPlacement {
                event_id: event.id.clone(),
                top: geometry.top,
                height: geometry.height,
                group_id: id,
                render_mode: RenderMode::Single,
                lane: None,
                left: None,
                visible: true,
                hidden_count: None,
            }],
        }
    }

    #[must_use]
    pub fn visible_placements(&self) -> impl Iterator<Item = &EventPlacement> {
        self.placements.iter().filter(|p| p.visible)
    }
}

/// A record or event that could not be laid out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub code: &'static str,
    pub reason: String,
}

impl From<&EventError> for SkippedEvent {
    fn from(err: &EventError) -> Self {
        Self {
            event_id: err.event_id().map(str::to_string),
            code: err.code().code(),
            reason: err.to_string(),
        }
    }
}

impl SkippedEvent {
    #[must_use]
    pub fn error_code(&self) -> Option<ErrorCode> {
        [
            ErrorCode::InvalidTimestamp,
            ErrorCode::EmptyInterval,
            ErrorCode::MissingIssueKey,
            ErrorCode::EmptyEventId,
            ErrorCode::DuplicateEventId,
        ]
        .into_iter()
        .find(|code| code.code() == self.code)
    }
}

/// Layout of one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayLayout {
    pub date: NaiveDate,
    pub strategy: &'static str,
    /// Fingerprint of the events placed on this day.
    pub fingerprint: String,
    /// Ids of all-day events, in start order.
    pub all_day: Vec<String>,
    pub groups: Vec<GroupLayout>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedEvent>,
}

impl DayLayout {
    pub fn placements(&self) -> impl Iterator<Item = &EventPlacement> {
        self.groups.iter().flat_map(|g| g.placements.iter())
    }

    #[must_use]
    pub fn placement(&self, event_id: &str) -> Option<&EventPlacement> {
        self.placements().find(|p| p.event_id == event_id)
    }

    #[must_use]
    pub fn group(&self, id: GroupId) -> Option<&GroupLayout> {
        self.groups.iter().find(|g| g.group_id == id)
    }

    /// True when there is nothing to draw.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.all_day.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Strategy seam
// ---------------------------------------------------------------------------

/// Decides how one overlap group is drawn.
pub trait CompositeStrategy {
    /// Stable name reported in [`DayLayout::strategy`].
    fn name(&self) -> &'static str;

    /// Lay out a non-empty group whose members are in chronological order.
    fn compose_group(
        &self,
        group: &OverlapGroup<'_>,
        day_start: NaiveDateTime,
        options: &LayoutOptions,
    ) -> GroupLayout;
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Lay out the events that belong on `date`.
///
/// Events on other dates are ignored. Timed events that do not end after they
/// start, and repeated ids, are skipped and reported rather than failing the
/// whole day.
#[instrument(skip_all, fields(date = %date, strategy = strategy.name()))]
pub fn layout_day<S: CompositeStrategy + ?Sized>(
    strategy: &S,
    events: &[CalendarEvent],
    date: NaiveDate,
    options: &LayoutOptions,
) -> DayLayout {
    let mut skipped = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut all_day: Vec<&EventCore> = Vec::new();
    let mut timed: Vec<&EventCore> = Vec::new();

    for core in events.iter().map(CalendarEvent::core) {
        if !core.occurs_on(date) {
            continue;
        }
        if !seen.insert(core.id.as_str()) {
            let err = EventError::DuplicateId {
                id: core.id.clone(),
            };
            warn!(code = %err.code(), "skipping event: {err}");
            skipped.push(SkippedEvent::from(&err));
            continue;
        }
        if core.all_day {
            all_day.push(core);
        } else if core.end <= core.start {
            let err = EventError::EmptyInterval {
                id: core.id.clone(),
                start: core.start.to_string(),
                end: core.end.to_string(),
            };
            warn!(code = %err.code(), "skipping event: {err}");
            skipped.push(SkippedEvent::from(&err));
        } else {
            timed.push(core);
        }
    }

    let fingerprint = fingerprint(all_day.iter().chain(timed.iter()).copied());

    all_day.sort_by(|a, b| chronological(a, b));
    let all_day = all_day.into_iter().map(|e| e.id.clone()).collect();

    let day_start = day_start(date);
    let event_count = timed.len();
    let graph = timing::timed_events(Stage::Graph, event_count, || OverlapGraph::build(timed));
    let overlap_groups =
        timing::timed_events(Stage::Group, event_count, || group_events(&graph, options.policy));
    let groups: Vec<GroupLayout> = timing::timed_events(Stage::Compose, event_count, || {
        overlap_groups
            .iter()
            .filter(|group| !group.is_empty())
            .map(|group| strategy.compose_group(group, day_start, options))
            .collect()
    });

    debug!(groups = groups.len(), skipped = skipped.len(), "day composed");

    DayLayout {
        date,
        strategy: strategy.name(),
        fingerprint,
        all_day,
        groups,
        skipped,
    }
}

/// Parse raw records and lay out `date`.
///
/// Records that fail to parse are reported first in [`DayLayout::skipped`],
/// whatever day they were meant for.
pub fn layout_day_records<S: CompositeStrategy + ?Sized>(
    strategy: &S,
    records: &[EventRecord],
    date: NaiveDate,
    options: &LayoutOptions,
) -> DayLayout {
    let parsed = parse_records(records);
    let mut layout = layout_day(strategy, &parsed.events, date, options);
    let mut skipped: Vec<SkippedEvent> = parsed.rejected.iter().map(SkippedEvent::from).collect();
    skipped.append(&mut layout.skipped);
    layout.skipped = skipped;
    layout
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
