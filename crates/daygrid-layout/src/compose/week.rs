//! Week view: one representative block per cluster plus a hidden count.

use chrono::{Datelike, NaiveDate, NaiveDateTime, TimeDelta};
use daygrid_core::config::WeekStart;
use daygrid_core::model::{CalendarEvent, EventRecord, parse_records};
use serde::Serialize;
use tracing::instrument;

use super::{
    CompositeStrategy, DayLayout, EventPlacement, GroupLayout, LayoutOptions, RenderMode,
    SkippedEvent, layout_day,
};
use crate::group::OverlapGroup;

pub const DAYS_IN_WEEK: u32 = 7;

/// The earliest member of a cluster stands in for the whole cluster.
///
/// The representative keeps its own geometry and carries
/// `hidden_count = size - 1`. Other members are still placed, with
/// `visible = false`, so a renderer can expand the cluster on demand. A
/// cluster of one renders as a plain single block.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeekRepresentativeStrategy;

impl CompositeStrategy for WeekRepresentativeStrategy {
    fn name(&self) -> &'static str {
        "week-representative"
    }

    fn compose_group(
        &self,
        group: &OverlapGroup<'_>,
        day_start: NaiveDateTime,
        options: &LayoutOptions,
    ) -> GroupLayout {
        let Some(representative) = group.members.first() else {
            return GroupLayout {
                group_id: group.id,
                render_mode: RenderMode::Single,
                top: 0.0,
                height: 0.0,
                member_count: 0,
                overflow_count: 0,
                content_width: None,
                placements: Vec::new(),
            };
        };

        let rep_geometry = options
            .grid
            .map(day_start, representative.start, representative.end);
        if group.is_single() {
            return GroupLayout::single(group.id, representative, rep_geometry);
        }

        let hidden = group.len() - 1;
        let placements = group
            .members
            .iter()
            .enumerate()
            .map(|(n, event)| {
                let geometry = options.grid.map(day_start, event.start, event.end);
                let is_rep = n == 0;
                EventPlacement {
                    event_id: event.id.clone(),
                    top: geometry.top,
                    height: geometry.height,
                    group_id: group.id,
                    render_mode: RenderMode::RepresentativeWithCount,
                    lane: None,
                    left: None,
                    visible: is_rep,
                    hidden_count: is_rep.then_some(hidden),
                }
            })
            .collect();

        GroupLayout {
            group_id: group.id,
            render_mode: RenderMode::RepresentativeWithCount,
            top: rep_geometry.top,
            height: rep_geometry.height,
            member_count: group.len(),
            overflow_count: hidden,
            content_width: None,
            placements,
        }
    }
}

/// First day of the week containing `date`.
#[must_use]
pub fn week_start_for(date: NaiveDate, starts_on: WeekStart) -> NaiveDate {
    let offset = (date.weekday().num_days_from_monday() + DAYS_IN_WEEK
        - starts_on.weekday().num_days_from_monday())
        % DAYS_IN_WEEK;
    date - TimeDelta::days(i64::from(offset))
}

/// Seven day columns laid out with the same strategy.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekLayout {
    pub start: NaiveDate,
    pub days: Vec<DayLayout>,
    /// Records rejected before layout, reported once for the whole week.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedEvent>,
}

impl WeekLayout {
    #[must_use]
    pub fn day(&self, date: NaiveDate) -> Option<&DayLayout> {
        self.days.iter().find(|d| d.date == date)
    }

    #[must_use]
    pub fn end(&self) -> NaiveDate {
        self.start + TimeDelta::days(i64::from(DAYS_IN_WEEK) - 1)
    }
}

/// Lay out seven consecutive days starting at `start`.
#[instrument(skip(strategy, events, options), fields(events = events.len()))]
pub fn layout_week<S: CompositeStrategy + ?Sized>(
    strategy: &S,
    events: &[CalendarEvent],
    start: NaiveDate,
    options: &LayoutOptions,
) -> WeekLayout {
    let days = start
        .iter_days()
        .take(DAYS_IN_WEEK as usize)
        .map(|date| layout_day(strategy, events, date, options))
        .collect();
    WeekLayout {
        start,
        days,
        skipped: Vec::new(),
    }
}

/// Parse raw records and lay out the week starting at `start`.
pub fn layout_week_records<S: CompositeStrategy + ?Sized>(
    strategy: &S,
    records: &[EventRecord],
    start: NaiveDate,
    options: &LayoutOptions,
) -> WeekLayout {
    let parsed = parse_records(records);
    let mut week = layout_week(strategy, &parsed.events, start, options);
    week.skipped = parsed.rejected.iter().map(SkippedEvent::from).collect();
    week
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).expect("valid date")
    }

    fn record(id: &str, date: u32, start: &str, end: &str) -> EventRecord {
        EventRecord::timed(
            id,
            format!("2024-03-{date:02}T{start}"),
            format!("2024-03-{date:02}T{end}"),
            id,
        )
    }

    #[test]
    fn week_start_respects_configured_first_day() {
        // 2024-03-06 is a Wednesday.
        assert_eq!(week_start_for(day(6), WeekStart::Monday), day(4));
        assert_eq!(week_start_for(day(6), WeekStart::Sunday), day(3));
        assert_eq!(week_start_for(day(4), WeekStart::Monday), day(4));
        assert_eq!(week_start_for(day(3), WeekStart::Sunday), day(3));
    }

    #[test]
    fn cluster_collapses_to_earliest_member() {
        let records = vec![
            record("late", 5, "09:30", "10:30"),
            record("early", 5, "09:00", "10:00"),
            record("third", 5, "09:45", "11:00"),
        ];
        let week = layout_week_records(
            &WeekRepresentativeStrategy,
            &records,
            day(4),
            &LayoutOptions::default(),
        );
        let tuesday = week.day(day(5)).expect("tuesday present");
        assert_eq!(tuesday.strategy, "week-representative");
        assert_eq!(tuesday.groups.len(), 1);

        let group = &tuesday.groups[0];
        assert_eq!(group.render_mode, RenderMode::RepresentativeWithCount);
        assert_eq!(group.overflow_count, 2);

        let early = tuesday.placement("early").expect("early placed");
        assert!(early.visible);
        assert_eq!(early.hidden_count, Some(2));
        assert!((early.top - 504.0).abs() < 1e-9);

        for id in ["late", "third"] {
            let p = tuesday.placement(id).expect("member placed");
            assert!(!p.visible);
            assert_eq!(p.hidden_count, None);
            assert_eq!(p.group_id, group.group_id);
        }
        assert!((tuesday.placement("late").expect("late").top - 532.0).abs() < 1e-9);
    }

    #[test]
    fn lone_event_stays_single() {
        let records = vec![record("solo", 7, "16:00", "17:00")];
        let week = layout_week_records(
            &WeekRepresentativeStrategy,
            &records,
            day(4),
            &LayoutOptions::default(),
        );
        let p = week
            .day(day(7))
            .and_then(|d| d.placement("solo"))
            .expect("solo placed");
        assert_eq!(p.render_mode, RenderMode::Single);
        assert_eq!(p.hidden_count, None);
    }

    #[test]
    fn week_has_seven_columns_and_reports_rejects_once() {
        let records = vec![
            record("mon", 4, "09:00", "10:00"),
            record("sun", 10, "09:00", "10:00"),
            record("next-mon", 11, "09:00", "10:00"),
            record("bad", 5, "nope", "10:00"),
        ];
        let week = layout_week_records(
            &WeekRepresentativeStrategy,
            &records,
            day(4),
            &LayoutOptions::default(),
        );
        assert_eq!(week.days.len(), 7);
        assert_eq!(week.end(), day(10));
        assert!(week.day(day(4)).and_then(|d| d.placement("mon")).is_some());
        assert!(week.day(day(10)).and_then(|d| d.placement("sun")).is_some());
        assert!(week.days.iter().all(|d| d.placement("next-mon").is_none()));
        assert_eq!(week.skipped.len(), 1);
        assert!(week.days.iter().all(|d| d.skipped.is_empty()));
    }
}
