//! Known-input regression tests for day and week layouts.
//!
//! Expected pixel values are computed by hand for the default 56px grid
//! (1344px per day, 28px per 30-minute floor).

use chrono::NaiveDate;
use daygrid_core::config::{GroupingPolicy, WeekStart};
use daygrid_core::model::{EventRecord, EventSource, parse_records};
use daygrid_layout::compose::{layout_week_records, month_grid, week_start_for};
use daygrid_layout::{
    DayLaneStrategy, DayLayout, GroupId, LayoutOptions, OverlapGraph, OverlapStats, RenderMode,
    WeekRepresentativeStrategy, layout_day_records,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 5).expect("valid date")
}

fn at(id: &str, start: &str, end: &str) -> EventRecord {
    EventRecord::timed(id, format!("2024-03-05T{start}"), format!("2024-03-05T{end}"), id)
}

fn groups_of(layout: &DayLayout) -> Vec<Vec<&str>> {
    layout
        .groups
        .iter()
        .map(|g| g.placements.iter().map(|p| p.event_id.as_str()).collect())
        .collect()
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

// ---------------------------------------------------------------------------
// Reference scenarios
// ---------------------------------------------------------------------------

#[test]
fn overlapping_pair_and_lone_short_event() {
    let records = vec![
        at("A", "09:00", "10:00"),
        at("B", "09:30", "10:30"),
        at("C", "11:00", "11:15"),
    ];
    let layout = layout_day_records(&DayLaneStrategy, &records, date(), &LayoutOptions::default());

    assert_eq!(groups_of(&layout), vec![vec!["A", "B"], vec!["C"]]);
    assert_eq!(layout.groups[0].render_mode, RenderMode::ScrollLane);
    assert_eq!(layout.groups[1].render_mode, RenderMode::Single);
    assert_eq!(layout.placement("C").map(|p| p.group_id), Some(GroupId(1)));
}

#[test]
fn lone_ten_minute_event_is_floored() {
    let layout = layout_day_records(
        &DayLaneStrategy,
        &[at("D", "08:00", "08:10")],
        date(),
        &LayoutOptions::default(),
    );
    let d = layout.placement("D").expect("D placed");
    assert_eq!(d.render_mode, RenderMode::Single);
    assert!(close(d.top, 448.0));
    assert!(close(d.height, 28.0));
}

#[test]
fn no_events_no_output() {
    for policy in [GroupingPolicy::Transitive, GroupingPolicy::AnchorSingleHop] {
        let options = LayoutOptions {
            policy,
            ..LayoutOptions::default()
        };
        let layout = layout_day_records(&DayLaneStrategy, &[], date(), &options);
        assert!(layout.is_empty());
        assert!(layout.skipped.is_empty());
        assert_eq!(layout.placements().count(), 0);
    }
}

#[test]
fn start_at_midnight_and_noon() {
    let records = vec![at("midnight", "00:00", "01:00"), at("noon", "12:00", "13:00")];
    let layout = layout_day_records(&DayLaneStrategy, &records, date(), &LayoutOptions::default());
    assert!(close(layout.placement("midnight").expect("placed").top, 0.0));
    assert!(close(layout.placement("noon").expect("placed").top, 672.0));
}

#[test]
fn touching_events_are_separate_groups() {
    let records = vec![at("first", "09:00", "10:00"), at("second", "10:00", "11:00")];
    let layout = layout_day_records(&DayLaneStrategy, &records, date(), &LayoutOptions::default());
    assert_eq!(groups_of(&layout), vec![vec!["first"], vec!["second"]]);
}

// ---------------------------------------------------------------------------
// Policies
// ---------------------------------------------------------------------------

#[test]
fn anchor_policy_splits_chains_that_transitive_keeps() {
    let records = vec![
        at("a", "09:00", "10:00"),
        at("b", "09:45", "11:00"),
        at("c", "10:30", "12:00"),
    ];
    let transitive = layout_day_records(&DayLaneStrategy, &records, date(), &LayoutOptions::default());
    assert_eq!(groups_of(&transitive), vec![vec!["a", "b", "c"]]);

    let anchored = layout_day_records(
        &DayLaneStrategy,
        &records,
        date(),
        &LayoutOptions {
            policy: GroupingPolicy::AnchorSingleHop,
            ..LayoutOptions::default()
        },
    );
    assert_eq!(groups_of(&anchored), vec![vec!["a", "b"], vec!["c"]]);
}

// ---------------------------------------------------------------------------
// Mixed sources and malformed input
// ---------------------------------------------------------------------------

#[test]
fn synced_events_lay_out_like_manual_ones() {
    let mut synced = at("MKT-7", "09:15", "09:45");
    synced.source = EventSource::Jira;
    synced.issue_key = Some("MKT-7".to_string());

    let mut keyless = at("keyless", "13:00", "14:00");
    keyless.source = EventSource::Jira;

    let records = vec![at("standup", "09:00", "09:30"), synced, keyless];
    let layout = layout_day_records(&DayLaneStrategy, &records, date(), &LayoutOptions::default());

    assert_eq!(groups_of(&layout), vec![vec!["standup", "MKT-7"]]);
    assert_eq!(layout.skipped.len(), 1);
    assert_eq!(layout.skipped[0].code, "E2003");
}

#[test]
fn records_from_json_with_offsets_keep_wall_clock() {
    let json = r#"[
        {"id": "tz", "start": "2024-03-05T09:00:00+05:00", "end": "2024-03-05T10:00:00+05:00", "allDay": false, "title": "Call"},
        {"id": "naive", "start": "2024-03-05 09:30", "end": "2024-03-05 10:30", "title": "Review"}
    ]"#;
    let records: Vec<EventRecord> = serde_json::from_str(json).expect("valid json");
    let layout = layout_day_records(&DayLaneStrategy, &records, date(), &LayoutOptions::default());
    assert_eq!(groups_of(&layout), vec![vec!["tz", "naive"]]);
    assert!(close(layout.groups[0].top, 504.0));
}

// ---------------------------------------------------------------------------
// Week, month and stats
// ---------------------------------------------------------------------------

#[test]
fn week_view_collapses_each_day_independently() {
    let records = vec![
        EventRecord::timed("mon-a", "2024-03-04T09:00", "2024-03-04T10:00", ""),
        EventRecord::timed("mon-b", "2024-03-04T09:30", "2024-03-04T10:30", ""),
        EventRecord::timed("tue-a", "2024-03-05T09:30", "2024-03-05T10:30", ""),
    ];
    let start = week_start_for(date(), WeekStart::Monday);
    let week = layout_week_records(
        &WeekRepresentativeStrategy,
        &records,
        start,
        &LayoutOptions::default(),
    );

    let monday = week.day(start).expect("monday");
    assert_eq!(monday.groups.len(), 1);
    assert_eq!(monday.groups[0].render_mode, RenderMode::RepresentativeWithCount);
    assert_eq!(monday.placement("mon-a").and_then(|p| p.hidden_count), Some(1));

    let tuesday = week.day(date()).expect("tuesday");
    assert_eq!(tuesday.groups[0].render_mode, RenderMode::Single);
}

#[test]
fn month_grid_counts_hidden_events() {
    let records: Vec<EventRecord> = (0..5)
        .map(|n| at(&format!("m{n}"), &format!("1{n}:00"), &format!("1{n}:30")))
        .collect();
    let events = parse_records(&records).events;
    let grid = month_grid(&events, date(), 3);
    assert_eq!(grid.len(), 31);
    let cell = &grid[4];
    assert_eq!(cell.date, date());
    assert_eq!(cell.visible, ["m0", "m1", "m2"]);
    assert_eq!(cell.more, 2);
}

#[test]
fn stats_describe_a_busy_morning() {
    let records = vec![
        at("a", "09:00", "10:00"),
        at("b", "09:15", "09:45"),
        at("c", "09:30", "10:30"),
        at("d", "13:00", "14:00"),
    ];
    let events = parse_records(&records).events;
    let graph = OverlapGraph::build(events.iter().map(|e| e.core()));
    let stats = OverlapStats::from_graph(&graph, GroupingPolicy::Transitive);
    assert_eq!(stats.group_count, 2);
    assert_eq!(stats.largest_group, 3);
    assert_eq!(stats.max_concurrency, 3);
}
