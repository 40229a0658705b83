//! Month view cells: a short list of titles and a "+N more" count per day.

use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};
use daygrid_core::model::{CalendarEvent, EventCore};
use daygrid_core::timing::{self, Stage};
use serde::Serialize;

use crate::group::chronological;

/// Summary of one day in a month grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthCell {
    pub date: NaiveDate,
    /// Ids shown in the cell, all-day events first.
    pub visible: Vec<String>,
    /// Events left out of `visible`.
    pub more: usize,
    pub total: usize,
}

/// Build the cell for `date`, showing at most `limit` events.
#[must_use]
pub fn month_cell(events: &[CalendarEvent], date: NaiveDate, limit: usize) -> MonthCell {
    let mut day: Vec<&EventCore> = events
        .iter()
        .map(CalendarEvent::core)
        .filter(|e| e.occurs_on(date))
        .filter(|e| e.all_day || e.end > e.start)
        .collect();
    let mut seen = HashSet::new();
    day.retain(|e| seen.insert(e.id.as_str()));
    day.sort_by(|a, b| b.all_day.cmp(&a.all_day).then_with(|| chronological(a, b)));

    let total = day.len();
    let visible: Vec<String> = day.iter().take(limit).map(|e| e.id.clone()).collect();
    MonthCell {
        date,
        more: total - visible.len(),
        visible,
        total,
    }
}

/// One cell per day of the month containing `any_day`.
#[must_use]
pub fn month_grid(events: &[CalendarEvent], any_day: NaiveDate, limit: usize) -> Vec<MonthCell> {
    let Some(first) = any_day.with_day(1) else {
        return Vec::new();
    };
    timing::timed_events(Stage::Compose, events.len(), || {
        first
            .iter_days()
            .take_while(|d| d.month() == first.month())
            .map(|d| month_cell(events, d, limit))
            .collect()
    })
}
