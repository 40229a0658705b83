//! Refresh on signal: re-fetch the whole day and re-lay it out.
//!
//! # Overview
//!
//! The change channel carries no payload worth merging, so every signal
//! triggers a full fetch followed by a fresh [`layout_day_records`] pass.
//!
//! ```text
//! ChangeSignal::Changed ──▶ begin_fetch() ─▶ fetch(date) ─▶ complete_fetch(ticket, records)
//!                                                              │
//!                           Stale      ◀── ticket older than last applied
//!                           Unchanged  ◀── same fingerprint and skips as current layout
//!                           Applied    ◀── otherwise; becomes the current layout
//! ```
//!
//! Fetches may complete out of order when a caller drives them from several
//! threads. Tickets carry a monotonically increasing generation and the last
//! issued fetch wins: a completion older than the last applied one is dropped.
//! A ticket also remembers the date it was issued for, so a fetch that
//! completes after [`RefreshCoordinator::set_date`] is dropped as well.

use std::sync::mpsc::{Receiver, TryRecvError};

use chrono::NaiveDate;
use daygrid_core::model::EventRecord;
use tracing::{debug, info, instrument, warn};

use crate::compose::{CompositeStrategy, DayLayout, LayoutOptions, layout_day_records};

/// Message on the change-notification channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeSignal {
    /// Something in the backing store changed; re-fetch.
    Changed,
    /// Stop the refresh loop.
    Shutdown,
}

/// Handle for one in-flight fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket {
    generation: u64,
    date: NaiveDate,
}

impl FetchTicket {
    #[must_use]
    pub const fn generation(self) -> u64 {
        self.generation
    }

    /// The day this fetch was issued for.
    #[must_use]
    pub const fn date(self) -> NaiveDate {
        self.date
    }
}

/// What happened to a completed fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// A new layout replaced the current one.
    Applied(DayLayout),
    /// The fetch produced the layout already shown.
    Unchanged,
    /// A newer fetch was applied first; this one was dropped.
    Stale,
}

/// Keeps the current layout of one day in step with its data source.
#[derive(Debug)]
pub struct RefreshCoordinator<S> {
    strategy: S,
    date: NaiveDate,
    options: LayoutOptions,
    issued: u64,
    applied: Option<u64>,
    current: Option<DayLayout>,
}

impl<S: CompositeStrategy> RefreshCoordinator<S> {
    pub const fn new(strategy: S, date: NaiveDate, options: LayoutOptions) -> Self {
        Self {
            strategy,
            date,
            options,
            issued: 0,
            applied: None,
            current: None,
        }
    }

    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    /// The most recently applied layout.
    #[must_use]
    pub const fn current(&self) -> Option<&DayLayout> {
        self.current.as_ref()
    }

    /// Switch to another day. Fetches issued for the old day are dropped
    /// when they complete; the next fetch for the new day is always applied.
    pub fn set_date(&mut self, date: NaiveDate) {
        if date != self.date {
            self.date = date;
            self.current = None;
        }
    }

    /// Issue a ticket for a fetch that is about to start.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.issued += 1;
        FetchTicket {
            generation: self.issued,
            date: self.date,
        }
    }

    /// Lay out the records a fetch returned, unless a newer fetch got there
    /// first.
    #[instrument(skip(self, records), fields(generation = ticket.generation, records = records.len()))]
    pub fn complete_fetch(&mut self, ticket: FetchTicket, records: &[EventRecord]) -> RefreshOutcome {
        if ticket.date != self.date {
            debug!(fetched_for = %ticket.date, showing = %self.date, "dropping fetch for another day");
            return RefreshOutcome::Stale;
        }
        if self.applied.is_some_and(|applied| ticket.generation < applied) {
            debug!("dropping stale fetch");
            return RefreshOutcome::Stale;
        }
        self.applied = Some(ticket.generation);

        let layout = layout_day_records(&self.strategy, records, self.date, &self.options);
        if self
            .current
            .as_ref()
            .is_some_and(|cur| cur.fingerprint == layout.fingerprint && cur.skipped == layout.skipped)
        {
            debug!(fingerprint = %layout.fingerprint, "layout unchanged");
            return RefreshOutcome::Unchanged;
        }

        self.current = Some(layout.clone());
        RefreshOutcome::Applied(layout)
    }

    /// Fetch and apply in one step.
    ///
    /// A failed fetch is logged and leaves the current layout in place.
    pub fn refresh<F>(&mut self, fetch: &mut F) -> Option<RefreshOutcome>
    where
        F: FnMut(NaiveDate) -> anyhow::Result<Vec<EventRecord>>,
    {
        let ticket = self.begin_fetch();
        match fetch(self.date) {
            Ok(records) => Some(self.complete_fetch(ticket, &records)),
            Err(err) => {
                warn!(generation = ticket.generation, "fetch failed, keeping previous layout: {err:#}");
                None
            }
        }
    }

    /// Drive refreshes from a change channel until shutdown or disconnect.
    ///
    /// Performs one initial fetch, then one fetch per burst of queued
    /// signals. `on_layout` is called only when the layout actually changed.
    /// Returns the number of layouts emitted.
    pub fn run<F, G>(&mut self, signals: &Receiver<ChangeSignal>, mut fetch: F, mut on_layout: G) -> usize
    where
        F: FnMut(NaiveDate) -> anyhow::Result<Vec<EventRecord>>,
        G: FnMut(&DayLayout),
    {
        let mut emitted = 0;
        let mut emit = |outcome: Option<RefreshOutcome>| {
            if let Some(RefreshOutcome::Applied(layout)) = outcome {
                on_layout(&layout);
                emitted += 1;
            }
        };

        emit(self.refresh(&mut fetch));

        while let Ok(signal) = signals.recv() {
            if signal == ChangeSignal::Shutdown {
                break;
            }

            // Coalesce a burst of signals into a single fetch.
            let mut shutdown = false;
            let mut coalesced = 0usize;
            loop {
                match signals.try_recv() {
                    Ok(ChangeSignal::Changed) => coalesced += 1,
                    Ok(ChangeSignal::Shutdown) | Err(TryRecvError::Disconnected) => {
                        shutdown = true;
                        break;
                    }
                    Err(TryRecvError::Empty) => break,
                }
            }
            if coalesced > 0 {
                debug!(coalesced, "coalesced change signals");
            }

            emit(self.refresh(&mut fetch));
            if shutdown {
                break;
            }
        }

        info!(emitted, "refresh loop stopped");
        emitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::DayLaneStrategy;
    use std::sync::mpsc;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 5).expect("valid date")
    }

    fn record(id: &str, start: &str, end: &str) -> EventRecord {
        EventRecord::timed(id, format!("2024-03-05T{start}"), format!("2024-03-05T{end}"), id)
    }

    fn coordinator() -> RefreshCoordinator<DayLaneStrategy> {
        RefreshCoordinator::new(DayLaneStrategy, date(), LayoutOptions::default())
    }

    #[test]
    fn last_fetch_wins() {
        let mut coord = coordinator();
        let older = coord.begin_fetch();
        let newer = coord.begin_fetch();
        assert!(newer > older);

        let applied = coord.complete_fetch(newer, &[record("new", "09:00", "10:00")]);
        assert!(matches!(applied, RefreshOutcome::Applied(_)));

        let stale = coord.complete_fetch(older, &[record("old", "09:00", "10:00")]);
        assert_eq!(stale, RefreshOutcome::Stale);
        assert!(coord.current().and_then(|l| l.placement("new")).is_some());
    }

    #[test]
    fn identical_data_is_not_re_emitted() {
        let mut coord = coordinator();
        let records = vec![record("a", "09:00", "10:00")];
        let first = coord.begin_fetch();
        assert!(matches!(coord.complete_fetch(first, &records), RefreshOutcome::Applied(_)));

        let mut retitled = records.clone();
        retitled[0].title = "Renamed".to_string();
        let second = coord.begin_fetch();
        assert_eq!(coord.complete_fetch(second, &retitled), RefreshOutcome::Unchanged);

        let moved = vec![record("a", "09:30", "10:30")];
        let third = coord.begin_fetch();
        assert!(matches!(coord.complete_fetch(third, &moved), RefreshOutcome::Applied(_)));
    }

    #[test]
    fn fetch_error_keeps_previous_layout() {
        let mut coord = coordinator();
        let mut ok = |_: NaiveDate| -> anyhow::Result<Vec<EventRecord>> {
            Ok(vec![record("a", "09:00", "10:00")])
        };
        assert!(coord.refresh(&mut ok).is_some());

        let mut failing = |_: NaiveDate| -> anyhow::Result<Vec<EventRecord>> {
            anyhow::bail!("backend unavailable")
        };
        assert!(coord.refresh(&mut failing).is_none());
        assert!(coord.current().and_then(|l| l.placement("a")).is_some());
    }

    #[test]
    fn run_coalesces_queued_signals() {
        let (tx, rx) = mpsc::channel();
        for _ in 0..3 {
            tx.send(ChangeSignal::Changed).expect("send");
        }
        tx.send(ChangeSignal::Shutdown).expect("send");

        let mut fetches = 0;
        let mut layouts = Vec::new();
        let mut coord = coordinator();
        let emitted = coord.run(
            &rx,
            |_| {
                fetches += 1;
                Ok(vec![record(&format!("v{fetches}"), "09:00", "10:00")])
            },
            |layout| layouts.push(layout.fingerprint.clone()),
        );

        // Initial fetch plus one for the whole burst.
        assert_eq!(fetches, 2);
        assert_eq!(emitted, 2);
        assert_eq!(layouts.len(), 2);
        assert_ne!(layouts[0], layouts[1]);
    }

    #[test]
    fn run_stops_when_sender_drops() {
        let (tx, rx) = mpsc::channel::<ChangeSignal>();
        drop(tx);
        let mut coord = coordinator();
        let emitted = coord.run(&rx, |_| Ok(Vec::new()), |_| {});
        assert_eq!(emitted, 1);
        assert!(coord.current().is_some_and(DayLayout::is_empty));
    }

    #[test]
    fn changing_date_forces_a_fresh_layout() {
        let mut coord = coordinator();
        let mut empty = |_: NaiveDate| -> anyhow::Result<Vec<EventRecord>> { Ok(Vec::new()) };
        assert!(matches!(coord.refresh(&mut empty), Some(RefreshOutcome::Applied(_))));
        assert_eq!(coord.refresh(&mut empty), Some(RefreshOutcome::Unchanged));

        let next = date().succ_opt().expect("next day");
        coord.set_date(next);
        assert!(matches!(coord.refresh(&mut empty), Some(RefreshOutcome::Applied(l)) if l.date == next));
    }

    #[test]
    fn fetch_issued_before_date_change_is_stale() {
        let mut coord = coordinator();
        let before = coord.begin_fetch();
        assert_eq!(before.date(), date());

        let next = date().succ_opt().expect("next day");
        coord.set_date(next);
        let after = coord.begin_fetch();

        let outcome = coord.complete_fetch(before, &[record("x", "09:00", "10:00")]);
        assert_eq!(outcome, RefreshOutcome::Stale);
        assert!(coord.current().is_none());

        let next_day = EventRecord::timed("y", "2024-03-06T09:00", "2024-03-06T10:00", "y");
        let applied = coord.complete_fetch(after, &[next_day]);
        assert!(
            matches!(applied, RefreshOutcome::Applied(ref l) if l.date == next && l.placement("y").is_some())
        );
    }
}
