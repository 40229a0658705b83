//! Per-stage cost of layout passes.
//!
//! The engine wraps each pipeline stage in [`timed`] or [`timed_events`].
//! While collection is on (`--timing` or `DAYGRID_TIMING`), every call adds
//! its wall time and the number of events it handled to a running total for
//! that [`Stage`]. [`collect_report`] drains the totals of the calling thread.
//!
//! ```text
//! Read ─▶ Parse ─▶ Graph ─▶ Group ─▶ Compose      (one Total around the command)
//! ```

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt::{self, Write as _};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;

/// A step of the layout pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Loading the raw event file.
    Read,
    /// Validating records into typed events.
    Parse,
    /// Building the overlap graph for one day.
    Graph,
    /// Partitioning the graph into overlap groups.
    Group,
    /// Turning groups (or month cells) into positioned blocks.
    Compose,
    /// A whole CLI command, end to end.
    Total,
}

impl Stage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Parse => "parse",
            Self::Graph => "graph",
            Self::Group => "group",
            Self::Compose => "compose",
            Self::Total => "total",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accumulated cost of one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StageTotals {
    pub calls: usize,
    /// Events handled across all calls.
    pub events: usize,
    pub total: Duration,
    /// Slowest single call.
    pub max: Duration,
}

impl StageTotals {
    fn add(&mut self, events: usize, elapsed: Duration) {
        self.calls += 1;
        self.events += events;
        self.total += elapsed;
        self.max = self.max.max(elapsed);
    }

    /// Average wall time per call.
    #[must_use]
    pub fn mean(&self) -> Duration {
        u32::try_from(self.calls)
            .ok()
            .filter(|&calls| calls > 0)
            .map_or(Duration::ZERO, |calls| self.total / calls)
    }
}

/// Drained totals, in pipeline order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TimingReport {
    pub stages: Vec<(Stage, StageTotals)>,
}

#[derive(Serialize)]
struct StageRow {
    stage: Stage,
    calls: usize,
    events: usize,
    total_us: u64,
    mean_us: u64,
    max_us: u64,
}

thread_local! {
    static TOTALS: RefCell<BTreeMap<Stage, StageTotals>> = const { RefCell::new(BTreeMap::new()) };
}

static TIMING_ENABLED: AtomicBool = AtomicBool::new(false);

/// Returns true when `DAYGRID_TIMING` is set to `1`, `true`, `yes` or `on`.
#[must_use]
pub fn timing_enabled_from_env() -> bool {
    std::env::var("DAYGRID_TIMING")
        .ok()
        .is_some_and(|value| matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

pub fn set_timing_enabled(enabled: bool) {
    TIMING_ENABLED.store(enabled, Ordering::Relaxed);
    if !enabled {
        clear_timings();
    }
}

#[must_use]
pub fn is_timing_enabled() -> bool {
    TIMING_ENABLED.load(Ordering::Relaxed)
}

pub fn clear_timings() {
    TOTALS.with(|totals| totals.borrow_mut().clear());
}

/// Run `f` as one call of `stage`.
pub fn timed<R>(stage: Stage, f: impl FnOnce() -> R) -> R {
    timed_events(stage, 0, f)
}

/// Run `f` as one call of `stage` that handles `events` events.
pub fn timed_events<R>(stage: Stage, events: usize, f: impl FnOnce() -> R) -> R {
    if !is_timing_enabled() {
        return f();
    }

    let started = Instant::now();
    let result = f();
    record(stage, events, started.elapsed());
    result
}

fn record(stage: Stage, events: usize, elapsed: Duration) {
    TOTALS.with(|totals| totals.borrow_mut().entry(stage).or_default().add(events, elapsed));
}

/// Drain this thread's totals.
#[must_use]
pub fn collect_report() -> TimingReport {
    let totals = TOTALS.with(|totals| std::mem::take(&mut *totals.borrow_mut()));
    TimingReport {
        stages: totals.into_iter().collect(),
    }
}

impl TimingReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    #[must_use]
    pub fn get(&self, stage: Stage) -> Option<&StageTotals> {
        self.stages.iter().find(|(s, _)| *s == stage).map(|(_, t)| t)
    }

    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let rows: Vec<StageRow> = self
            .stages
            .iter()
            .map(|&(stage, t)| StageRow {
                stage,
                calls: t.calls,
                events: t.events,
                total_us: micros(t.total),
                mean_us: micros(t.mean()),
                max_us: micros(t.max),
            })
            .collect();
        serde_json::json!({ "stages": rows })
    }

    /// Fixed-width table for stderr.
    #[must_use]
    pub fn display_table(&self) -> String {
        if self.stages.is_empty() {
            return "No timing samples recorded.".to_string();
        }

        let mut out = String::from("stage      calls   events      total       mean        max\n");
        for (stage, t) in &self.stages {
            let _ = writeln!(
                out,
                "{:<9} {:>6} {:>8} {:>10} {:>10} {:>10}",
                stage.as_str(),
                t.calls,
                t.events,
                format_duration(t.total),
                format_duration(t.mean()),
                format_duration(t.max)
            );
        }
        out
    }
}

fn micros(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}

fn format_duration(duration: Duration) -> String {
    let micros = duration.as_micros();
    if micros >= 1_000 {
        format!("{}.{:03}ms", micros / 1_000, micros % 1_000)
    } else {
        format!("{micros}µs")
    }
}
