//! `dg stats`: overlap density report for one day.

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Args;
use daygrid_core::config::GroupingPolicy;
use daygrid_core::model::{CalendarEvent, parse_records};
use daygrid_core::timing::{self, Stage};
use daygrid_layout::{OverlapGraph, OverlapStats};
use serde::Serialize;

use crate::cmd::layout::PolicyArg;
use crate::input::{fail, load_options, parse_date_arg, read_records};
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

/// Arguments for `dg stats`.
#[derive(Args, Debug)]
pub struct StatsArgs {
    /// JSON file holding an array of event records (`-` for stdin).
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Day to analyse (YYYY-MM-DD).
    #[arg(long)]
    pub date: String,

    /// Override the configured grouping policy.
    #[arg(long, value_enum)]
    pub policy: Option<PolicyArg>,
}

/// Report payload for `dg stats`.
#[derive(Debug, Serialize)]
pub struct DayStats {
    pub date: String,
    pub policy: String,
    pub records: usize,
    pub rejected: usize,
    pub all_day: usize,
    #[serde(flatten)]
    pub overlap: OverlapStats,
}

/// Execute `dg stats`.
pub fn run_stats(
    args: &StatsArgs,
    output: OutputMode,
    project_root: &Path,
    config_path: Option<&Path>,
) -> anyhow::Result<()> {
    let date = match parse_date_arg(&args.date) {
        Ok(date) => date,
        Err(err) => return fail(output, &err),
    };
    let policy: GroupingPolicy = match (args.policy, load_options(project_root, config_path)) {
        (Some(policy), _) => policy.into(),
        (None, Ok(options)) => options.policy,
        (None, Err(err)) => return fail(output, &err),
    };
    let records = match timing::timed(Stage::Read, || read_records(&args.file)) {
        Ok(records) => records,
        Err(err) => return fail(output, &err),
    };

    let parsed = parse_records(&records);
    let on_day: Vec<&CalendarEvent> = parsed
        .events
        .iter()
        .filter(|e| e.core().occurs_on(date))
        .collect();
    let graph = timing::timed_events(Stage::Graph, on_day.len(), || {
        OverlapGraph::build(on_day.iter().map(|e| e.core()))
    });

    let payload = DayStats {
        date: date.to_string(),
        policy: policy.to_string(),
        records: records.len(),
        rejected: parsed.rejected.len(),
        all_day: on_day.iter().filter(|e| e.is_all_day()).count(),
        overlap: OverlapStats::from_graph(&graph, policy),
    };

    render_mode(output, &payload, write_text, write_pretty)
}

fn write_text(s: &DayStats, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(
        w,
        "date={} policy={} events={} all_day={} rejected={} pairs={} groups={} multi={} largest={} peak={}",
        s.date,
        s.policy,
        s.overlap.event_count,
        s.all_day,
        s.rejected,
        s.overlap.overlap_pairs,
        s.overlap.group_count,
        s.overlap.multi_event_groups,
        s.overlap.largest_group,
        s.overlap.max_concurrency
    )
}

fn write_pretty(s: &DayStats, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, &format!("Overlap stats for {}", s.date))?;
    pretty_kv(w, "Policy", &s.policy)?;
    pretty_kv(w, "Timed events", s.overlap.event_count.to_string())?;
    pretty_kv(w, "All-day", s.all_day.to_string())?;
    pretty_kv(w, "Rejected", format!("{} of {}", s.rejected, s.records))?;
    pretty_kv(w, "Overlaps", s.overlap.overlap_pairs.to_string())?;
    pretty_kv(
        w,
        "Groups",
        format!(
            "{} ({} with overlap, largest {})",
            s.overlap.group_count, s.overlap.multi_event_groups, s.overlap.largest_group
        ),
    )?;
    pretty_kv(w, "Peak", format!("{} at once", s.overlap.max_concurrency))
}
