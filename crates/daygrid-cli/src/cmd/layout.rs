//! `dg layout`: lay out an event file for a day, week or month.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use clap::{Args, ValueEnum};
use daygrid_core::config::GroupingPolicy;
use daygrid_core::model::parse_records;
use daygrid_core::timing::{self, Stage};
use daygrid_layout::compose::{month_grid, week_start_for};
use daygrid_layout::{
    DayLaneStrategy, DayLayout, EventPlacement, LayoutOptions, MonthCell, RenderMode,
    SkippedEvent, TimeGrid, WeekLayout, WeekRepresentativeStrategy, layout_day_records,
    layout_week_records,
};
use serde::Serialize;
use tracing::debug;

use crate::input::{fail, load_options, parse_date_arg, read_records};
use crate::output::{OutputMode, pretty_kv, pretty_rule, pretty_section, render_mode};

/// Which calendar view to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum View {
    /// One day with scrollable lanes for overlapping events.
    #[default]
    Day,
    /// Seven days with one representative block per overlap cluster.
    Week,
    /// Per-day summaries for the whole month.
    Month,
}

/// Grouping policy override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    /// Connected components of the overlap relation.
    Transitive,
    /// Earliest event plus the events overlapping it directly.
    Anchor,
}

impl From<PolicyArg> for GroupingPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Transitive => Self::Transitive,
            PolicyArg::Anchor => Self::AnchorSingleHop,
        }
    }
}

/// Arguments for `dg layout`.
#[derive(Args, Debug)]
pub struct LayoutArgs {
    /// JSON file holding an array of event records (`-` for stdin).
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Day to lay out (YYYY-MM-DD). Week view starts on the configured
    /// first day of the week containing it.
    #[arg(long)]
    pub date: String,

    /// View to compute.
    #[arg(long, value_enum, default_value_t = View::Day)]
    pub view: View,

    /// Override the configured grouping policy.
    #[arg(long, value_enum)]
    pub policy: Option<PolicyArg>,
}

/// JSON payload for the month view.
#[derive(Debug, Serialize)]
struct MonthView {
    month: String,
    cells: Vec<MonthCell>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    skipped: Vec<SkippedEvent>,
}

/// Execute `dg layout`.
pub fn run_layout(
    args: &LayoutArgs,
    output: OutputMode,
    project_root: &Path,
    config_path: Option<&Path>,
) -> anyhow::Result<()> {
    let date = match parse_date_arg(&args.date) {
        Ok(date) => date,
        Err(err) => return fail(output, &err),
    };
    let mut options = match load_options(project_root, config_path) {
        Ok(options) => options,
        Err(err) => return fail(output, &err),
    };
    if let Some(policy) = args.policy {
        options.policy = policy.into();
    }
    let records = match timing::timed(Stage::Read, || read_records(&args.file)) {
        Ok(records) => records,
        Err(err) => return fail(output, &err),
    };
    debug!(view = ?args.view, %date, policy = %options.policy, "laying out");

    match args.view {
        View::Day => {
            let layout = layout_day_records(&DayLaneStrategy, &records, date, &options);
            render_mode(
                output,
                &layout,
                |l, w| write_day_text(w, l),
                |l, w| write_day_pretty(w, l, &options.grid),
            )
        }
        View::Week => {
            let start = week_start_for(date, options.week_start);
            let week =
                layout_week_records(&WeekRepresentativeStrategy, &records, start, &options);
            render_mode(
                output,
                &week,
                |wk, w| write_week_text(w, wk),
                |wk, w| write_week_pretty(w, wk, &options.grid),
            )
        }
        View::Month => {
            let view = month_view(&records, date, &options);
            render_mode(output, &view, write_month_text, write_month_pretty)
        }
    }
}

fn month_view(
    records: &[daygrid_core::model::EventRecord],
    date: NaiveDate,
    options: &LayoutOptions,
) -> MonthView {
    let parsed = parse_records(records);
    MonthView {
        month: format!("{:04}-{:02}", date.year(), date.month()),
        cells: month_grid(&parsed.events, date, options.month_visible),
        skipped: parsed.rejected.iter().map(SkippedEvent::from).collect(),
    }
}

// ---------------------------------------------------------------------------
// Text rendering
// ---------------------------------------------------------------------------

fn placement_fields(p: &EventPlacement) -> String {
    let mut line = format!(
        "{}  top={:.1}  height={:.1}  group={}  mode={}",
        p.event_id,
        p.top,
        p.height,
        p.group_id,
        p.render_mode.as_str()
    );
    if let (Some(lane), Some(left)) = (p.lane, p.left) {
        line.push_str(&format!("  lane={lane}  left={left:.1}"));
    }
    if let Some(hidden) = p.hidden_count {
        line.push_str(&format!("  more={hidden}"));
    }
    if !p.visible {
        line.push_str("  hidden");
    }
    line
}

fn write_skipped_text(w: &mut dyn Write, skipped: &[SkippedEvent]) -> io::Result<()> {
    for s in skipped {
        writeln!(
            w,
            "skipped  {}  {}  {}",
            s.code,
            s.event_id.as_deref().unwrap_or("-"),
            s.reason
        )?;
    }
    Ok(())
}

fn write_day_body_text(w: &mut dyn Write, layout: &DayLayout, prefix: &str) -> io::Result<()> {
    for id in &layout.all_day {
        writeln!(w, "{prefix}allDay  {id}")?;
    }
    for p in layout.placements() {
        writeln!(w, "{prefix}{}", placement_fields(p))?;
    }
    Ok(())
}

fn write_day_text(w: &mut dyn Write, layout: &DayLayout) -> io::Result<()> {
    write_day_body_text(w, layout, "")?;
    write_skipped_text(w, &layout.skipped)
}

fn write_week_text(w: &mut dyn Write, week: &WeekLayout) -> io::Result<()> {
    for day in &week.days {
        write_day_body_text(w, day, &format!("{}  ", day.date))?;
    }
    write_skipped_text(w, &week.skipped)
}

fn write_month_text(view: &MonthView, w: &mut dyn Write) -> io::Result<()> {
    for cell in view.cells.iter().filter(|c| c.total > 0) {
        write!(w, "{}  {}", cell.date, cell.visible.join(","))?;
        if cell.more > 0 {
            write!(w, "  +{}", cell.more)?;
        }
        writeln!(w)?;
    }
    write_skipped_text(w, &view.skipped)
}

// ---------------------------------------------------------------------------
// Pretty rendering
// ---------------------------------------------------------------------------

fn clock(grid: &TimeGrid, y: f64) -> String {
    let minute = grid.minute_at(y);
    format!("{:02}:{:02}", minute / 60, minute % 60)
}

fn write_day_pretty_body(w: &mut dyn Write, layout: &DayLayout, grid: &TimeGrid) -> io::Result<()> {
    if layout.is_empty() {
        writeln!(w, "  (no events)")?;
        return Ok(());
    }
    if !layout.all_day.is_empty() {
        writeln!(w, "  all day   {}", layout.all_day.join(", "))?;
    }
    for group in &layout.groups {
        let names: Vec<&str> = group.visible_placements().map(|p| p.event_id.as_str()).collect();
        let detail = match group.render_mode {
            RenderMode::Single => String::new(),
            RenderMode::ScrollLane if group.overflow_count > 0 => {
                format!("  [lane of {}, +{} more]", group.member_count, group.overflow_count)
            }
            RenderMode::ScrollLane => format!("  [lane of {}]", group.member_count),
            RenderMode::RepresentativeWithCount => format!("  [+{} more]", group.overflow_count),
        };
        writeln!(
            w,
            "  {}     {}{}",
            clock(grid, group.top),
            names.join(" | "),
            detail
        )?;
    }
    Ok(())
}

fn write_skipped_pretty(w: &mut dyn Write, skipped: &[SkippedEvent]) -> io::Result<()> {
    if skipped.is_empty() {
        return Ok(());
    }
    writeln!(w)?;
    pretty_section(w, "Skipped")?;
    for s in skipped {
        writeln!(w, "  {}  {}", s.code, s.reason)?;
    }
    Ok(())
}

fn write_day_pretty(w: &mut dyn Write, layout: &DayLayout, grid: &TimeGrid) -> io::Result<()> {
    pretty_section(w, &format!("Day {}", layout.date.format("%a %Y-%m-%d")))?;
    write_day_pretty_body(w, layout, grid)?;
    pretty_rule(w)?;
    pretty_kv(w, "Groups", layout.groups.len().to_string())?;
    pretty_kv(w, "Fingerprint", &layout.fingerprint)?;
    write_skipped_pretty(w, &layout.skipped)
}

fn write_week_pretty(w: &mut dyn Write, week: &WeekLayout, grid: &TimeGrid) -> io::Result<()> {
    pretty_section(w, &format!("Week {} .. {}", week.start, week.end()))?;
    for day in &week.days {
        writeln!(w, "{}", day.date.format("%a %Y-%m-%d"))?;
        write_day_pretty_body(w, day, grid)?;
    }
    write_skipped_pretty(w, &week.skipped)
}

fn write_month_pretty(view: &MonthView, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, &format!("Month {}", view.month))?;
    for cell in view.cells.iter().filter(|c| c.total > 0) {
        let more = if cell.more > 0 {
            format!("  (+{} more)", cell.more)
        } else {
            String::new()
        };
        writeln!(w, "  {}  {}{}", cell.date.format("%a %d"), cell.visible.join(", "), more)?;
    }
    write_skipped_pretty(w, &view.skipped)
}
