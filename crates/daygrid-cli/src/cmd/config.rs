//! `dg config`: show the configuration a layout run would use.

use std::io::Write;
use std::path::Path;

use anyhow::Context;
use clap::Args;
use daygrid_core::ErrorCode;
use daygrid_core::config::{EffectiveConfig, PROJECT_CONFIG_PATH, ProjectConfig, resolve_config};
use serde::Serialize;

use crate::input::fail;
use crate::output::{CliError, OutputMode, pretty_kv, pretty_rule, pretty_section, render_mode};

/// Arguments for `dg config`.
#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    /// Print the built-in defaults as TOML, ignoring any config files.
    #[arg(long)]
    pub defaults: bool,
}

#[derive(Debug, Serialize)]
struct ConfigReport<'a> {
    source: String,
    #[serde(flatten)]
    effective: &'a EffectiveConfig,
}

/// Execute `dg config`.
pub fn run_config(
    args: &ConfigArgs,
    output: OutputMode,
    project_root: &Path,
    config_path: Option<&Path>,
) -> anyhow::Result<()> {
    if args.defaults {
        let toml = toml::to_string_pretty(&ProjectConfig::default())
            .context("Failed to serialize default config")?;
        print!("{toml}");
        return Ok(());
    }

    let effective = match resolve_config(project_root, config_path, output.is_json()) {
        Ok(effective) => effective,
        Err(err) => {
            return fail(
                output,
                &CliError::coded(ErrorCode::ConfigParseError, format!("{err:#}")),
            );
        }
    };

    let report = ConfigReport {
        source: effective.project_source.as_ref().map_or_else(
            || format!("defaults (no {PROJECT_CONFIG_PATH})"),
            |p| p.display().to_string(),
        ),
        effective: &effective,
    };

    render_mode(output, &report, write_text, write_pretty)
}

fn write_text(report: &ConfigReport<'_>, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(w, "# source: {}", report.source)?;
    let body = toml::to_string(&report.effective.project).map_err(std::io::Error::other)?;
    write!(w, "{body}")
}

fn write_pretty(report: &ConfigReport<'_>, w: &mut dyn Write) -> std::io::Result<()> {
    let p = &report.effective.project;
    pretty_section(w, "Effective configuration")?;
    pretty_kv(w, "Source", &report.source)?;
    pretty_kv(w, "Output", &report.effective.resolved_output)?;
    pretty_rule(w)?;
    pretty_kv(w, "Row height", format!("{} px", p.grid.row_height_px))?;
    pretty_kv(w, "Min duration", format!("{} min", p.grid.min_duration_minutes))?;
    pretty_kv(w, "Lane width", format!("{} px", p.lane.member_width_px))?;
    pretty_kv(w, "Lane cap", p.lane.max_visible_members.to_string())?;
    pretty_kv(w, "Grouping", p.grouping.policy.to_string())?;
    pretty_kv(w, "Week starts", format!("{:?}", p.week.starts_on))?;
    pretty_kv(w, "Month cell", format!("{} visible", p.month.visible_per_cell))
}
