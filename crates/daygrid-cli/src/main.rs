#![forbid(unsafe_code)]

mod cmd;
mod input;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use daygrid_core::config::load_user_config;
use daygrid_core::timing::{self, Stage};
use output::{OutputMode, resolve_output_mode};
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "dg",
    author,
    version,
    about = "daygrid: calendar day/week layout engine",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit command timing report to stderr.
    #[arg(long, global = true)]
    timing: bool,

    /// Output format (defaults to pretty on a TTY, text when piped).
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Alias for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    /// Use this config file instead of `.daygrid/config.toml`.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Derive the output mode from flags, environment and user config.
    fn output_mode(&self) -> OutputMode {
        if self.format.is_some() || self.json {
            return resolve_output_mode(self.format, self.json, None);
        }
        let user_output = match load_user_config() {
            Ok(user) => user.output,
            Err(err) => {
                warn!("ignoring user config: {err:#}");
                None
            }
        };
        resolve_output_mode(None, false, user_output.as_deref())
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Layout",
        about = "Lay out events for a day, week or month",
        long_about = "Read a JSON array of event records and compute block positions for one view.",
        after_help = "EXAMPLES:\n    # Day view\n    dg layout events.json --date 2024-03-05\n\n    # Week view from stdin\n    cat events.json | dg layout - --date 2024-03-05 --view week\n\n    # Emit machine-readable output\n    dg layout events.json --date 2024-03-05 --format json"
    )]
    Layout(cmd::layout::LayoutArgs),

    #[command(
        next_help_heading = "Layout",
        about = "Report overlap statistics for a day",
        long_about = "Count overlapping pairs, groups and peak concurrency for one day's timed events.",
        after_help = "EXAMPLES:\n    # Stats for a day\n    dg stats events.json --date 2024-03-05\n\n    # Compare grouping policies\n    dg stats events.json --date 2024-03-05 --policy anchor"
    )]
    Stats(cmd::stats::StatsArgs),

    #[command(
        next_help_heading = "Project Maintenance",
        about = "Show effective configuration",
        long_about = "Show the configuration resolved from --config, .daygrid/config.toml and the user config.",
        after_help = "EXAMPLES:\n    # Show resolved config\n    dg config\n\n    # Start a config file from the defaults\n    dg config --defaults > .daygrid/config.toml"
    )]
    Config(cmd::config::ConfigArgs),

    #[command(
        next_help_heading = "Project Maintenance",
        about = "Generate shell completion scripts",
        long_about = "Generate shell completion scripts for supported shells.",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    dg completions bash\n\n    # Generate zsh completions\n    dg completions zsh"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("DAYGRID_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "daygrid=debug,info"
        } else {
            "daygrid=info,warn"
        })
    });

    let format = env::var("DAYGRID_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let timing_enabled = cli.timing || timing::timing_enabled_from_env();
    timing::set_timing_enabled(timing_enabled);
    timing::clear_timings();

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let project_root = std::env::current_dir()?;
    let config_path = cli.config.as_deref();
    let output = cli.output_mode();

    let command_result = timing::timed(Stage::Total, || match &cli.command {
        Commands::Layout(args) => cmd::layout::run_layout(args, output, &project_root, config_path),
        Commands::Stats(args) => cmd::stats::run_stats(args, output, &project_root, config_path),
        Commands::Config(args) => cmd::config::run_config(args, output, &project_root, config_path),
        Commands::Completions(args) => {
            cmd::completions::run_completions(args.shell, &mut Cli::command())
        }
    });

    if timing_enabled {
        let report = timing::collect_report();
        if report.is_empty() {
            eprintln!("timing report: no samples recorded");
        } else {
            eprintln!("timing report:");
            eprintln!("{}", report.display_table());
            eprintln!("timing report (json):");
            eprintln!("{}", serde_json::to_string_pretty(&report.to_json())?);
        }
    }

    match command_result {
        // Already rendered on stderr in the requested format.
        Err(err) if err.is::<input::Reported>() => std::process::exit(1),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timing_flag_parses_before_subcommand() {
        let cli = Cli::parse_from(["dg", "--timing", "config"]);
        assert!(cli.timing);
        assert!(matches!(cli.command, Commands::Config(_)));
    }

    #[test]
    fn timing_flag_parses_after_subcommand() {
        let cli = Cli::parse_from(["dg", "config", "--timing", "--defaults"]);
        assert!(cli.timing);
        assert!(matches!(
            cli.command,
            Commands::Config(cmd::config::ConfigArgs { defaults: true })
        ));
    }

    #[test]
    fn json_flag_sets_output_mode() {
        let cli = Cli::parse_from(["dg", "--json", "config"]);
        assert!(cli.json);
        assert!(cli.output_mode().is_json());
    }

    #[test]
    fn format_flag_after_subcommand() {
        let cli = Cli::parse_from(["dg", "config", "--format", "text"]);
        assert_eq!(cli.format, Some(OutputMode::Text));
        assert_eq!(cli.output_mode(), OutputMode::Text);
    }

    #[test]
    fn layout_defaults_to_day_view() {
        let cli = Cli::parse_from(["dg", "layout", "events.json", "--date", "2024-03-05"]);
        let Commands::Layout(args) = cli.command else {
            panic!("expected layout");
        };
        assert_eq!(args.view, cmd::layout::View::Day);
        assert!(args.policy.is_none());
        assert_eq!(args.file, PathBuf::from("events.json"));
    }

    #[test]
    fn layout_accepts_view_policy_and_config() {
        let cli = Cli::parse_from([
            "dg",
            "layout",
            "-",
            "--date",
            "2024-03-05",
            "--view",
            "week",
            "--policy",
            "anchor",
            "--config",
            "alt.toml",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("alt.toml")));
        let Commands::Layout(args) = cli.command else {
            panic!("expected layout");
        };
        assert_eq!(args.view, cmd::layout::View::Week);
        assert_eq!(args.policy, Some(cmd::layout::PolicyArg::Anchor));
    }

    #[test]
    fn layout_requires_date() {
        assert!(Cli::try_parse_from(["dg", "layout", "events.json"]).is_err());
    }

    #[test]
    fn completions_subcommand_parses() {
        let cli = Cli::parse_from(["dg", "completions", "bash"]);
        assert!(matches!(
            cli.command,
            Commands::Completions(cmd::completions::CompletionsArgs {
                shell: clap_complete::Shell::Bash,
            })
        ));
    }

    #[test]
    fn all_subcommands_listed() {
        let subcommands = [
            vec!["dg", "layout", "x.json", "--date", "2024-01-01"],
            vec!["dg", "stats", "x.json", "--date", "2024-01-01"],
            vec!["dg", "config"],
            vec!["dg", "completions", "zsh"],
        ];
        for args in &subcommands {
            let result = Cli::try_parse_from(args.iter());
            assert!(result.is_ok(), "Failed to parse: {args:?}: {:?}", result.err());
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
