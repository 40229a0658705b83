//! `dg completions`: shell completion scripts.

use std::io::Write;

use anyhow::Result;
use clap::Args;
use clap_complete::{Shell, generate};

/// Arguments for `dg completions`.
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell for completion script generation.
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Write the completion script for `shell` to `out`, named after the
/// command's binary.
pub fn write_completions(shell: Shell, command: &mut clap::Command, out: &mut dyn Write) {
    let bin = command
        .get_bin_name()
        .unwrap_or_else(|| command.get_name())
        .to_string();
    generate(shell, command, bin, out);
}

/// Generate shell completion script to stdout.
///
/// # Errors
///
/// Returns an error if flushing stdout fails.
pub fn run_completions(shell: Shell, command: &mut clap::Command) -> Result<()> {
    let mut out = std::io::stdout();
    write_completions(shell, command, &mut out);
    out.flush()?;
    Ok(())
}
