//! Reading event files and validating command arguments.

use std::fmt;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use daygrid_core::ErrorCode;
use daygrid_core::config::resolve_config;
use daygrid_core::model::{EventRecord, parse_date};
use daygrid_layout::LayoutOptions;
use tracing::debug;

use crate::output::{CliError, OutputMode, render_error};

/// Read a JSON array of event records from `source`, or stdin for `-`.
pub fn read_records(source: &Path) -> Result<Vec<EventRecord>, CliError> {
    let raw = if source == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| CliError::coded(ErrorCode::InputReadFailed, format!("stdin: {e}")))?;
        buf
    } else {
        std::fs::read_to_string(source).map_err(|e| {
            CliError::coded(
                ErrorCode::InputReadFailed,
                format!("{}: {e}", source.display()),
            )
        })?
    };

    parse_records_json(&raw)
}

/// Parse the body of an event file.
pub fn parse_records_json(raw: &str) -> Result<Vec<EventRecord>, CliError> {
    let records: Vec<EventRecord> = serde_json::from_str(raw)
        .map_err(|e| CliError::coded(ErrorCode::InputParseError, format!("invalid event file: {e}")))?;
    debug!(records = records.len(), "read event records");
    Ok(records)
}

/// Parse a `--date` argument.
pub fn parse_date_arg(raw: &str) -> Result<NaiveDate, CliError> {
    parse_date(raw)
        .ok_or_else(|| CliError::coded(ErrorCode::InvalidDate, format!("invalid date '{raw}'")))
}

/// Resolve layout options from project config or an explicit `--config` file.
pub fn load_options(
    project_root: &Path,
    config_path: Option<&Path>,
) -> Result<LayoutOptions, CliError> {
    let effective = resolve_config(project_root, config_path, false)
        .map_err(|e| CliError::coded(ErrorCode::ConfigParseError, format!("{e:#}")))?;
    Ok(LayoutOptions::from(&effective.project))
}

/// Error returned after a [`CliError`] has already been written to stderr.
#[derive(Debug)]
pub struct Reported {
    pub message: String,
}

impl fmt::Display for Reported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Reported {}

/// Render `err` in the chosen mode and turn it into a failing result.
pub fn fail<T>(output: OutputMode, err: &CliError) -> anyhow::Result<T> {
    render_error(output, err)?;
    Err(Reported {
        message: err.message.clone(),
    }
    .into())
}
