use std::fmt;

use thiserror::Error;

/// Machine-readable error codes for agent-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InputReadFailed,
    InputParseError,
    ConfigParseError,
    InvalidTimestamp,
    EmptyInterval,
    MissingIssueKey,
    EmptyEventId,
    DuplicateEventId,
    InvalidDate,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InputReadFailed => "E1001",
            Self::InputParseError => "E1002",
            Self::ConfigParseError => "E1003",
            Self::InvalidTimestamp => "E2001",
            Self::EmptyInterval => "E2002",
            Self::MissingIssueKey => "E2003",
            Self::EmptyEventId => "E2004",
            Self::DuplicateEventId => "E2005",
            Self::InvalidDate => "E2006",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::InputReadFailed => "Event input could not be read",
            Self::InputParseError => "Event input is not a JSON array of events",
            Self::ConfigParseError => "Config file parse error",
            Self::InvalidTimestamp => "Unparsable event timestamp",
            Self::EmptyInterval => "Timed event ends at or before its start",
            Self::MissingIssueKey => "Synced event has no issue key",
            Self::EmptyEventId => "Event has an empty id",
            Self::DuplicateEventId => "Event id appears more than once",
            Self::InvalidDate => "Invalid calendar date",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::InputReadFailed => Some("Check the path, or pass `-` to read events from stdin."),
            Self::InputParseError => {
                Some("Provide a JSON array of {id, start, end, allDay, title} objects.")
            }
            Self::ConfigParseError => Some("Fix syntax in .daygrid/config.toml and retry."),
            Self::InvalidTimestamp => {
                Some("Use RFC 3339 or YYYY-MM-DDTHH:MM[:SS] wall-clock timestamps.")
            }
            Self::EmptyInterval => Some("Give the event an end after its start, or mark it allDay."),
            Self::MissingIssueKey => Some("Set issueKey on events with source \"jira\"."),
            Self::EmptyEventId => Some("Give every event a non-empty id."),
            Self::DuplicateEventId => None,
            Self::InvalidDate => Some("Use a YYYY-MM-DD date."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Why a single event record could not take part in layout.
///
/// These never abort a layout pass: the record is skipped and reported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    #[error("event '{id}': invalid {field} timestamp '{value}'")]
    InvalidTimestamp {
        id: String,
        field: &'static str,
        value: String,
    },

    #[error("event '{id}': end {end} is not after start {start}")]
    EmptyInterval {
        id: String,
        start: String,
        end: String,
    },

    #[error("event '{id}': source is jira but issueKey is missing")]
    MissingIssueKey { id: String },

    #[error("event id must not be empty")]
    EmptyId,

    #[error("event '{id}' appears more than once")]
    DuplicateId { id: String },
}

impl EventError {
    /// The stable [`ErrorCode`] for this failure.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidTimestamp { .. } => ErrorCode::InvalidTimestamp,
            Self::EmptyInterval { .. } => ErrorCode::EmptyInterval,
            Self::MissingIssueKey { .. } => ErrorCode::MissingIssueKey,
            Self::EmptyId => ErrorCode::EmptyEventId,
            Self::DuplicateId { .. } => ErrorCode::DuplicateEventId,
        }
    }

    /// Id of the offending record, when it had one.
    #[must_use]
    pub fn event_id(&self) -> Option<&str> {
        match self {
            Self::InvalidTimestamp { id, .. }
            | Self::EmptyInterval { id, .. }
            | Self::MissingIssueKey { id }
            | Self::DuplicateId { id } => Some(id),
            Self::EmptyId => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorCode, EventError};
    use std::collections::HashSet;

    #[test]
    fn all_codes_are_unique() {
        let all = [
            ErrorCode::InputReadFailed,
            ErrorCode::InputParseError,
            ErrorCode::ConfigParseError,
            ErrorCode::InvalidTimestamp,
            ErrorCode::EmptyInterval,
            ErrorCode::MissingIssueKey,
            ErrorCode::EmptyEventId,
            ErrorCode::DuplicateEventId,
            ErrorCode::InvalidDate,
            ErrorCode::InternalUnexpected,
        ];

        let mut seen = HashSet::new();
        for code in all {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        let code = ErrorCode::EmptyInterval.code();
        assert_eq!(code.len(), 5);
        assert!(code.starts_with('E'));
        assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn event_errors_map_to_codes() {
        let err = EventError::InvalidTimestamp {
            id: "ev-1".to_string(),
            field: "start",
            value: "nope".to_string(),
        };
        assert_eq!(err.code(), ErrorCode::InvalidTimestamp);
        assert_eq!(err.event_id(), Some("ev-1"));
        assert_eq!(
            err.to_string(),
            "event 'ev-1': invalid start timestamp 'nope'"
        );

        assert_eq!(EventError::EmptyId.code(), ErrorCode::EmptyEventId);
        assert_eq!(EventError::EmptyId.event_id(), None);
    }
}
