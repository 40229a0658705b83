use std::collections::HashSet;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::EventError;
use crate::model::timestamp::parse_timestamp;
use crate::timing::{self, Stage};

/// Where an event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSource {
    #[default]
    Manual,
    Jira,
}

impl EventSource {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Jira => "jira",
        }
    }
}

impl fmt::Display for EventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event record as delivered by the data-fetch layer.
///
/// Timestamps are still raw strings here; [`EventRecord::parse`] turns the
/// record into a typed [`CalendarEvent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub id: String,
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub all_day: bool,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub source: EventSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl EventRecord {
    /// Convenience constructor for a manual timed event.
    pub fn timed(
        id: impl Into<String>,
        start: impl Into<String>,
        end: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            start: start.into(),
            end: end.into(),
            all_day: false,
            title: title.into(),
            color: None,
            description: None,
            source: EventSource::Manual,
            issue_key: None,
            status: None,
        }
    }

    /// Validate the record and convert it into a [`CalendarEvent`].
    ///
    /// # Errors
    ///
    /// Returns an [`EventError`] when the id is empty, a timestamp does not
    /// parse, a timed event does not end after it starts, or a synced event
    /// has no issue key. All-day events may carry `end <= start`.
    pub fn parse(&self) -> Result<CalendarEvent, EventError> {
        if self.id.trim().is_empty() {
            return Err(EventError::EmptyId);
        }

        let start = parse_timestamp(&self.start).ok_or_else(|| EventError::InvalidTimestamp {
            id: self.id.clone(),
            field: "start",
            value: self.start.clone(),
        })?;
        let end = parse_timestamp(&self.end).ok_or_else(|| EventError::InvalidTimestamp {
            id: self.id.clone(),
            field: "end",
            value: self.end.clone(),
        })?;

        if !self.all_day && end <= start {
            return Err(EventError::EmptyInterval {
                id: self.id.clone(),
                start: self.start.clone(),
                end: self.end.clone(),
            });
        }

        let core = EventCore {
            id: self.id.clone(),
            start,
            end,
            all_day: self.all_day,
            title: self.title.clone(),
            description: self.description.clone(),
            color: self.color.clone(),
        };

        match self.source {
            EventSource::Manual => Ok(CalendarEvent::Manual(core)),
            EventSource::Jira => {
                let issue_key = self
                    .issue_key
                    .as_deref()
                    .map(str::trim)
                    .filter(|key| !key.is_empty())
                    .ok_or_else(|| EventError::MissingIssueKey {
                        id: self.id.clone(),
                    })?;
                Ok(CalendarEvent::Jira(SyncedJiraEvent {
                    core,
                    issue_key: issue_key.to_string(),
                    status: self.status.clone(),
                }))
            }
        }
    }
}

/// The fields every calendar event carries, with parsed timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventCore {
    pub id: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub all_day: bool,
    pub title: String,
    pub description: Option<String>,
    pub color: Option<String>,
}

impl EventCore {
    /// Open-interval overlap: touching endpoints do not overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// Duration in whole minutes.
    #[must_use]
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Whether the event belongs on `date`.
    ///
    /// Timed events belong to the day they start on. All-day events cover
    /// every date from their start through their end, where an end at
    /// midnight is exclusive.
    #[must_use]
    pub fn occurs_on(&self, date: NaiveDate) -> bool {
        let first = self.start.date();
        if !self.all_day {
            return first == date;
        }

        let mut last = self.end.date();
        if self.end.time() == NaiveTime::MIN && last > first {
            last = last.pred_opt().unwrap_or(last);
        }
        date >= first && date <= last.max(first)
    }
}

/// An event synced from an external issue tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncedJiraEvent {
    pub core: EventCore,
    pub issue_key: String,
    pub status: Option<String>,
}

/// A calendar event, tagged by origin.
///
/// The layout engine only ever looks at [`CalendarEvent::core`]; the variant
/// payload is for renderers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarEvent {
    Manual(EventCore),
    Jira(SyncedJiraEvent),
}

impl CalendarEvent {
    #[must_use]
    pub const fn core(&self) -> &EventCore {
        match self {
            Self::Manual(core) => core,
            Self::Jira(synced) => &synced.core,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.core().id
    }

    #[must_use]
    pub const fn is_all_day(&self) -> bool {
        self.core().all_day
    }

    #[must_use]
    pub const fn source(&self) -> EventSource {
        match self {
            Self::Manual(_) => EventSource::Manual,
            Self::Jira(_) => EventSource::Jira,
        }
    }

    /// Issue key for synced events.
    #[must_use]
    pub fn issue_key(&self) -> Option<&str> {
        match self {
            Self::Manual(_) => None,
            Self::Jira(synced) => Some(&synced.issue_key),
        }
    }
}

/// Outcome of parsing a batch of records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedEvents {
    /// Records that parsed, in input order.
    pub events: Vec<CalendarEvent>,
    /// Records that were skipped, in input order.
    pub rejected: Vec<EventError>,
}

/// Parse every record, skipping (and logging) the ones that fail.
///
/// The first record with a given id wins; later duplicates are rejected.
#[must_use]
pub fn parse_records(records: &[EventRecord]) -> ParsedEvents {
    timing::timed_events(Stage::Parse, records.len(), || parse_all(records))
}

fn parse_all(records: &[EventRecord]) -> ParsedEvents {
    let mut parsed = ParsedEvents::default();
    let mut seen: HashSet<&str> = HashSet::with_capacity(records.len());

    for record in records {
        let result = record.parse().and_then(|event| {
            if seen.insert(record.id.as_str()) {
                Ok(event)
            } else {
                Err(EventError::DuplicateId {
                    id: record.id.clone(),
                })
            }
        });

        match result {
            Ok(event) => parsed.events.push(event),
            Err(err) => {
                warn!(code = %err.code(), "skipping event: {err}");
                parsed.rejected.push(err);
            }
        }
    }

    parsed
}

/// BLAKE3 fingerprint of an event set, independent of input order.
///
/// Only the fields that affect layout are hashed, so a title edit does not
/// change the fingerprint.
#[must_use]
pub fn fingerprint<'a>(events: impl IntoIterator<Item = &'a EventCore>) -> String {
    let mut keys: Vec<&EventCore> = events.into_iter().collect();
    keys.sort_by(|a, b| a.id.cmp(&b.id));

    let mut hasher = blake3::Hasher::new();
    for core in keys {
        hasher.update(core.id.as_bytes());
        hasher.update(b"\x00");
        hasher.update(&core.start.and_utc().timestamp().to_le_bytes());
        hasher.update(&core.end.and_utc().timestamp().to_le_bytes());
        hasher.update(&[u8::from(core.all_day)]);
    }
    format!("blake3:{}", hasher.finalize().to_hex())
}
