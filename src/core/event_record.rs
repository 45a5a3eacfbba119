//! Canonical, display-ready record for a single event, and the normalizer
//! that builds it from decoded events.
//!
//! Every field except `description` is taken from the event XML unchanged.
//! `description` is derived: the first line of the decoded details followed
//! by a truncation marker.

use crate::util::constants::TRUNCATION_MARKER;

/// An event after XML extraction and provider decoding, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedEvent {
    pub event_id: String,
    pub time_created: String,
    pub provider_name: String,
    pub level: String,
    pub full_details: String,
}

/// Represents a single normalized event log entry.
///
/// Immutable after construction; fields are read through accessors.
/// The struct is `Clone` and `serde::Serialize` (for JSON/CSV output).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct EventRecord {
    /// Event ID as the provider wrote it, e.g. `"4624"`.
    event_id: String,

    /// `TimeCreated/@SystemTime`, e.g. `"2024-01-15T10:23:45.1234567Z"`.
    time_created: String,

    /// The event provider / source name.
    provider_name: String,

    /// Numeric severity code as supplied:
    /// - 0 = LogAlways
    /// - 1 = Critical
    /// - 2 = Error
    /// - 3 = Warning
    /// - 4 = Informational
    /// - 5 = Verbose
    level: String,

    /// First line of `full_details` plus `" [...]"`.
    description: String,

    /// Provider-decoded payload, one field per line.
    full_details: String,
}

impl EventRecord {
    /// Build a record, deriving its description from `full_details`.
    pub fn new(
        event_id: impl Into<String>,
        time_created: impl Into<String>,
        provider_name: impl Into<String>,
        level: impl Into<String>,
        full_details: impl Into<String>,
    ) -> Self {
        let full_details = full_details.into();
        Self {
            event_id: event_id.into(),
            time_created: time_created.into(),
            provider_name: provider_name.into(),
            level: level.into(),
            description: summarize(&full_details),
            full_details,
        }
    }

    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn time_created(&self) -> &str {
        &self.time_created
    }

    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    pub fn level(&self) -> &str {
        &self.level
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn full_details(&self) -> &str {
        &self.full_details
    }

    /// Human-readable name for the record's level code.
    pub fn level_name(&self) -> &'static str {
        Self::level_to_name(&self.level)
    }

    /// Maps the standard ETW level values to display strings.
    pub fn level_to_name(level: &str) -> &'static str {
        match level.trim() {
            "0" => "LogAlways",
            "1" => "Critical",
            "2" => "Error",
            "3" => "Warning",
            "4" => "Information",
            "5" => "Verbose",
            _ => "Unknown",
        }
    }
}

impl From<DecodedEvent> for EventRecord {
    fn from(event: DecodedEvent) -> Self {
        Self::new(
            event.event_id,
            event.time_created,
            event.provider_name,
            event.level,
            event.full_details,
        )
    }
}

/// One-line summary of detail text: its first line plus the truncation marker.
///
/// The marker is appended even when the details are a single line.
pub fn summarize(full_details: &str) -> String {
    let first = full_details.lines().next().unwrap_or("");
    format!("{first}{TRUNCATION_MARKER}")
}

/// Turn decoded events into records, preserving their order.
pub fn normalize(events: Vec<DecodedEvent>) -> Vec<EventRecord> {
    events.into_iter().map(EventRecord::from).collect()
}
