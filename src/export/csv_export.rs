//! CSV export for a cycle's event records.
//!
//! Writes one row per record with standard columns. Multi-line detail text
//! is quoted by the `csv` writer, so each record stays one logical row.

use std::io::Write;

use crate::core::event_record::EventRecord;
use crate::util::error::EventScopeError;

/// Column headers, in output order.
pub const CSV_HEADER: [&str; 6] = [
    "EventID",
    "TimeCreated",
    "Provider",
    "Level",
    "Description",
    "FullDetails",
];

/// Write `events` as CSV to any writer (stdout or a file).
///
/// # Errors
/// Returns [`EventScopeError::Export`] if a row cannot be written or flushed.
pub fn write_csv<W: Write>(events: &[EventRecord], writer: W) -> Result<(), EventScopeError> {
    let mut writer = csv::Writer::from_writer(writer);

    writer
        .write_record(CSV_HEADER)
        .map_err(|e| EventScopeError::Export(format!("Failed to write CSV header: {e}")))?;

    for event in events {
        writer
            .write_record([
                event.event_id(),
                event.time_created(),
                event.provider_name(),
                event.level(),
                event.description(),
                event.full_details(),
            ])
            .map_err(|e| EventScopeError::Export(format!("Failed to write CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| EventScopeError::Export(format!("Failed to flush CSV: {e}")))?;

    tracing::debug!("Wrote {} events as CSV", events.len());
    Ok(())
}
