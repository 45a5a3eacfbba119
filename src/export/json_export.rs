//! JSON export for a cycle's event records.
//!
//! Serialises the event list as a pretty-printed JSON array using Serde.

use std::io::Write;

use crate::core::event_record::EventRecord;
use crate::util::error::EventScopeError;

/// Write `events` as a pretty-printed JSON array to any writer.
///
/// # Errors
/// Returns [`EventScopeError::Export`] if serialisation or the final flush fails.
pub fn write_json<W: Write>(events: &[EventRecord], writer: W) -> Result<(), EventScopeError> {
    let mut writer = std::io::BufWriter::new(writer);
    serde_json::to_writer_pretty(&mut writer, events)
        .map_err(|e| EventScopeError::Export(format!("Failed to write JSON: {e}")))?;
    writer
        .write_all(b"\n")
        .and_then(|()| writer.flush())
        .map_err(|e| EventScopeError::Export(format!("Failed to flush JSON output: {e}")))?;

    tracing::debug!("Wrote {} events as JSON", events.len());
    Ok(())
}
