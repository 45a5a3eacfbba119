//! Output renderers for a cycle's records: text table, CSV and JSON.

pub mod csv_export;
pub mod json_export;
pub mod table;

use std::io::Write;

use crate::core::event_record::EventRecord;
use crate::util::error::Result;

/// Output format selected by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Aligned text table.
    #[default]
    Table,
    /// Pretty-printed JSON array.
    Json,
    /// CSV with a header row.
    Csv,
}

/// Render `events` in the chosen format.
pub fn render<W: Write>(
    events: &[EventRecord],
    format: OutputFormat,
    details: bool,
    out: W,
) -> Result<()> {
    match format {
        OutputFormat::Table => table::write_table(events, details, out),
        OutputFormat::Json => json_export::write_json(events, out),
        OutputFormat::Csv => csv_export::write_csv(events, out),
    }
}
