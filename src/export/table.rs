//! Plain-text table rendering for terminal output.
//!
//! Columns: Event ID, Time, Provider, Level, Description. Column widths
//! follow the widest cell, except Provider and Description which are capped
//! and cut with an ellipsis.

use std::io::Write;

use crate::core::event_record::EventRecord;
use crate::util::error::Result;

const HEADERS: [&str; 5] = ["Event ID", "Time", "Provider", "Level", "Description"];
const MAX_PROVIDER_WIDTH: usize = 36;
const MAX_DESCRIPTION_WIDTH: usize = 80;

/// Write `events` as an aligned text table. With `details`, each row is
/// followed by its indented full detail text.
pub fn write_table<W: Write>(events: &[EventRecord], details: bool, mut out: W) -> Result<()> {
    if events.is_empty() {
        writeln!(out, "(no events)")?;
        return Ok(());
    }

    let rows: Vec<[String; 5]> = events
        .iter()
        .map(|e| {
            [
                e.event_id().to_owned(),
                e.time_created().to_owned(),
                clip(e.provider_name(), MAX_PROVIDER_WIDTH),
                e.level_name().to_owned(),
                clip(e.description(), MAX_DESCRIPTION_WIDTH),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    write_row(&mut out, &HEADERS.map(String::from), &widths)?;
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    writeln!(out, "{}", rule.join("  "))?;

    for (row, event) in rows.iter().zip(events) {
        write_row(&mut out, row, &widths)?;
        if details {
            for line in event.full_details().lines() {
                writeln!(out, "    {line}")?;
            }
            writeln!(out)?;
        }
    }
    Ok(())
}

fn write_row<W: Write>(out: &mut W, cells: &[String; 5], widths: &[usize; 5]) -> Result<()> {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, &w)| format!("{cell:<w$}"))
        .collect();
    writeln!(out, "{}", padded.join("  ").trim_end())?;
    Ok(())
}

/// Cut `text` to at most `max` characters, marking the cut with `…`.
fn clip(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_owned();
    }
    let mut clipped: String = text.chars().take(max.saturating_sub(1)).collect();
    clipped.push('…');
    clipped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(events: &[EventRecord], details: bool) -> String {
        let mut out = Vec::new();
        write_table(events, details, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_empty_table() {
        assert_eq!(render(&[], false), "(no events)\n");
    }

    #[test]
    fn test_rows_and_level_names() {
        let events = [
            EventRecord::new("1000", "2024-03-01T12:00:00Z", "Application Error", "2", "a\nb"),
            EventRecord::new("7036", "2024-03-01T11:00:00Z", "Service Control Manager", "4", "c"),
        ];
        let text = render(&events, false);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Event ID"));
        assert!(lines[2].contains("Error") && lines[2].ends_with("a [...]"));
        assert!(lines[3].contains("Information") && lines[3].ends_with("c [...]"));
    }

    #[test]
    fn test_details_are_indented() {
        let events = [EventRecord::new("1", "t", "P", "4", "[Process Create]\nImage: x")];
        let text = render(&events, true);
        assert!(text.contains("\n    [Process Create]\n    Image: x\n"), "{text}");
    }

    #[test]
    fn test_clip() {
        assert_eq!(clip("short", 10), "short");
        assert_eq!(clip("abcdefghij", 5), "abcd…");
    }
}
