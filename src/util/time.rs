//! Timestamp and duration formatting helpers for EventScope.

use std::time::Duration;

use chrono::{DateTime, Local, Utc};

/// Format the moment a cycle completed, in local time.
///
/// Shows `YYYY-MM-DD HH:MM:SS`. Event timestamps themselves are never
/// reformatted; this is only for the cycle header in `watch` output.
pub fn format_collected_at(ts: &DateTime<Utc>) -> String {
    let local: DateTime<Local> = ts.with_timezone(&Local);
    local.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Render a cycle's elapsed time for the `watch` header and log lines.
///
/// Whole milliseconds below one second (a local `wevtutil` query usually
/// lands there), then seconds, then minutes: `42ms`, `1.2s`, `1.5m`.
pub fn format_duration(d: Duration) -> String {
    if d < Duration::from_secs(1) {
        return format!("{}ms", d.as_millis());
    }
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{secs:.1}s")
    } else {
        format!("{:.1}m", secs / 60.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_second_is_whole_millis() {
        assert_eq!(format_duration(Duration::ZERO), "0ms");
        assert_eq!(format_duration(Duration::from_micros(1_500)), "1ms");
        assert_eq!(format_duration(Duration::from_millis(999)), "999ms");
    }

    #[test]
    fn test_one_second_switches_unit() {
        assert_eq!(format_duration(Duration::from_secs(1)), "1.0s");
    }
}
