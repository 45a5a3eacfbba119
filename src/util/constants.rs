//! Application-wide constants for EventScope.
//!
//! Centralising magic numbers and configuration defaults here keeps the rest
//! of the codebase clean and makes tuning straightforward.

/// Application display name used in log lines and messages.
pub const APP_NAME: &str = "EventScope";

/// Application version string.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// External query tool. Resolved through `PATH` unless the config overrides it.
pub const QUERY_TOOL: &str = "wevtutil";

/// `wevtutil` subcommand for "query events".
pub const QUERY_SUBCOMMAND: &str = "qe";

/// Channels offered by default. Any other channel name is accepted as-is.
pub const DEFAULT_CHANNELS: &[&str] = &[
    "Application",
    "Security",
    "System",
    "Microsoft-Windows-Sysmon/Operational",
];

/// Channel queried when neither the command line nor the config names one.
pub const DEFAULT_CHANNEL: &str = "Application";

/// Number of most recent events fetched per cycle by default.
pub const DEFAULT_EVENT_COUNT: u32 = 50;

/// Interval between cycles in `watch` mode (seconds).
pub const AUTO_REFRESH_INTERVAL_SECS: u64 = 10;

/// How long the query tool may run before it is killed (seconds).
pub const PROCESS_TIMEOUT_SECS: u64 = 60;

/// Poll interval while waiting for the query tool to exit (milliseconds).
pub const PROCESS_POLL_INTERVAL_MS: u64 = 25;

/// Provider name that selects the Sysmon payload decoder.
pub const SYSMON_PROVIDER: &str = "Microsoft-Windows-Sysmon";

/// Synthetic root element wrapped around the tool's rootless output.
pub const SYNTHETIC_ROOT: &str = "Events";

/// Detail text for events that carry no `<EventData>` element.
pub const NO_EVENT_DATA: &str = "No EventData";

/// Marker appended to every one-line description.
pub const TRUNCATION_MARKER: &str = " [...]";

/// Application data subdirectory name for logs and configuration.
pub const APP_DATA_DIR: &str = "EventScope";

/// Log subdirectory name under the app data directory.
pub const LOG_DIR: &str = "logs";

/// Log file name for persistent debug logging.
pub const LOG_FILE_NAME: &str = "eventscope.log";

/// Config file name under the app data directory.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Maximum log file size in bytes before rotation (5 MB).
pub const MAX_LOG_FILE_SIZE: u64 = 5 * 1024 * 1024;
