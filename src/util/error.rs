//! Unified error types for EventScope.
//!
//! All fallible operations throughout the codebase return `Result<T, EventScopeError>`.
//! Every pipeline variant is fatal for the collection cycle that raised it:
//! a cycle either yields its complete record list or exactly one of these.

use std::time::Duration;

/// Win32 exit code `wevtutil` returns for `ERROR_ACCESS_DENIED`.
const WIN32_ACCESS_DENIED: i32 = 5;

/// Unified error type used throughout EventScope.
///
/// Each variant captures enough context to produce an actionable message for
/// the user or for log output.
#[derive(Debug, thiserror::Error)]
pub enum EventScopeError {
    /// The query tool could not be launched (missing binary, spawn failure).
    #[error("Failed to launch '{program}': {source}")]
    Execution {
        /// Program that was being started.
        program: String,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// The query tool ran but exited with a non-zero status. `output` is the
    /// combined stdout/stderr text, which usually holds the real diagnostic.
    #[error("Query tool exited with code {exit_code}: {}", first_line(.output))]
    ExternalTool {
        /// Process exit code (`-1` if terminated by a signal).
        exit_code: i32,
        /// Captured combined output.
        output: String,
    },

    /// The query tool did not finish within the configured bound and was killed.
    #[error("Query tool did not finish within {}s and was terminated", .0.as_secs())]
    Timeout(Duration),

    /// Tool output was not well-formed XML even after wrapping it in a root.
    #[error("XML parse error: {0}")]
    XmlParse(String),

    /// XML was well-formed but an element or attribute every event must
    /// carry was absent.
    #[error("Event schema error: {0}")]
    Schema(String),

    /// A collection cycle is already in flight on this collector.
    #[error("A collection cycle is already running")]
    Busy,

    /// A `QueryRequest` could not be constructed from the given inputs.
    #[error("Invalid query request: {0}")]
    InvalidRequest(String),

    /// The configuration file could not be read or parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rendering records as CSV or JSON failed.
    #[error("Export failed: {0}")]
    Export(String),

    /// Catch-all for I/O errors (file writes, stdout, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, EventScopeError>;

impl EventScopeError {
    /// Whether this failure looks like a missing-privilege condition.
    ///
    /// `wevtutil` reports denied channels (notably `Security`) with exit
    /// code 5 and an "Access is denied" message on its output stream.
    pub fn is_access_denied(&self) -> bool {
        match self {
            Self::ExternalTool { exit_code, output } => {
                *exit_code == WIN32_ACCESS_DENIED
                    || output.to_ascii_lowercase().contains("access is denied")
            }
            Self::Execution { source, .. } => {
                source.kind() == std::io::ErrorKind::PermissionDenied
            }
            _ => false,
        }
    }

    /// A short actionable hint for the user, if one applies to this error.
    pub fn user_hint(&self) -> Option<&'static str> {
        if self.is_access_denied() {
            return Some("Run EventScope from an elevated (Administrator) prompt to read this channel.");
        }
        match self {
            Self::Execution { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
                Some("wevtutil was not found. EventScope must run on Windows, or set `tool_path` in the config file.")
            }
            Self::Timeout(_) => Some("Lower --count or raise `timeout_secs` in the config file."),
            Self::Busy => Some("Wait for the running collection to finish before starting another."),
            _ => None,
        }
    }

    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                                  |
    /// |------|------------------------------------------|
    /// | 1    | Export / I/O failure                     |
    /// | 2    | Configuration or invalid request         |
    /// | 3    | Query tool could not run or exited != 0  |
    /// | 4    | Tool output failed to parse or decode    |
    /// | 5    | Timeout or busy collector                |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Export(_) | Self::Io(_) => 1,
            Self::Config(_) | Self::InvalidRequest(_) => 2,
            Self::Execution { .. } | Self::ExternalTool { .. } => 3,
            Self::XmlParse(_) | Self::Schema(_) => 4,
            Self::Timeout(_) | Self::Busy => 5,
        }
    }

    /// Raw diagnostic output captured from the query tool, if any.
    pub fn tool_output(&self) -> Option<&str> {
        match self {
            Self::ExternalTool { output, .. } if !output.trim().is_empty() => Some(output),
            _ => None,
        }
    }
}

/// First non-empty line of the captured tool output, for one-line display.
fn first_line(output: &str) -> &str {
    output
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("(no output)")
}

/// Build an [`EventScopeError::Schema`] for a required field that was absent.
pub fn missing_field(field: &str, event_index: usize) -> EventScopeError {
    EventScopeError::Schema(format!("event #{event_index} is missing {field}"))
}
