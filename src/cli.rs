//! Command-line interface definition (clap derive).
//!
//! Purely declarative; `main.rs` turns these into collection cycles.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use eventscope::export::OutputFormat;

/// EventScope -- collect recent Windows Event Log records and decode them
/// per provider.
#[derive(Parser, Debug)]
#[command(name = "eventscope", version, about, long_about = None)]
pub struct Cli {
    /// Path to a JSON config file (default: %LOCALAPPDATA%\EventScope\config.json).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch the most recent events from a channel once.
    Query(QueryArgs),

    /// Fetch repeatedly, printing a fresh snapshot each interval.
    Watch(WatchArgs),

    /// List the channels offered by default.
    Channels,
}

/// Options shared by `query` and `watch`.
#[derive(Args, Debug, Clone)]
pub struct RequestArgs {
    /// Channel to query, e.g. Application or Microsoft-Windows-Sysmon/Operational.
    #[arg(long, short = 'l')]
    pub channel: Option<String>,

    /// Number of most recent events to fetch.
    #[arg(long, short = 'n')]
    pub count: Option<u32>,

    /// XPath filter passed to wevtutil, e.g. "*[System[(Level=2)]]".
    #[arg(long, short = 'q')]
    pub xpath: Option<String>,

    /// Output format.
    #[arg(long, short = 'f', value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Print each event's full details under its row (table format only).
    #[arg(long, short = 'd')]
    pub details: bool,
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// Write the output to this file instead of stdout.
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// Seconds between cycles (default from config, 10).
    #[arg(long, short = 'i')]
    pub interval: Option<u64>,

    /// Stop after this many cycles (default: run until interrupted).
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub cycles: Option<u32>,
}
