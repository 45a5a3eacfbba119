//! EventScope -- collect recent Windows Event Log records from the command line.
//!
//! Entry point: initialises structured logging, loads the config, and runs
//! the requested subcommand through a single-flight [`Collector`].

mod cli;

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::Layer as _;

use cli::{Cli, Commands, QueryArgs, RequestArgs, WatchArgs};
use eventscope::core::collector::{Collector, CycleReport};
use eventscope::core::query::QueryRequest;
use eventscope::export;
use eventscope::util::config::{self, CollectorConfig};
use eventscope::util::constants;
use eventscope::util::error::{EventScopeError, Result};
use eventscope::util::time::{format_collected_at, format_duration};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up dual-layer logging: stderr (env-controlled) + file (always debug).
    // The file log lives at %LOCALAPPDATA%\EventScope\logs\eventscope.log.
    let log_dir = init_log_dir();
    init_logging(&log_dir, cli.log_level.as_deref());

    tracing::info!("{} v{} starting", constants::APP_NAME, constants::APP_VERSION);
    if let Some(dir) = &log_dir {
        tracing::debug!("Log file: {}", dir.join(constants::LOG_FILE_NAME).display());
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e);
            ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(1))
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => CollectorConfig::load_from(path)?,
        None => CollectorConfig::load_default()?,
    };

    match cli.command {
        Commands::Query(args) => run_query(&config, args),
        Commands::Watch(args) => run_watch(&config, args),
        Commands::Channels => {
            let mut stdout = std::io::stdout().lock();
            for channel in constants::DEFAULT_CHANNELS {
                writeln!(stdout, "{channel}")?;
            }
            Ok(())
        }
    }
}

/// Build a request from command-line values, falling back to the config.
fn build_request(config: &CollectorConfig, args: &RequestArgs) -> Result<QueryRequest> {
    let channel = args
        .channel
        .clone()
        .unwrap_or_else(|| config.default_channel.clone());
    let count = args.count.unwrap_or(config.default_count);
    QueryRequest::new(channel, count, args.xpath.clone())
}

fn run_query(config: &CollectorConfig, args: QueryArgs) -> Result<()> {
    let request = build_request(config, &args.request)?;
    let collector = Collector::from_config(config);
    let report = collector.collect(request)?;

    match &args.output {
        Some(path) => {
            let file = std::fs::File::create(path)?;
            let mut writer = std::io::BufWriter::new(file);
            export::render(
                &report.records,
                args.request.format,
                args.request.details,
                &mut writer,
            )?;
            writer.flush()?;
            tracing::info!(
                "Wrote {} events to {}",
                report.records.len(),
                path.display()
            );
        }
        None => export::render(
            &report.records,
            args.request.format,
            args.request.details,
            std::io::stdout().lock(),
        )?,
    }
    Ok(())
}

/// Run cycles back to back with a pause between them. A failed cycle is
/// reported and the next one still runs; only the previous snapshot is
/// replaced, never merged.
fn run_watch(config: &CollectorConfig, args: WatchArgs) -> Result<()> {
    let request = build_request(config, &args.request)?;
    let interval = args
        .interval
        .map(std::time::Duration::from_secs)
        .unwrap_or_else(|| config.refresh_interval());
    if interval.is_zero() {
        return Err(EventScopeError::InvalidRequest(
            "watch interval must be > 0".into(),
        ));
    }
    let collector = Collector::from_config(config);

    let mut completed = 0u32;
    loop {
        let outcome = collector
            .spawn(request.clone())?
            .recv()
            .unwrap_or_else(|_| {
                Err(EventScopeError::Io(std::io::Error::other(
                    "collection worker exited without a result",
                )))
            });

        match outcome {
            Ok(report) => print_snapshot(&report, &args.request)?,
            Err(e) => report_error(&e),
        }

        completed += 1;
        if args.cycles.is_some_and(|max| completed >= max) {
            return Ok(());
        }
        std::thread::sleep(interval);
    }
}

fn print_snapshot(report: &CycleReport, args: &RequestArgs) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    if args.format == export::OutputFormat::Table {
        writeln!(
            stdout,
            "== {} | {} events | {} | {} ==",
            report.request.channel(),
            report.records.len(),
            format_collected_at(&report.collected_at),
            format_duration(report.elapsed)
        )?;
    }
    export::render(&report.records, args.format, args.details, &mut stdout)?;
    stdout.flush()?;
    Ok(())
}

/// Print an error with its captured tool output and any actionable hint.
fn report_error(e: &EventScopeError) {
    tracing::debug!("Reporting failure to user: {e}");
    eprintln!("error: {e}");
    if let Some(output) = e.tool_output() {
        eprintln!("\nwevtutil output:\n{}", output.trim_end());
    }
    if let Some(hint) = e.user_hint() {
        eprintln!("\nhint: {hint}");
    }
}

/// Create the persistent log directory under `%LOCALAPPDATA%`.
///
/// Returns `Some(path)` to the log directory on success, `None` if the
/// directory cannot be created (logging falls back to stderr only).
fn init_log_dir() -> Option<PathBuf> {
    let log_dir = config::app_data_dir()?.join(constants::LOG_DIR);
    std::fs::create_dir_all(&log_dir).ok()?;

    // Rotate the log file if it exceeds the size limit.
    let log_file = log_dir.join(constants::LOG_FILE_NAME);
    if let Ok(meta) = std::fs::metadata(&log_file) {
        if meta.len() > constants::MAX_LOG_FILE_SIZE {
            let backup = log_dir.join(format!("{}.old", constants::LOG_FILE_NAME));
            let _ = std::fs::rename(&log_file, &backup);
        }
    }

    Some(log_dir)
}

/// Initialise the dual-layer tracing subscriber.
///
/// - **stderr layer**: `--log-level` if given, else the `RUST_LOG` env var
///   (default: `error`; failures are also printed to the user directly).
/// - **file layer** (if `log_dir` is `Some`): always writes at `debug` level
///   to a persistent log file for post-mortem diagnostics.
fn init_logging(log_dir: &Option<PathBuf>, level_override: Option<&str>) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = match level_override {
        Some(level) => tracing_subscriber::EnvFilter::try_new(level)
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("error")),
        None => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("error")),
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    if let Some(dir) = log_dir {
        let log_path = dir.join(constants::LOG_FILE_NAME);
        if let Ok(file) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
        {
            let file_layer = tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .with_filter(tracing_subscriber::EnvFilter::new("debug"));

            tracing_subscriber::registry()
                .with(stderr_layer.with_filter(env_filter))
                .with(file_layer)
                .init();
            return;
        }
    }

    // Fallback: stderr only
    tracing_subscriber::registry()
        .with(stderr_layer.with_filter(env_filter))
        .init();
}
