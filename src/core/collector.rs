//! Collection cycles: query → execute → parse → decode → normalize.
//!
//! [`run_cycle`] is the pure pipeline over a [`CommandRunner`]. [`Collector`]
//! adds a single-flight gate and can run a cycle on a background thread,
//! delivering exactly one [`CycleOutcome`] over a [`crossbeam_channel`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use crossbeam_channel::Receiver;

use crate::core::event_record::{normalize, EventRecord};
use crate::core::process_runner::{CommandRunner, ProcessRunner};
use crate::core::query::{build_query_args, QueryRequest};
use crate::core::xml_parser::decode_events;
use crate::util::config::CollectorConfig;
use crate::util::error::{EventScopeError, Result};
use crate::util::time::format_duration;

/// The result of one successful cycle.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CycleReport {
    /// Records in tool order (newest first).
    pub records: Vec<EventRecord>,
    /// The request this cycle answered.
    pub request: QueryRequest,
    /// When the cycle finished.
    pub collected_at: DateTime<Utc>,
    /// Wall-clock time the cycle took.
    #[serde(skip)]
    pub elapsed: Duration,
}

/// What a background cycle delivers: the full report or one error.
pub type CycleOutcome = Result<CycleReport>;

/// Run the pipeline once. All-or-nothing: any error discards every record.
pub fn run_cycle(request: &QueryRequest, runner: &dyn CommandRunner) -> Result<Vec<EventRecord>> {
    let args = build_query_args(request);
    let raw = runner.run(&args)?;
    let decoded = decode_events(&raw.combined_output)?;
    Ok(normalize(decoded))
}

/// Runs collection cycles for one event source, at most one at a time.
///
/// Clones share the same gate.
#[derive(Clone)]
pub struct Collector {
    runner: Arc<dyn CommandRunner>,
    in_flight: Arc<AtomicBool>,
}

impl std::fmt::Debug for Collector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collector")
            .field("in_flight", &self.is_busy())
            .finish_non_exhaustive()
    }
}

impl Collector {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A collector that launches the configured query tool.
    pub fn from_config(config: &CollectorConfig) -> Self {
        Self::new(Arc::new(ProcessRunner::new(
            config.tool_path.clone(),
            config.timeout(),
        )))
    }

    /// Whether a cycle is currently running.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Run one cycle on the calling thread.
    ///
    /// # Errors
    /// [`EventScopeError::Busy`] if another cycle is in flight, otherwise
    /// whatever the pipeline stage that failed reports.
    pub fn collect(&self, request: QueryRequest) -> CycleOutcome {
        let _guard = InFlightGuard::acquire(&self.in_flight)?;
        execute(self.runner.as_ref(), request)
    }

    /// Run one cycle on a background thread.
    ///
    /// The gate is taken before this returns, so a concurrent call sees
    /// [`EventScopeError::Busy`] immediately. The receiver yields exactly one
    /// outcome; if the worker panics it disconnects without one.
    pub fn spawn(&self, request: QueryRequest) -> Result<Receiver<CycleOutcome>> {
        let guard = InFlightGuard::acquire(&self.in_flight)?;
        let (tx, rx) = crossbeam_channel::bounded::<CycleOutcome>(1);
        let runner = Arc::clone(&self.runner);

        std::thread::Builder::new()
            .name("collection-cycle".into())
            .spawn(move || {
                let _guard = guard;
                let outcome = execute(runner.as_ref(), request);
                // The caller may have stopped listening; the result is then dropped.
                let _ = tx.send(outcome);
            })?;

        Ok(rx)
    }
}

fn execute(runner: &dyn CommandRunner, request: QueryRequest) -> CycleOutcome {
    let start = Instant::now();
    match run_cycle(&request, runner) {
        Ok(records) => {
            let elapsed = start.elapsed();
            tracing::info!(
                "Collected {} events from '{}' in {}",
                records.len(),
                request.channel(),
                format_duration(elapsed)
            );
            Ok(CycleReport {
                records,
                request,
                collected_at: Utc::now(),
                elapsed,
            })
        }
        Err(e) => {
            tracing::warn!("Collection from '{}' failed: {}", request.channel(), e);
            Err(e)
        }
    }
}

/// Holds the in-flight flag; clears it on drop, including during unwinding.
struct InFlightGuard(Arc<AtomicBool>);

impl InFlightGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| {
                tracing::warn!("Rejected collection request: a cycle is already running");
                EventScopeError::Busy
            })?;
        Ok(Self(Arc::clone(flag)))
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::process_runner::RawCollectionResult;
    use crossbeam_channel::Sender;
    use std::sync::Mutex;

    const TWO_EVENTS: &str = "\
<Event><System><Provider Name='Microsoft-Windows-Sysmon'/><EventID>22</EventID><Level>4</Level>\
<TimeCreated SystemTime='2024-03-01T12:00:02Z'/></System>\
<EventData><Data Name='QueryName'>example.com</Data></EventData></Event>\r\n\
<Event><System><Provider Name='Service Control Manager'/><EventID>7036</EventID><Level>4</Level>\
<TimeCreated SystemTime='2024-03-01T12:00:01Z'/></System>\
<EventData><Data>Print Spooler</Data><Data>running</Data></EventData></Event>\r\n";

    /// Returns fixed output and records the arguments it was called with.
    struct CannedRunner {
        output: String,
        calls: Mutex<Vec<Vec<String>>>,
    }

    impl CannedRunner {
        fn new(output: &str) -> Self {
            Self {
                output: output.into(),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl CommandRunner for CannedRunner {
        fn run(&self, args: &[String]) -> Result<RawCollectionResult> {
            self.calls.lock().unwrap().push(args.to_vec());
            Ok(RawCollectionResult {
                combined_output: self.output.clone(),
                exit_code: 0,
            })
        }
    }

    /// Blocks inside `run` until the test sends on `release`.
    struct BlockingRunner {
        started: Sender<()>,
        release: Receiver<()>,
    }

    impl CommandRunner for BlockingRunner {
        fn run(&self, _args: &[String]) -> Result<RawCollectionResult> {
            let _ = self.started.send(());
            let _ = self.release.recv();
            Ok(RawCollectionResult {
                combined_output: String::new(),
                exit_code: 0,
            })
        }
    }

    fn request() -> QueryRequest {
        QueryRequest::new("Application", 2, Some("  ".into())).unwrap()
    }

    #[test]
    fn test_run_cycle_end_to_end() {
        let runner = CannedRunner::new(TWO_EVENTS);
        let records = run_cycle(&request(), &runner).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].event_id(), "22");
        assert_eq!(records[0].full_details(), "[DNS Query]\nQueryName: example.com");
        assert_eq!(records[0].description(), "[DNS Query] [...]");
        assert_eq!(records[1].full_details(), "Print Spooler\nrunning");
        assert_eq!(records[1].description(), "Print Spooler [...]");

        let calls = runner.calls.lock().unwrap();
        assert_eq!(
            calls[0],
            ["qe", "Application", "/c:2", "/rd:true", "/f:xml"]
        );
    }

    #[test]
    fn test_run_cycle_is_deterministic() {
        let runner = CannedRunner::new(TWO_EVENTS);
        let first = run_cycle(&request(), &runner).unwrap();
        let second = run_cycle(&request(), &runner).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_collect_releases_gate() {
        let collector = Collector::new(Arc::new(CannedRunner::new(TWO_EVENTS)));
        let report = collector.collect(request()).unwrap();
        assert_eq!(report.records.len(), 2);
        assert!(!collector.is_busy());
        assert!(collector.collect(request()).is_ok());
    }

    #[test]
    fn test_gate_released_after_failure() {
        let collector = Collector::new(Arc::new(CannedRunner::new("<Event>")));
        let err = collector.collect(request()).unwrap_err();
        assert!(matches!(err, EventScopeError::XmlParse(_)));
        assert!(!collector.is_busy());
    }

    #[test]
    fn test_overlapping_cycle_is_rejected() {
        let (started_tx, started_rx) = crossbeam_channel::bounded(1);
        let (release_tx, release_rx) = crossbeam_channel::bounded(1);
        let collector = Collector::new(Arc::new(BlockingRunner {
            started: started_tx,
            release: release_rx,
        }));

        let rx = collector.spawn(request()).unwrap();
        started_rx.recv().unwrap();
        assert!(collector.is_busy());

        let err = collector.collect(request()).unwrap_err();
        assert!(matches!(err, EventScopeError::Busy));
        let err = collector.clone().spawn(request()).unwrap_err();
        assert!(matches!(err, EventScopeError::Busy));

        release_tx.send(()).unwrap();
        let report = rx.recv().unwrap().unwrap();
        assert!(report.records.is_empty());
        assert_eq!(report.request.channel(), "Application");
    }
}
