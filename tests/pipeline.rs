//! End-to-end collection cycles over canned `wevtutil` output.

use std::sync::Arc;

use eventscope::core::collector::{run_cycle, Collector};
use eventscope::core::event_record::EventRecord;
use eventscope::core::process_runner::{CommandRunner, RawCollectionResult};
use eventscope::core::query::QueryRequest;
use eventscope::util::error::{EventScopeError, Result};

/// Three events as `wevtutil qe ... /rd:true /f:xml` prints them: no root,
/// default namespace on each event, CRLF between fragments.
const FRAGMENT: &str = concat!(
    "<Event xmlns='http://schemas.microsoft.com/win/2004/08/events/event'><System>",
    "<Provider Name='Microsoft-Windows-Sysmon' Guid='{5770385f-c22a-43e0-bf4c-06f5698ffbd9}'/>",
    "<EventID>3</EventID><Version>5</Version><Level>4</Level><Task>3</Task>",
    "<TimeCreated SystemTime='2024-03-01T12:00:03.1234567Z'/>",
    "<EventRecordID>900</EventRecordID><Channel>Microsoft-Windows-Sysmon/Operational</Channel>",
    "<Computer>WS01</Computer></System><EventData>",
    "<Data Name='Image'>C:\\Windows\\System32\\svchost.exe</Data>",
    "<Data Name='DestinationIp'>10.0.0.5</Data>",
    "<Data Name='DestinationPort'>443</Data>",
    "</EventData></Event>\r\n",
    "<Event xmlns='http://schemas.microsoft.com/win/2004/08/events/event'><System>",
    "<Provider Name='Service Control Manager' EventSourceName='Service Control Manager'/>",
    "<EventID Qualifiers='16384'>7036</EventID><Level>4</Level>",
    "<TimeCreated SystemTime='2024-03-01T12:00:02.0000000Z'/><Computer>WS01</Computer></System>",
    "<EventData><Data Name='param1'>Print Spooler</Data><Data Name='param2'>running</Data>",
    "<Binary>5300700075006C0065</Binary></EventData></Event>\r\n",
    "<Event xmlns='http://schemas.microsoft.com/win/2004/08/events/event'><System>",
    "<Provider Name='Microsoft-Windows-Kernel-General'/>",
    "<EventID>16</EventID><Level>4</Level>",
    "<TimeCreated SystemTime='2024-03-01T12:00:01.0000000Z'/></System>",
    "<UserData><Something/></UserData></Event>\r\n",
);

struct Canned(String);

impl CommandRunner for Canned {
    fn run(&self, _args: &[String]) -> Result<RawCollectionResult> {
        Ok(RawCollectionResult {
            combined_output: self.0.clone(),
            exit_code: 0,
        })
    }
}

struct FailingTool;

impl CommandRunner for FailingTool {
    fn run(&self, _args: &[String]) -> Result<RawCollectionResult> {
        Err(EventScopeError::ExternalTool {
            exit_code: 15007,
            output: "Failed to read events. The specified channel could not be found.".into(),
        })
    }
}

fn request() -> QueryRequest {
    QueryRequest::new("System", 3, None).unwrap()
}

fn collect(output: &str) -> Result<Vec<EventRecord>> {
    run_cycle(&request(), &Canned(output.to_owned()))
}

#[test]
fn one_record_per_event_in_document_order() {
    let records = collect(FRAGMENT).unwrap();
    let ids: Vec<&str> = records.iter().map(|r| r.event_id()).collect();
    assert_eq!(ids, ["3", "7036", "16"]);
    let times: Vec<&str> = records.iter().map(|r| r.time_created()).collect();
    assert_eq!(
        times,
        [
            "2024-03-01T12:00:03.1234567Z",
            "2024-03-01T12:00:02.0000000Z",
            "2024-03-01T12:00:01.0000000Z",
        ]
    );
}

#[test]
fn sysmon_event_is_labelled() {
    let records = collect(FRAGMENT).unwrap();
    let sysmon = &records[0];
    assert_eq!(sysmon.provider_name(), "Microsoft-Windows-Sysmon");
    assert_eq!(
        sysmon.full_details(),
        "[Network Connect]\n\
         Image: C:\\Windows\\System32\\svchost.exe\n\
         DestinationIp: 10.0.0.5\n\
         DestinationPort: 443"
    );
    assert_eq!(sysmon.description(), "[Network Connect] [...]");
}

#[test]
fn generic_event_lists_named_data() {
    let records = collect(FRAGMENT).unwrap();
    assert_eq!(records[1].full_details(), "param1: Print Spooler\nparam2: running");
    assert_eq!(records[1].level(), "4");
}

#[test]
fn event_without_event_data() {
    let records = collect(FRAGMENT).unwrap();
    assert_eq!(records[2].full_details(), "No EventData");
    assert_eq!(records[2].description(), "No EventData [...]");
}

#[test]
fn description_invariant_holds_for_every_record() {
    for record in collect(FRAGMENT).unwrap() {
        let first = record.full_details().lines().next().unwrap_or("");
        assert_eq!(record.description(), format!("{first} [...]"));
    }
}

#[test]
fn empty_output_is_empty_list() {
    assert!(collect("").unwrap().is_empty());
    assert!(collect("\r\n").unwrap().is_empty());
}

#[test]
fn rerun_yields_identical_records() {
    assert_eq!(collect(FRAGMENT).unwrap(), collect(FRAGMENT).unwrap());
}

#[test]
fn tool_failure_yields_no_records() {
    let collector = Collector::new(Arc::new(FailingTool));
    let err = collector.collect(request()).unwrap_err();
    match err {
        EventScopeError::ExternalTool { exit_code, output } => {
            assert_eq!(exit_code, 15007);
            assert!(output.contains("could not be found"));
        }
        other => panic!("expected ExternalTool, got {other:?}"),
    }
}

#[test]
fn truncated_output_fails_whole_cycle() {
    let cut = &FRAGMENT[..FRAGMENT.len() / 2];
    let err = collect(cut).unwrap_err();
    assert!(matches!(err, EventScopeError::XmlParse(_)), "{err:?}");
}

#[test]
fn background_cycle_delivers_one_outcome() {
    let collector = Collector::new(Arc::new(Canned(FRAGMENT.to_owned())));
    let rx = collector.spawn(request()).unwrap();
    let report = rx.recv().unwrap().unwrap();
    assert_eq!(report.records.len(), 3);
    assert_eq!(report.request.max_count(), 3);
    // Exactly one message, then the worker hangs up.
    assert!(rx.recv().is_err());
}
