mod common;

use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use pieriandx_bridge::handler::{self, JobStatusEvent};
use pieriandx_bridge::request::{decode, EventSchema};

use common::Vendor;

const CASE_ID: &str = "94775";

fn case(jobs: Value, reports: Value) -> Value {
    json!({
        "id": CASE_ID,
        "identified": false,
        "informaticsJobs": jobs,
        "reports": reports,
        "specimens": [{"accessionNumber": "L2400161_002", "externalSpecimenId": "PRJ240003"}],
        "sequencerRuns": [{
            "runId": "241024_A00130_0336_BHW7MVDSXC__L2400161_002",
            "type": "pairedEnd",
            "specimens": [{"accessionNumber": "L2400161_002", "barcode": "GAATCCGA-TTCGCAAG", "lane": "3", "sampleId": "L2400161", "sampleType": "DNA"}]
        }]
    })
}

fn event(value: Value) -> JobStatusEvent {
    decode(EventSchema::JobStatus, &value.to_string()).unwrap()
}

#[tokio::test]
async fn polling_an_unchanged_case_is_idempotent() {
    let vendor = Vendor::new().with_case(CASE_ID, case(
        json!([{"id": "3301", "status": "complete"}]),
        json!([{"id": "8120", "status": "running"}]),
    ));

    let first = handler::job_status(event(json!({"caseId": CASE_ID, "maxRetries": 1})), &vendor).await.unwrap();
    let second = handler::job_status(event(json!({"caseId": CASE_ID, "maxRetries": 1})), &vendor).await.unwrap();

    assert_eq!(first, json!({"informaticsjobId": 3301, "status": "RUNNING", "reportId": 8120}));
    assert_eq!(first, second);
    assert!(vendor.created().is_empty());
}

#[tokio::test]
async fn failed_job_within_budget_is_resubmitted() {
    let vendor = Vendor::new().with_case(CASE_ID, case(json!([{"id": 3301, "status": "failed"}]), Value::Null));

    let status = handler::job_status(event(json!({"caseId": 94775, "maxRetries": 1})), &vendor).await.unwrap();

    assert_eq!(status, json!({"informaticsjobId": 9001, "status": "RUNNABLE", "reportId": -1}));
    assert_eq!(vendor.created(), vec![(
        format!("case/{CASE_ID}/informaticsJobs"),
        json!({
            "input": [{
                "accessionNumber": "L2400161_002",
                "sequencerRunInfos": [{
                    "runId": "241024_A00130_0336_BHW7MVDSXC__L2400161_002",
                    "barcode": "GAATCCGA-TTCGCAAG",
                    "lane": "3",
                    "sampleId": "L2400161",
                    "sampleType": "DNA"
                }]
            }]
        }),
    )]);
}

#[tokio::test]
async fn failed_job_over_budget_is_terminal() {
    let jobs = json!([
        {"id": 3301, "status": "failed"},
        {"id": 3302, "status": "failed"},
        {"id": 3303, "status": "failed"}
    ]);
    let vendor = Vendor::new().with_case(CASE_ID, case(jobs, json!([])));

    let status = handler::job_status(event(json!({"caseId": CASE_ID, "maxRetries": 1})), &vendor).await.unwrap();

    assert_eq!(status, json!({"informaticsjobId": 3303, "status": "FAILED", "reportId": -1}));
    assert!(vendor.created().is_empty());
}

#[tokio::test]
async fn max_retries_defaults_to_one() {
    let vendor = Vendor::new().with_case(CASE_ID, case(json!([{"id": 3301, "status": "failed"}]), Value::Null));
    let event = event(json!({"caseId": CASE_ID}));
    assert_eq!(event.max_retries, 1);

    let status = handler::job_status(event, &vendor).await.unwrap();
    assert_eq!(status["status"], "RUNNABLE");
}

#[tokio::test]
async fn complete_report_succeeds() {
    let reports = json!([
        {"id": 8120, "status": "failed"},
        {"id": 8121, "status": "report_generation_complete"}
    ]);
    let vendor = Vendor::new().with_case(CASE_ID, case(json!([{"id": 3301, "status": "complete"}]), reports));

    let status = handler::job_status(event(json!({"caseId": CASE_ID})), &vendor).await.unwrap();
    assert_eq!(status, json!({"informaticsjobId": 3301, "status": "SUCCEEDED", "reportId": 8121}));
}

#[tokio::test]
async fn unknown_case_is_an_error() {
    let vendor = Vendor::new();
    assert!(handler::job_status(event(json!({"caseId": "1"})), &vendor).await.is_err());
}
