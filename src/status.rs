//! Informatics job and report status
//!
//! Every poll fetches the whole case and derives the outward status from scratch, so polling is
//! idempotent. The only side effect is resubmitting a failed job while the retry budget allows.

use log::{info, warn};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::pieriandx::client::{PierianDx, VendorError};
use crate::pieriandx::literals::SequencingSampleType;
use crate::pieriandx::sequencer::{InformaticsjobCreation, SequencerRunInfo};

pub const DEFAULT_MAX_RETRIES: u32 = 1;
/// Report id reported until the vendor has created a report
pub const NO_REPORT: i64 = -1;

#[derive(Debug, thiserror::Error)]
pub enum StatusError {
    #[error(transparent)]
    Vendor(#[from] VendorError),
    #[error("unexpected case state: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("case {0} has no informatics jobs")]
    NoJobs(String),
    #[error("case {case_id} can't be resubmitted: no {missing}")]
    NotResubmittable { case_id: String, missing: &'static str },
    #[error("resubmission response has no jobId: {0}")]
    MissingJobId(Value),
    #[error("report id {0} is out of range")]
    ReportId(u64),
}

/// Status reported to the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Runnable,
    Running,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    pub informaticsjob_id: u64,
    pub status: Status,
    pub report_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Waiting,
    Ready,
    Running,
    /// Not a documented vendor status, treated like `running`
    Completed,
    Complete,
    Failed,
    /// Terminal, reported as FAILED without inspecting reports or resubmitting
    Canceled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportState {
    Waiting,
    Ready,
    Running,
    ReportGenerationComplete,
    Complete,
    Failed,
    Canceled,
}

impl ReportState {
    pub fn is_done(&self) -> bool {
        matches!(self, ReportState::ReportGenerationComplete | ReportState::Complete)
    }
}

/// Vendor ids come back as numbers or numeric strings
fn vendor_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64().ok_or_else(|| serde::de::Error::custom(format!("invalid id {n}"))),
        Value::String(s) => s.parse().map_err(|_| serde::de::Error::custom(format!("invalid id {s:?}"))),
        other => Err(serde::de::Error::custom(format!("invalid id {other}"))),
    }
}

fn lane<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) => Ok(s),
        other => Err(serde::de::Error::custom(format!("invalid lane {other}"))),
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Job {
    #[serde(deserialize_with = "vendor_id")]
    pub id: u64,
    pub status: JobState,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Report {
    #[serde(deserialize_with = "vendor_id")]
    pub id: u64,
    pub status: ReportState,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseSpecimen {
    pub accession_number: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequencerRunSpecimen {
    pub barcode: String,
    #[serde(deserialize_with = "lane")]
    pub lane: String,
    pub sample_id: String,
    pub sample_type: SequencingSampleType,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequencerRun {
    pub run_id: String,
    #[serde(default)]
    pub specimens: Vec<SequencerRunSpecimen>,
}

/// The parts of `GET /case/{caseId}` the poller reads
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseState {
    #[serde(default)]
    pub informatics_jobs: Option<Vec<Job>>,
    #[serde(default)]
    pub reports: Option<Vec<Report>>,
    #[serde(default)]
    pub specimens: Option<Vec<CaseSpecimen>>,
    #[serde(default)]
    pub sequencer_runs: Option<Vec<SequencerRun>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Report(JobStatus),
    /// Submit a new informatics job for the same specimen and sequencer run
    Resubmit(InformaticsjobCreation),
}

impl CaseState {
    fn latest_job(&self) -> Option<&Job> {
        self.informatics_jobs.iter().flatten().max_by_key(|job| job.id)
    }

    fn latest_report(&self) -> Option<&Report> {
        self.reports.iter().flatten().max_by_key(|report| report.id)
    }

    fn job_count(&self) -> usize {
        self.informatics_jobs.as_ref().map_or(0, Vec::len)
    }

    /// The first specimen's first sequencer run, as it was originally submitted
    fn resubmission(&self, case_id: &str) -> Result<InformaticsjobCreation, StatusError> {
        let missing = |missing| StatusError::NotResubmittable { case_id: case_id.to_string(), missing };
        let specimen = self.specimens.iter().flatten().next().ok_or_else(|| missing("specimen"))?;
        let run = self.sequencer_runs.iter().flatten().next().ok_or_else(|| missing("sequencer run"))?;
        let run_specimen = run.specimens.first().ok_or_else(|| missing("sequencer run specimen"))?;

        Ok(InformaticsjobCreation::new(&specimen.accession_number, vec![SequencerRunInfo {
            run_id: run.run_id.clone(),
            barcode: run_specimen.barcode.clone(),
            lane: run_specimen.lane.clone(),
            sample_id: run_specimen.sample_id.clone(),
            sample_type: run_specimen.sample_type,
        }]))
    }
}

/// Decide what to report, or whether to resubmit, from the current case state
pub fn interpret(case_id: &str, case: &CaseState, max_retries: u32) -> Result<Decision, StatusError> {
    let job = case.latest_job().ok_or_else(|| StatusError::NoJobs(case_id.to_string()))?;
    info!("Case {case_id} informatics job {} is {:?}", job.id, job.status);
    let report = |status, report_id| Ok(Decision::Report(JobStatus { informaticsjob_id: job.id, status, report_id }));

    match job.status {
        JobState::Waiting | JobState::Ready => report(Status::Runnable, NO_REPORT),
        JobState::Running | JobState::Completed => report(Status::Running, NO_REPORT),
        JobState::Canceled => report(Status::Failed, NO_REPORT),
        JobState::Failed => {
            let attempts = case.job_count();
            if attempts <= max_retries as usize {
                info!("Resubmitting case {case_id} after {attempts} attempts (max retries {max_retries})");
                Ok(Decision::Resubmit(case.resubmission(case_id)?))
            } else {
                warn!("Case {case_id} failed after {attempts} attempts");
                report(Status::Failed, NO_REPORT)
            }
        }
        JobState::Complete => match case.latest_report() {
            None => report(Status::Running, NO_REPORT),
            Some(latest) => {
                info!("Case {case_id} report {} is {:?}", latest.id, latest.status);
                let report_id = i64::try_from(latest.id).map_err(|_| StatusError::ReportId(latest.id))?;
                let status = if latest.status.is_done() { Status::Succeeded } else { Status::Running };
                report(status, report_id)
            }
        },
    }
}

fn job_id(response: &Value) -> Option<u64> {
    match response.get("jobId")? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Fetch the case, interpret it, and resubmit if that is the decision
pub async fn poll<P: PierianDx>(vendor: &P, case_id: &str, max_retries: u32) -> Result<JobStatus, StatusError> {
    let case: CaseState = serde_json::from_value(vendor.get_case(case_id).await?)?;
    match interpret(case_id, &case, max_retries)? {
        Decision::Report(status) => Ok(status),
        Decision::Resubmit(job) => {
            let response = vendor.create_informatics_job(case_id, &serde_json::to_value(&job)?).await?;
            let informaticsjob_id = job_id(&response).ok_or_else(|| StatusError::MissingJobId(response.clone()))?;
            info!("Case {case_id} resubmitted as informatics job {informaticsjob_id}");
            Ok(JobStatus { informaticsjob_id, status: Status::Runnable, report_id: NO_REPORT })
        }
    }
}
