//! Handler entry points
//!
//! Each handler takes its typed event and the collaborators it needs, and returns the JSON the
//! orchestrator consumes. [run] wires the real collaborators from [Config].

use anyhow::{Context, Result};
use chrono_tz::Tz;
use log::{info, warn};
use serde::{Deserialize, Deserializer};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::config::{Command, Config};
use crate::lookup::{CodeLookup, SnomedLookup};
use crate::metadata::library::LibraryRef;
use crate::metadata::{select_library, Assembler, CaseMetadataEvent, ProjectTable};
use crate::objects::{self, ObjectsRequest};
use crate::pieriandx::{DataFileTransfer, PierianDx};
use crate::request::Event;
use crate::services::{FileManager, MetadataService, ObjectStore, WorkflowService};
use crate::staging;
use crate::status::{self, DEFAULT_MAX_RETRIES};

/// Vendor case ids arrive as numbers or strings
fn case_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(id) => Ok(id),
        Value::Number(id) => Ok(id.to_string()),
        other => Err(serde::de::Error::custom(format!("invalid case id {other}"))),
    }
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCaseEvent {
    pub case_creation_obj: Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSequencerrunEvent {
    pub sequencerrun_creation_obj: Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInformaticsjobEvent {
    #[serde(deserialize_with = "case_id")]
    pub case_id: String,
    pub informaticsjob_creation_obj: Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusEvent {
    #[serde(deserialize_with = "case_id")]
    pub case_id: String,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectLibraryEvent {
    pub libraries: Vec<LibraryRef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataFilesEvent {
    pub portal_run_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInfoEvent {
    pub library_id: String,
}

pub async fn case_metadata<M: MetadataService, P: PierianDx>(event: CaseMetadataEvent, metadata: &M, vendor: &P,
                                                              timezone: Tz, max_accession_attempts: u32) -> Result<Value> {
    info!("Handling case metadata for library {}", event.library_id);
    let case_metadata = Assembler::new(metadata, vendor, timezone)
        .max_accession_attempts(max_accession_attempts)
        .assemble(&event)
        .await
        .with_context(|| format!("Can't assemble case metadata for {}", event.library_id))?;
    Ok(json!({ "caseMetadata": case_metadata }))
}

pub async fn create_case<P: PierianDx>(event: CreateCaseEvent, vendor: &P) -> Result<Value> {
    info!("Creating case");
    let case = vendor.create_case(&event.case_creation_obj).await.map_err(|err| {
        warn!("Case creation failed: {err}");
        err
    })?;
    Ok(json!({ "caseObj": case }))
}

pub async fn create_sequencerrun<P: PierianDx>(event: CreateSequencerrunEvent, vendor: &P) -> Result<Value> {
    info!("Creating sequencer run");
    let run = vendor.create_sequencer_run(&event.sequencerrun_creation_obj).await.map_err(|err| {
        warn!("Sequencer run creation failed: {err}");
        err
    })?;
    Ok(json!({ "sequencerrunObj": run }))
}

pub async fn create_informaticsjob<P: PierianDx>(event: CreateInformaticsjobEvent, vendor: &P) -> Result<Value> {
    info!("Creating informatics job for case {}", event.case_id);
    let job = vendor.create_informatics_job(&event.case_id, &event.informaticsjob_creation_obj).await.map_err(|err| {
        warn!("Informatics job creation for case {} failed: {err}", event.case_id);
        err
    })?;
    Ok(json!({ "informaticsjobObj": job }))
}

/// The sample sheet is fetched here, everything else is derived from the event
pub async fn pieriandx_objects<F: FileManager, L: CodeLookup>(request: ObjectsRequest, files: &F, lookup: &L) -> Result<Value> {
    let samplesheet_uri = request.samplesheet_uri()?;
    info!("Building vendor objects for {} from {samplesheet_uri}", request.case_metadata.case_accession_number);
    let samplesheet = files.download(samplesheet_uri).await
        .with_context(|| format!("Can't download sample sheet {samplesheet_uri}"))?;
    let samplesheet = String::from_utf8(samplesheet).context("Sample sheet is not UTF-8")?;
    let objects = objects::build(&request, &samplesheet, lookup)?;
    Ok(serde_json::to_value(objects)?)
}

pub async fn job_status<P: PierianDx>(event: JobStatusEvent, vendor: &P) -> Result<Value> {
    info!("Polling case {} (max retries {})", event.case_id, event.max_retries);
    let status = status::poll(vendor, &event.case_id, event.max_retries).await
        .with_context(|| format!("Can't poll case {}", event.case_id))?;
    Ok(serde_json::to_value(status)?)
}

pub async fn upload<F: FileManager, S: ObjectStore>(transfer: DataFileTransfer, files: &F, store: &S, rewrite_metrics: bool) -> Result<Value> {
    info!("Uploading to {}", transfer.dest_uri);
    let uploaded = staging::upload(files, store, &transfer, rewrite_metrics).await
        .with_context(|| format!("Can't upload {}", transfer.dest_uri))?;
    Ok(serde_json::to_value(uploaded)?)
}

pub fn select_library_id(event: SelectLibraryEvent) -> Result<Value> {
    let library_id = select_library(&event.libraries)?;
    info!("Selected library {library_id}");
    Ok(json!({ "libraryId": library_id }))
}

pub async fn data_files<W: WorkflowService, F: FileManager>(event: DataFilesEvent, workflow: &W, files: &F) -> Result<Value> {
    info!("Discovering data files for workflow run {}", event.portal_run_id);
    let data_files = staging::discover(workflow, files, &event.portal_run_id).await
        .with_context(|| format!("Can't discover data files for {}", event.portal_run_id))?;
    Ok(serde_json::to_value(data_files)?)
}

pub async fn project_info<M: MetadataService>(event: ProjectInfoEvent, table: &ProjectTable, metadata: &M) -> Result<Value> {
    info!("Looking up project info for library {}", event.library_id);
    let tags = table.tags(metadata, &event.library_id).await?;
    Ok(serde_json::to_value(tags)?)
}

fn read<T: DeserializeOwned>(config: &Config) -> Result<T> {
    let event = Event { source: config.event_source(), schema: config.command.schema() };
    Ok(event.read()?)
}

/// Run the configured handler against real collaborators
pub async fn run(config: &Config) -> Result<Value> {
    info!("Running {:?} in {} namespace", config.command, config.namespace);
    match config.command {
        Command::CaseMetadata => {
            let orcabus = config.orcabus_client();
            let vendor = config.pieriandx_client();
            case_metadata(read(config)?, &orcabus, &vendor, config.reporting_timezone, config.max_accession_attempts).await
        }
        Command::CreateCase => create_case(read(config)?, &config.pieriandx_client()).await,
        Command::CreateSequencerrun => create_sequencerrun(read(config)?, &config.pieriandx_client()).await,
        Command::CreateInformaticsjob => create_informaticsjob(read(config)?, &config.pieriandx_client()).await,
        Command::PieriandxObjects => {
            let request: ObjectsRequest = read(config)?;
            if !request.sequencerrun_s3_path_root.starts_with(config.namespace.sequencerrun_root()) {
                warn!("{} is outside the {} landing zone {}", request.sequencerrun_s3_path_root, config.namespace, config.namespace.sequencerrun_root());
            }
            let (disease, specimen) = config.snomed_locations()?;
            let lookup = SnomedLookup::cached(&config.reference_store(), &disease, &specimen).await?;
            pieriandx_objects(request, &config.orcabus_client(), lookup).await
        }
        Command::JobStatus => job_status(read(config)?, &config.pieriandx_client()).await,
        Command::Upload => {
            let transfer: DataFileTransfer = read(config)?;
            let store = config.landing_zone_store()?;
            upload(transfer, &config.orcabus_client(), &store, config.rewrite_metrics_output_header).await
        }
        Command::SelectLibrary => select_library_id(read(config)?),
        Command::DataFiles => {
            let orcabus = config.orcabus_client();
            data_files(read(config)?, &orcabus, &orcabus).await
        }
        Command::ProjectInfo => project_info(read(config)?, &config.project_table()?, &config.orcabus_client()).await,
    }
}
