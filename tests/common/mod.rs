#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use serde_json::{json, Value};

use pieriandx_bridge::lookup::{SnomedLookup, SnomedTable};
use pieriandx_bridge::pieriandx::{PierianDx, VendorError};
use pieriandx_bridge::services::{FileManager, FileObject, Library, LibrarySample, LibrarySubject, MetadataService,
                                 ObjectStore, Project, ServiceError, WorkflowService};

pub const LIBRARY_ID: &str = "L2400161";
pub const PORTAL_RUN_ID: &str = "20241101abcdef01";
pub const SAMPLESHEET_URI: &str = "s3://pipeline-cache/byob-icav2/production/analysis/cttsov2/20241101abcdef01/Logs_Intermediates/SampleSheetValidation/SampleSheet_Intermediate.csv";

pub const SAMPLESHEET: &str = "\
[Header]
FileFormatVersion,2
RunName,241024_A00130_0336_BHW7MVDSXC

[Reads]
Read1Cycles,151
Read2Cycles,151
Index1Cycles,8
Index2Cycles,8

[TSO500L_Settings]
AdapterRead1,CTGTCTCTTATACACATCT

[TSO500L_Data]
Sample_ID,Sample_Type,Lane,Index,Index2,I7_Index_ID,I5_Index_ID
L2400161,DNA,3,GAATCCGA,TTCGCAAG,UDP0049,UDP0049
";

pub fn lookup() -> SnomedLookup {
    SnomedLookup::new(
        SnomedTable::from_rows(SnomedTable::DISEASE, [(55342001, "Neoplastic disease"), (285645000, "Disseminated malignancy of unknown primary")]),
        SnomedTable::from_rows(SnomedTable::SPECIMEN_TYPE, [(122561005, "Blood specimen from patient")]),
    )
}

/// Library record with a fixed subject and project set
pub struct Metadata {
    pub projects: Vec<&'static str>,
}

impl MetadataService for Metadata {
    async fn library(&self, library_id: &str) -> Result<Library, ServiceError> {
        Ok(Library {
            library_id: library_id.to_string(),
            sample: LibrarySample { external_sample_id: "PRJ240003".to_string() },
            subject: LibrarySubject { subject_id: "SBJ04407".to_string() },
            project_set: self.projects.iter().map(|id| Project { project_id: id.to_string() }).collect(),
        })
    }
}

/// In-memory vendor. Cases are fixed JSON, created objects are recorded
pub struct Vendor {
    pub taken: HashSet<String>,
    pub cases: HashMap<String, Value>,
    pub next_job_id: u64,
    pub created: RefCell<Vec<(String, Value)>>,
}

impl Vendor {
    pub fn new() -> Vendor {
        Vendor { taken: HashSet::new(), cases: HashMap::new(), next_job_id: 9001, created: RefCell::new(Vec::new()) }
    }

    pub fn with_case(mut self, case_id: &str, case: Value) -> Vendor {
        self.cases.insert(case_id.to_string(), case);
        self
    }

    pub fn with_taken(mut self, accession_numbers: &[&str]) -> Vendor {
        self.taken.extend(accession_numbers.iter().map(|n| n.to_string()));
        self
    }

    pub fn created(&self) -> Vec<(String, Value)> {
        self.created.borrow().clone()
    }
}

impl PierianDx for Vendor {
    async fn case_exists(&self, accession_number: &str) -> Result<bool, VendorError> {
        Ok(self.taken.contains(accession_number))
    }

    async fn create_case(&self, case: &Value) -> Result<Value, VendorError> {
        self.created.borrow_mut().push(("case".to_string(), case.clone()));
        Ok(json!({"id": "94775"}))
    }

    async fn create_sequencer_run(&self, run: &Value) -> Result<Value, VendorError> {
        self.created.borrow_mut().push(("sequencerRun".to_string(), run.clone()));
        Ok(json!({"runId": run["runId"]}))
    }

    async fn create_informatics_job(&self, case_id: &str, job: &Value) -> Result<Value, VendorError> {
        self.created.borrow_mut().push((format!("case/{case_id}/informaticsJobs"), job.clone()));
        Ok(json!({"jobId": self.next_job_id.to_string()}))
    }

    async fn get_case(&self, case_id: &str) -> Result<Value, VendorError> {
        self.cases.get(case_id).cloned().ok_or_else(|| VendorError::Status {
            endpoint: format!("case/{case_id}"),
            status: 404,
            body: String::new(),
        })
    }
}

/// File manager and workflow service over a fixed set of objects
pub struct Files {
    pub objects: HashMap<String, Vec<u8>>,
    pub payload: Value,
}

impl Files {
    pub fn new() -> Files {
        Files { objects: HashMap::new(), payload: json!({"data": {"inputs": {"sampleName": LIBRARY_ID}}}) }
    }

    pub fn with(mut self, uri: &str, body: impl Into<Vec<u8>>) -> Files {
        self.objects.insert(uri.to_string(), body.into());
        self
    }
}

impl FileManager for Files {
    async fn list_run_files(&self, _portal_run_id: &str) -> Result<Vec<FileObject>, ServiceError> {
        let mut files: Vec<FileObject> = self.objects.keys()
            .map(|uri| {
                let (bucket, key) = uri.trim_start_matches("s3://").split_once('/').unwrap();
                FileObject { bucket: bucket.to_string(), key: key.to_string() }
            })
            .collect();
        files.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(files)
    }

    async fn download(&self, uri: &str) -> Result<Vec<u8>, ServiceError> {
        self.objects.get(uri).cloned().ok_or_else(|| ServiceError::Unexpected(format!("no object {uri}")))
    }
}

impl WorkflowService for Files {
    async fn latest_payload(&self, _portal_run_id: &str) -> Result<Value, ServiceError> {
        Ok(self.payload.clone())
    }
}

/// Records every upload
#[derive(Default)]
pub struct Store {
    pub puts: RefCell<Vec<(String, String, Vec<u8>)>>,
}

impl ObjectStore for Store {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, ServiceError> {
        Err(ServiceError::Unexpected(format!("no object s3://{bucket}/{key}")))
    }

    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<(), ServiceError> {
        self.puts.borrow_mut().push((bucket.to_string(), key.to_string(), body));
        Ok(())
    }
}
