//! Vendor objects for one sequenced sample
//!
//! Combines case metadata with the TSO500L row of the run's sample sheet to build the case,
//! sequencer run, and informatics job payloads, plus the manifest of files to stage.

use std::collections::{BTreeMap, HashMap};

use log::info;
use serde::{Deserialize, Serialize};

use crate::lookup::{CodeLookup, LookupError};
use crate::metadata::CaseMetadata;
use crate::pieriandx::case::{CaseCreation, Dag};
use crate::pieriandx::data_file::{DataFile, DataFileTransfer, DataSource};
use crate::pieriandx::literals::{DataType, SequencingType};
use crate::pieriandx::sequencer::{InformaticsjobCreation, SequencerrunCreation, SpecimenSequencerInfo};
use crate::samplesheet::{lowercase_index_headers, SampleSheet, SampleSheetError};

/// Key of the run's sample sheet in the data file map, it is read rather than staged
pub const SAMPLESHEET_URI: &str = "samplesheetUri";

#[derive(Debug, thiserror::Error)]
pub enum ObjectsError {
    #[error(transparent)]
    SampleSheet(#[from] SampleSheetError),
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error("dataFiles has no {SAMPLESHEET_URI}")]
    MissingSamplesheetUri,
    #[error("unknown data file type {0}")]
    UnknownDataFile(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectsRequest {
    pub dag: Dag,
    pub case_metadata: CaseMetadata,
    pub data_files: HashMap<String, String>,
    pub panel_id: String,
    pub instrument_run_id: String,
    pub sequencerrun_s3_path_root: String,
}

impl ObjectsRequest {
    pub fn samplesheet_uri(&self) -> Result<&str, ObjectsError> {
        self.data_files.get(SAMPLESHEET_URI)
            .map(String::as_str)
            .ok_or(ObjectsError::MissingSamplesheetUri)
    }

    /// Result files keyed by type, without the sample sheet
    fn result_files(&self) -> Result<BTreeMap<DataType, String>, ObjectsError> {
        self.data_files.iter()
            .filter(|(key, _)| key.as_str() != SAMPLESHEET_URI)
            .map(|(key, uri)| match key.parse::<DataType>() {
                Ok(DataType::SamplesheetContents) | Err(_) => Err(ObjectsError::UnknownDataFile(key.clone())),
                Ok(data_type) => Ok((data_type, uri.clone())),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PierianDxObjects {
    pub case_creation_obj: CaseCreation,
    pub sequencerrun_creation_obj: SequencerrunCreation,
    pub informaticsjob_creation_obj: InformaticsjobCreation,
    pub data_files: Vec<DataFileTransfer>,
    pub sequencerrun_s3_path: String,
    pub sample_name: String,
}

/// Build every vendor object for `request` from the text of its sample sheet
pub fn build<L: CodeLookup>(request: &ObjectsRequest, samplesheet: &str, lookup: &L) -> Result<PierianDxObjects, ObjectsError> {
    let metadata = &request.case_metadata;
    let accession_number = &metadata.case_accession_number;

    let sheet: SampleSheet = samplesheet.parse()?;
    let entry = sheet.tso500l_entry()?;
    let case_creation = CaseCreation::encode(metadata, &request.dag, &request.panel_id, lookup)?;

    let run_id = format!("{}__{}", request.instrument_run_id, accession_number);
    let sequencerrun_s3_path = format!("{}/{}", request.sequencerrun_s3_path_root.trim_end_matches('/'), run_id);
    info!("Sequencer run {run_id} staged under {sequencerrun_s3_path}");

    let info = SpecimenSequencerInfo {
        run_id: run_id.clone(),
        case_accession_number: accession_number.clone(),
        barcode: entry.barcode(),
        lane: entry.lane,
        sample_id: entry.sample_id.clone(),
        sample_type: entry.sample_type,
    };

    let data_file = |data_type: DataType, source: DataSource| DataFile {
        sequencerrun_path_root: sequencerrun_s3_path.clone(),
        data_type,
        sample_id: entry.sample_id.clone(),
        source,
    };
    let mut data_files: Vec<DataFileTransfer> = request.result_files()?
        .into_iter()
        .map(|(data_type, uri)| data_file(data_type, DataSource::Uri(uri)).transfer())
        .collect();
    let contents = lowercase_index_headers(&sheet.to_string());
    data_files.push(data_file(DataType::SamplesheetContents, DataSource::Contents(contents)).transfer());

    Ok(PierianDxObjects {
        case_creation_obj: case_creation,
        sequencerrun_creation_obj: SequencerrunCreation::new(&info, SequencingType::PairedEnd),
        informaticsjob_creation_obj: InformaticsjobCreation::from_specimen(&info),
        data_files,
        sequencerrun_s3_path,
        sample_name: entry.sample_id,
    })
}
