use std::collections::BTreeMap;

use log::info;
use serde::Serialize;

use crate::objects::SAMPLESHEET_URI;
use crate::pieriandx::literals::DataType;
use crate::services::{FileManager, FileObject, WorkflowService};
use crate::staging::StagingError;

const SAMPLESHEET_PATTERN: &str = "Logs_Intermediates/SampleSheetValidation/SampleSheet_Intermediate.csv";

/// Result file uris keyed the way the object builder expects them
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataFiles {
    pub data_files: BTreeMap<String, String>,
}

fn find<'a>(files: &'a [FileObject], suffix: &str) -> Option<&'a FileObject> {
    files.iter().find(|file| file.key.ends_with(suffix))
}

/// Find a workflow run's result files for the sample it processed
pub async fn discover<W: WorkflowService, F: FileManager>(workflow: &W, files: &F, portal_run_id: &str) -> Result<DataFiles, StagingError> {
    let payload = workflow.latest_payload(portal_run_id).await?;
    let sample_id = payload.pointer("/data/inputs/sampleName")
        .and_then(|name| name.as_str())
        .ok_or(StagingError::MissingSampleName)?
        .to_string();
    let outputs = files.list_run_files(portal_run_id).await?;
    info!("Looking for {sample_id} result files among {} outputs of {portal_run_id}", outputs.len());

    let mut data_files = BTreeMap::new();
    for data_type in DataType::RESULT_FILES {
        let Some(pattern) = data_type.source_pattern() else { continue };
        let file = find(&outputs, &pattern.replace("{sample}", &sample_id))
            .ok_or_else(|| StagingError::MissingFile { key: data_type.key(), sample_id: sample_id.clone() })?;
        data_files.insert(data_type.key().to_string(), file.uri());
    }

    let samplesheet = find(&outputs, SAMPLESHEET_PATTERN)
        .ok_or_else(|| StagingError::MissingFile { key: SAMPLESHEET_URI, sample_id: sample_id.clone() })?;
    data_files.insert(SAMPLESHEET_URI.to_string(), samplesheet.uri());

    Ok(DataFiles { data_files })
}
