//! Staging result files into the vendor landing zone
//!
//! Discovery finds a sample's result files among the outputs of a TSO500 workflow run. Upload
//! copies one manifest entry (a source object or inline contents) into the landing zone.

/// Locate result files for a workflow run
pub mod discover;
/// Copy one manifest entry into the landing zone
pub mod upload;

use crate::services::ServiceError;

#[derive(Debug, thiserror::Error)]
pub enum StagingError {
    #[error("exactly one of srcUri and contents must be set")]
    Source,
    #[error("destination {0:?} is not an s3 uri")]
    Destination(String),
    #[error("can't decompress {uri}: {source}")]
    Decompress { uri: String, source: std::io::Error },
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error("workflow payload has no data.inputs.sampleName")]
    MissingSampleName,
    #[error("no {key} file for sample {sample_id}")]
    MissingFile { key: &'static str, sample_id: String },
}

pub use discover::{discover, DataFiles};
pub use upload::{upload, UploadedObject};
