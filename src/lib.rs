//! Bridge between the sequencing platform and the PierianDx clinical genomics workspace
//!
//! Handlers assemble case metadata, build vendor payloads from a run's sample sheet, stage result
//! files in the vendor's landing zone, and poll informatics jobs until a report is ready. Each
//! handler is a function of one JSON event and its collaborators.

/// Command line and environment configuration
pub mod config;
/// Handler entry points
pub mod handler;
/// SNOMED-CT code labels
pub mod lookup;
/// Canonical case metadata and its assembly
pub mod metadata;
/// Deployment namespaces
pub mod namespace;
/// Vendor objects built from a sample sheet
pub mod objects;
/// PierianDx wire model and API client
pub mod pieriandx;
/// Reading and validating events
pub mod request;
/// Illumina v2 sample sheets
pub mod samplesheet;
/// Collaborator services
pub mod services;
/// Result file discovery and upload
pub mod staging;
/// Informatics job and report status
pub mod status;
