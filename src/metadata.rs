//! Case metadata: the canonical description of a case and where its values come from
//!
//! A case is described once, in a vendor-neutral shape ([CaseMetadata]), and only encoded into
//! the vendor's wire format later. Values are resolved from redcap overrides, the workflow event,
//! the library record in the metadata service, and fixed fallbacks, in that order.

/// Canonical case metadata and its JSON form
pub mod case_metadata;
/// Assemble case metadata for a library, including accession number allocation
pub mod assemble;
/// Pick the single library a workflow run is about
pub mod library;
/// Per-project defaults (panel, sample type, consent, disease code)
pub mod project;

pub use assemble::{Assembler, AssemblyError, CaseMetadataEvent, RedcapData};
pub use case_metadata::{CaseMetadata, Identity, PatientInformation, SampleReception, Study};
pub use library::{select_library, LibraryError};
pub use project::{ProjectError, ProjectInfo, ProjectTable, ProjectTags};
