//! PierianDx clinical genomics workspace (CGW)
//!
//! Everything that has to look exactly the way the vendor API expects lives here: the wire
//! structs for case, sequencer run, and informatics job creation, the data file manifest entries,
//! the vendor vocabularies, timestamp rendering, and the HTTP client itself.

/// Vendor vocabularies (sample types, demographics, result file kinds)
pub mod literals;
/// Timestamps rendered with second precision and a `+HHMM` offset
pub mod timestamp;
/// Case creation payloads, identified and de-identified
pub mod case;
/// Sequencer run and informatics job payloads
pub mod sequencer;
/// Files staged into the landing zone
pub mod data_file;
/// CGW REST API
pub mod client;

pub use case::{CaseCreation, Dag};
pub use client::{PierianDx, PierianDxClient, VendorError};
pub use data_file::{DataFile, DataFileTransfer};
pub use sequencer::{InformaticsjobCreation, SequencerrunCreation, SpecimenSequencerInfo};
pub use timestamp::Timestamp;
