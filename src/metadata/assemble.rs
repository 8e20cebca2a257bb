use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;
use log::{info, warn};
use serde::Deserialize;

use crate::metadata::case_metadata::{optional_snomed_code, CaseMetadata, Identity, PatientInformation, SampleReception, Study};
use crate::pieriandx::case::{MedicalFacility, MedicalRecordNumber, Physician};
use crate::pieriandx::client::{PierianDx, VendorError};
use crate::pieriandx::literals::SampleType;
use crate::pieriandx::timestamp::Timestamp;
use crate::services::{MetadataService, ServiceError};

const DEFAULT_SPECIMEN_LABEL: &str = "primarySpecimen";
const DEFAULT_INDICATION: &str = "NA";
/// Blood specimen from patient
const DEFAULT_SPECIMEN_CODE: u64 = 122561005;
const DEFAULT_HOSPITAL_NUMBER: &str = "99";
const DEFAULT_FACILITY: &str = "Not Available";
const DEFAULT_PHYSICIAN_FIRST_NAME: &str = "Sean";
const DEFAULT_PHYSICIAN_LAST_NAME: &str = "Grimmond";
const PLACEHOLDER_LAST_NAME: &str = "Doe";

pub const DEFAULT_MAX_ACCESSION_ATTEMPTS: u32 = 999;

#[derive(Debug, thiserror::Error)]
pub enum AssemblyError {
    #[error("can't fetch library: {0}")]
    Library(#[from] ServiceError),
    #[error(transparent)]
    Vendor(#[from] VendorError),
    #[error("no free accession number for {library_id} after {attempts} attempts")]
    AccessionProbeExhausted { library_id: String, attempts: u32 },
    #[error("library {0} has no projects")]
    NoProject(String),
    #[error("no sample type in the event or redcap data")]
    MissingSampleType,
    #[error("no disease code in the event or redcap data")]
    MissingDiseaseCode,
}

/// Values supplied by redcap, these take priority over the event
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RedcapData {
    #[serde(default, rename = "sampleType")]
    pub sample_type: Option<SampleType>,
    #[serde(default, rename = "dateAccessioned")]
    pub date_accessioned: Option<Timestamp>,
    #[serde(default, rename = "dateCollected")]
    pub date_collected: Option<Timestamp>,
    #[serde(default, rename = "dateReceived")]
    pub date_received: Option<Timestamp>,
    #[serde(default, rename = "diseaseId", deserialize_with = "optional_snomed_code")]
    pub disease_id: Option<u64>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub requesting_physician_first_name: Option<String>,
    #[serde(default)]
    pub requesting_physician_last_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseMetadataEvent {
    pub library_id: String,
    #[serde(default)]
    pub redcap_data: Option<RedcapData>,
    #[serde(default)]
    pub sample_type: Option<SampleType>,
    #[serde(default)]
    pub specimen_label: Option<String>,
    #[serde(default)]
    pub indication: Option<String>,
    #[serde(default, deserialize_with = "optional_snomed_code")]
    pub specimen_code: Option<u64>,
    #[serde(default, deserialize_with = "optional_snomed_code")]
    pub default_snomed_disease_code: Option<u64>,
    #[serde(default)]
    pub is_identified: Option<bool>,
}

/// Builds [CaseMetadata] for one library
pub struct Assembler<'a, M, P> {
    metadata: &'a M,
    vendor: &'a P,
    timezone: Tz,
    max_accession_attempts: u32,
    now: DateTime<Utc>,
}

impl<'a, M: MetadataService, P: PierianDx> Assembler<'a, M, P> {
    pub fn new(metadata: &'a M, vendor: &'a P, timezone: Tz) -> Self {
        Assembler { metadata, vendor, timezone, max_accession_attempts: DEFAULT_MAX_ACCESSION_ATTEMPTS, now: Utc::now() }
    }

    pub fn max_accession_attempts(mut self, attempts: u32) -> Self {
        self.max_accession_attempts = attempts;
        self
    }

    /// Fallback for reception dates that redcap doesn't supply
    pub fn now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub async fn assemble(&self, event: &CaseMetadataEvent) -> Result<CaseMetadata, AssemblyError> {
        let library_id = &event.library_id;
        info!("Assembling case metadata for library {library_id}");
        let redcap = event.redcap_data.clone().unwrap_or_default();

        let library = self.metadata.library(library_id).await?;
        let external_subject_id = library.subject.subject_id;
        let project_id = library.project_set.first()
            .map(|project| project.project_id.clone())
            .ok_or_else(|| AssemblyError::NoProject(library_id.clone()))?;

        let sample_type = redcap.sample_type.or(event.sample_type).ok_or(AssemblyError::MissingSampleType)?;
        let disease_code = redcap.disease_id.or(event.default_snomed_disease_code).ok_or(AssemblyError::MissingDiseaseCode)?;

        let now = Timestamp::in_timezone(self.now, &self.timezone);
        let reception_date = |date: &Option<Timestamp>| date.map_or(now, |date| date.to_timezone(&self.timezone));
        let sample_reception = SampleReception {
            date_accessioned: reception_date(&redcap.date_accessioned),
            date_collected: reception_date(&redcap.date_collected),
            date_received: reception_date(&redcap.date_received),
        };

        let identity = if event.is_identified.unwrap_or(false) {
            identified(&redcap, &external_subject_id)
        } else {
            Identity::DeIdentified { study: Study { id: project_id, subject_identifier: external_subject_id } }
        };

        let case_accession_number = self.allocate_accession_number(library_id).await?;

        Ok(CaseMetadata {
            case_accession_number,
            external_specimen_id: library.sample.external_sample_id,
            sample_type,
            specimen_label: event.specimen_label.clone().unwrap_or_else(|| DEFAULT_SPECIMEN_LABEL.to_string()),
            indication: Some(event.indication.clone().unwrap_or_else(|| DEFAULT_INDICATION.to_string())),
            disease_code,
            specimen_code: event.specimen_code.unwrap_or(DEFAULT_SPECIMEN_CODE),
            sample_reception,
            gender: None,
            ethnicity: None,
            race: None,
            identity,
        })
    }

    /// First `{library_id}_NNN` the vendor doesn't know about, counting from 001
    pub async fn allocate_accession_number(&self, library_id: &str) -> Result<String, AssemblyError> {
        for counter in 1..=self.max_accession_attempts {
            let accession_number = format!("{library_id}_{counter:03}");
            if !self.vendor.case_exists(&accession_number).await? {
                info!("Allocated accession number {accession_number}");
                return Ok(accession_number);
            }
            info!("Accession number {accession_number} is taken");
        }
        warn!("Gave up allocating an accession number for {library_id}");
        Err(AssemblyError::AccessionProbeExhausted { library_id: library_id.to_string(), attempts: self.max_accession_attempts })
    }
}

/// Real patient details never reach this service, identified cases carry placeholders born 1970-01-01
fn identified(redcap: &RedcapData, external_subject_id: &str) -> Identity {
    let first_name = match redcap.gender.as_deref() {
        Some("female") => "Jane",
        _ => "John",
    };
    Identity::Identified {
        patient_information: PatientInformation {
            date_of_birth: Timestamp::Naive(NaiveDateTime::default()),
            first_name: first_name.to_string(),
            last_name: PLACEHOLDER_LAST_NAME.to_string(),
        },
        medical_record_numbers: MedicalRecordNumber {
            mrn: external_subject_id.to_string(),
            medical_facility: MedicalFacility {
                facility: Some(DEFAULT_FACILITY.to_string()),
                hospital_number: Some(DEFAULT_HOSPITAL_NUMBER.to_string()),
            },
        },
        requesting_physician: Physician {
            first_name: redcap.requesting_physician_first_name.clone()
                .unwrap_or_else(|| DEFAULT_PHYSICIAN_FIRST_NAME.to_string()),
            last_name: redcap.requesting_physician_last_name.clone()
                .unwrap_or_else(|| DEFAULT_PHYSICIAN_LAST_NAME.to_string()),
        },
    }
}
