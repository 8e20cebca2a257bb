use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::pieriandx::case::{MedicalRecordNumber, Physician};
use crate::pieriandx::literals::{Ethnicity, Gender, Race, SampleType};
use crate::pieriandx::timestamp::Timestamp;

/// Canonical description of one case, before it is encoded for the vendor
///
/// Exactly one identity group is present and it is selected by `isIdentified`. The JSON form
/// is flat (both groups are optional keys), decoding rejects any mix of the two.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CaseMetadataRecord", into = "CaseMetadataRecord")]
pub struct CaseMetadata {
    pub case_accession_number: String,
    pub external_specimen_id: String,
    pub sample_type: SampleType,
    pub specimen_label: String,
    pub indication: Option<String>,
    pub disease_code: u64,
    pub specimen_code: u64,
    pub sample_reception: SampleReception,
    pub gender: Option<Gender>,
    pub ethnicity: Option<Ethnicity>,
    pub race: Option<Race>,
    pub identity: Identity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleReception {
    pub date_accessioned: Timestamp,
    pub date_collected: Timestamp,
    pub date_received: Timestamp,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Identity {
    /// Consent to share patient details: placeholders, a medical record number, and a physician
    Identified {
        patient_information: PatientInformation,
        medical_record_numbers: MedicalRecordNumber,
        requesting_physician: Physician,
    },
    /// Study pseudonyms only
    DeIdentified { study: Study },
}

impl Identity {
    pub fn is_identified(&self) -> bool {
        matches!(self, Identity::Identified { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientInformation {
    #[serde(serialize_with = "date_only")]
    pub date_of_birth: Timestamp,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Study {
    pub id: String,
    pub subject_identifier: String,
}

fn date_only<S: Serializer>(timestamp: &Timestamp, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&timestamp.date_label())
}

/// SNOMED-CT codes arrive as integers or numeric strings
pub(crate) fn snomed_code<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64().ok_or_else(|| serde::de::Error::custom(format!("invalid SNOMED-CT code {n}"))),
        Value::String(s) => s.trim().parse().map_err(|_| serde::de::Error::custom(format!("invalid SNOMED-CT code {s:?}"))),
        other => Err(serde::de::Error::custom(format!("invalid SNOMED-CT code {other}"))),
    }
}

pub(crate) fn optional_snomed_code<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => snomed_code(value).map(Some).map_err(serde::de::Error::custom),
    }
}

/// Flat JSON shape of [CaseMetadata]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaseMetadataRecord {
    #[serde(default)]
    is_identified: bool,
    case_accession_number: String,
    external_specimen_id: String,
    sample_type: SampleType,
    specimen_label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    indication: Option<String>,
    #[serde(deserialize_with = "snomed_code")]
    disease_code: u64,
    #[serde(deserialize_with = "snomed_code")]
    specimen_code: u64,
    sample_reception: SampleReception,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ethnicity: Option<Ethnicity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    race: Option<Race>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    study: Option<Study>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    patient_information: Option<PatientInformation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    medical_record_numbers: Option<MedicalRecordNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    requesting_physician: Option<Physician>,
}

impl TryFrom<CaseMetadataRecord> for CaseMetadata {
    type Error = String;

    fn try_from(record: CaseMetadataRecord) -> Result<Self, Self::Error> {
        let identity = if record.is_identified {
            if record.study.is_some() {
                return Err("identified case metadata must not carry a study".to_string());
            }
            match (record.patient_information, record.medical_record_numbers, record.requesting_physician) {
                (Some(patient_information), Some(medical_record_numbers), Some(requesting_physician)) =>
                    Identity::Identified { patient_information, medical_record_numbers, requesting_physician },
                _ => return Err("identified case metadata needs patientInformation, medicalRecordNumbers, and requestingPhysician".to_string()),
            }
        } else {
            if record.patient_information.is_some() || record.medical_record_numbers.is_some() || record.requesting_physician.is_some() {
                return Err("de-identified case metadata must not carry patient details".to_string());
            }
            let study = record.study.ok_or("de-identified case metadata needs a study")?;
            Identity::DeIdentified { study }
        };

        Ok(CaseMetadata {
            case_accession_number: record.case_accession_number,
            external_specimen_id: record.external_specimen_id,
            sample_type: record.sample_type,
            specimen_label: record.specimen_label,
            indication: record.indication,
            disease_code: record.disease_code,
            specimen_code: record.specimen_code,
            sample_reception: record.sample_reception,
            gender: record.gender,
            ethnicity: record.ethnicity,
            race: record.race,
            identity,
        })
    }
}

impl From<CaseMetadata> for CaseMetadataRecord {
    fn from(metadata: CaseMetadata) -> Self {
        let mut record = CaseMetadataRecord {
            is_identified: metadata.identity.is_identified(),
            case_accession_number: metadata.case_accession_number,
            external_specimen_id: metadata.external_specimen_id,
            sample_type: metadata.sample_type,
            specimen_label: metadata.specimen_label,
            indication: metadata.indication,
            disease_code: metadata.disease_code,
            specimen_code: metadata.specimen_code,
            sample_reception: metadata.sample_reception,
            gender: metadata.gender,
            ethnicity: metadata.ethnicity,
            race: metadata.race,
            study: None,
            patient_information: None,
            medical_record_numbers: None,
            requesting_physician: None,
        };
        match metadata.identity {
            Identity::Identified { patient_information, medical_record_numbers, requesting_physician } => {
                record.patient_information = Some(patient_information);
                record.medical_record_numbers = Some(medical_record_numbers);
                record.requesting_physician = Some(requesting_physician);
            }
            Identity::DeIdentified { study } => record.study = Some(study),
        }
        record
    }
}
