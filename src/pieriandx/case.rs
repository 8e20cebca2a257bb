use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::lookup::{CodeLookup, LookupError};
use crate::metadata::{CaseMetadata, Identity};
use crate::pieriandx::literals::{Ethnicity, Gender, Race, SampleType};
use crate::pieriandx::timestamp::Timestamp;

/// Workflow (DAG) the vendor runs for the case, flattened into `dagName` and `dagDescription`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Dag {
    pub name: String,
    pub description: String,
}

/// SNOMED-CT code as a string, next to its label
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeLabel {
    pub code: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Physician {
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalFacility {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facility: Option<String>,
    #[serde(default, deserialize_with = "hospital_number", skip_serializing_if = "Option::is_none")]
    pub hospital_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalRecordNumber {
    pub mrn: String,
    pub medical_facility: MedicalFacility,
}

/// Hospital numbers are sometimes sent as integers, the vendor only takes strings
fn hospital_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!("invalid hospital number {other}"))),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SpecimenIdentity {
    #[serde(rename_all = "camelCase")]
    Identified {
        first_name: String,
        last_name: String,
        date_of_birth: String,
        medical_record_numbers: Vec<MedicalRecordNumber>,
    },
    #[serde(rename_all = "camelCase")]
    DeIdentified {
        study_identifier: String,
        study_subject_identifier: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Specimen {
    pub accession_number: String,
    pub date_accessioned: Timestamp,
    pub date_received: Timestamp,
    /// The vendor API spells this one in lower case
    #[serde(rename = "datecollected")]
    pub date_collected: Timestamp,
    pub external_specimen_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub specimen_type: CodeLabel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ethnicity: Option<Ethnicity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub race: Option<Race>,
    #[serde(flatten)]
    pub identity: SpecimenIdentity,
}

/// Body of `POST /case`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseCreation {
    pub dag_name: String,
    pub dag_description: String,
    pub disease: CodeLabel,
    pub identified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indication: Option<String>,
    pub panel_name: String,
    pub sample_type: SampleType,
    pub specimens: Vec<Specimen>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub physicians: Option<Vec<Physician>>,
}

impl CaseCreation {
    /// Encode canonical metadata for the vendor. Both codes must resolve to exactly one label,
    /// otherwise nothing is produced
    pub fn encode<L: CodeLookup>(metadata: &CaseMetadata, dag: &Dag, panel_name: &str, lookup: &L) -> Result<CaseCreation, LookupError> {
        let disease = CodeLabel {
            code: metadata.disease_code.to_string(),
            label: lookup.disease_label(metadata.disease_code)?,
        };
        let specimen_type = CodeLabel {
            code: metadata.specimen_code.to_string(),
            label: lookup.specimen_label(metadata.specimen_code)?,
        };

        let (identity, physicians) = match &metadata.identity {
            Identity::Identified { patient_information, medical_record_numbers, requesting_physician } => (
                SpecimenIdentity::Identified {
                    first_name: patient_information.first_name.clone(),
                    last_name: patient_information.last_name.clone(),
                    date_of_birth: patient_information.date_of_birth.date_label(),
                    medical_record_numbers: vec![medical_record_numbers.clone()],
                },
                Some(vec![requesting_physician.clone()]),
            ),
            Identity::DeIdentified { study } => (
                SpecimenIdentity::DeIdentified {
                    study_identifier: study.id.clone(),
                    study_subject_identifier: study.subject_identifier.clone(),
                },
                None,
            ),
        };

        let reception = &metadata.sample_reception;
        let specimen = Specimen {
            accession_number: metadata.case_accession_number.clone(),
            date_accessioned: reception.date_accessioned,
            date_received: reception.date_received,
            date_collected: reception.date_collected,
            external_specimen_id: metadata.external_specimen_id.clone(),
            name: metadata.specimen_label.clone(),
            specimen_type,
            gender: metadata.gender,
            ethnicity: metadata.ethnicity,
            race: metadata.race,
            identity,
        };

        Ok(CaseCreation {
            dag_name: dag.name.clone(),
            dag_description: dag.description.clone(),
            disease,
            identified: metadata.identity.is_identified(),
            indication: metadata.indication.clone(),
            panel_name: panel_name.to_string(),
            sample_type: metadata.sample_type,
            specimens: vec![specimen],
            physicians,
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    use crate::lookup::{SnomedLookup, SnomedTable};

    use super::*;

    fn lookup() -> SnomedLookup {
        SnomedLookup::new(
            SnomedTable::from_rows(SnomedTable::DISEASE, [(64572001, "Disease")]),
            SnomedTable::from_rows(SnomedTable::SPECIMEN_TYPE, [(122561005, "Blood specimen from patient")]),
        )
    }

    fn dag() -> Dag {
        Dag { name: "cromwell_tso500_ctdna_workflow_1.0.4".to_string(), description: "tso500_ctdna_workflow".to_string() }
    }

    fn metadata(identified: bool) -> CaseMetadata {
        let mut value = json!({
            "isIdentified": identified,
            "caseAccessionNumber": "L2400161_001",
            "externalSpecimenId": "PRJ240003",
            "sampleType": "patientcare",
            "specimenLabel": "primarySpecimen",
            "diseaseCode": 64572001,
            "specimenCode": 122561005,
            "sampleReception": {
                "dateAccessioned": "2025-09-25T16:35:48+1000",
                "dateCollected": "2025-09-24T09:00:00+10:00",
                "dateReceived": "2025-09-25T06:35:48Z"
            }
        });
        let fields = value.as_object_mut().unwrap();
        if identified {
            fields.insert("patientInformation".into(), json!({"dateOfBirth": "1970-01-01", "firstName": "John", "lastName": "Doe"}));
            fields.insert("medicalRecordNumbers".into(), json!({"mrn": "SBJ04407", "medicalFacility": {"facility": "Not Available", "hospitalNumber": "99"}}));
            fields.insert("requestingPhysician".into(), json!({"firstName": "Sean", "lastName": "Grimmond"}));
        } else {
            fields.insert("study".into(), json!({"id": "PO", "subjectIdentifier": "SBJ04407"}));
        }
        serde_json::from_value(value).unwrap()
    }

    fn encode(identified: bool) -> Value {
        let case = CaseCreation::encode(&metadata(identified), &dag(), "tso500_ctDNA_vcf_workflow_university_of_melbourne", &lookup()).unwrap();
        serde_json::to_value(case).unwrap()
    }

    #[test]
    fn de_identified_case_has_study_and_no_physicians() {
        let case = encode(false);
        assert!(case.get("physicians").is_none());
        assert!(case.get("indication").is_none());
        assert_eq!(case["identified"], json!(false));
        let specimen = &case["specimens"][0];
        assert_eq!(specimen["studyIdentifier"], json!("PO"));
        assert_eq!(specimen["studySubjectIdentifier"], json!("SBJ04407"));
        assert!(specimen.get("medicalRecordNumbers").is_none());
        assert!(specimen.get("firstName").is_none());
    }

    #[test]
    fn identified_case_has_patient_and_physicians() {
        let case = encode(true);
        assert_eq!(case["physicians"], json!([{"firstName": "Sean", "lastName": "Grimmond"}]));
        let specimen = &case["specimens"][0];
        assert!(specimen.get("studyIdentifier").is_none());
        assert_eq!(specimen["dateOfBirth"], json!("1970-01-01"));
        assert_eq!(specimen["medicalRecordNumbers"], json!([
            {"mrn": "SBJ04407", "medicalFacility": {"facility": "Not Available", "hospitalNumber": "99"}}
        ]));
    }

    #[test]
    fn specimen_dates_keep_their_offsets() {
        let case = encode(false);
        let specimen = &case["specimens"][0];
        assert_eq!(specimen["dateAccessioned"], json!("2025-09-25T16:35:48+1000"));
        assert_eq!(specimen["datecollected"], json!("2025-09-24T09:00:00+1000"));
        assert_eq!(specimen["dateReceived"], json!("2025-09-25T06:35:48+0000"));
        assert!(specimen.get("dateCollected").is_none());
    }

    #[test]
    fn codes_are_strings_with_labels() {
        let case = encode(false);
        assert_eq!(case["disease"], json!({"code": "64572001", "label": "Disease"}));
        assert_eq!(case["specimens"][0]["type"], json!({"code": "122561005", "label": "Blood specimen from patient"}));
    }

    #[test]
    fn dag_is_flattened() {
        let case = encode(false);
        assert_eq!(case["dagName"], json!("cromwell_tso500_ctdna_workflow_1.0.4"));
        assert_eq!(case["dagDescription"], json!("tso500_ctdna_workflow"));
        assert!(case.get("dag").is_none());
    }

    #[test]
    fn unknown_codes_abort_encoding() {
        let mut unknown = metadata(false);
        unknown.specimen_code = 1;
        let result = CaseCreation::encode(&unknown, &dag(), "panel", &lookup());
        assert!(matches!(result, Err(LookupError::Missing { code: 1, .. })));
    }
}
