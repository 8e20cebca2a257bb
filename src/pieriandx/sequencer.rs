use serde::Serialize;

use crate::pieriandx::literals::{SequencingSampleType, SequencingType};

/// One sample of a sequencer run. The sequencer run and the informatics job payloads both
/// describe it, each with a slightly different set of fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecimenSequencerInfo {
    pub run_id: String,
    pub case_accession_number: String,
    pub barcode: String,
    pub lane: u32,
    pub sample_id: String,
    pub sample_type: SequencingSampleType,
}

/// Projection used inside a sequencer run, no run id
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SequencerRunSpecimen {
    pub accession_number: String,
    pub barcode: String,
    pub lane: String,
    pub sample_id: String,
    pub sample_type: SequencingSampleType,
}

/// Projection used inside an informatics job, no accession number
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SequencerRunInfo {
    pub run_id: String,
    pub barcode: String,
    pub lane: String,
    pub sample_id: String,
    pub sample_type: SequencingSampleType,
}

impl SpecimenSequencerInfo {
    pub fn sequencer_run_specimen(&self) -> SequencerRunSpecimen {
        SequencerRunSpecimen {
            accession_number: self.case_accession_number.clone(),
            barcode: self.barcode.clone(),
            lane: self.lane.to_string(),
            sample_id: self.sample_id.clone(),
            sample_type: self.sample_type,
        }
    }

    pub fn sequencer_run_info(&self) -> SequencerRunInfo {
        SequencerRunInfo {
            run_id: self.run_id.clone(),
            barcode: self.barcode.clone(),
            lane: self.lane.to_string(),
            sample_id: self.sample_id.clone(),
            sample_type: self.sample_type,
        }
    }
}

/// Body of `POST /sequencerRun`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SequencerrunCreation {
    pub run_id: String,
    pub specimens: Vec<SequencerRunSpecimen>,
    #[serde(rename = "type")]
    pub sequencing_type: SequencingType,
}

impl SequencerrunCreation {
    pub fn new(info: &SpecimenSequencerInfo, sequencing_type: SequencingType) -> Self {
        SequencerrunCreation {
            run_id: info.run_id.clone(),
            specimens: vec![info.sequencer_run_specimen()],
            sequencing_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InformaticsjobInput {
    pub accession_number: String,
    pub sequencer_run_infos: Vec<SequencerRunInfo>,
}

/// Body of `POST /case/{caseId}/informaticsJobs`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InformaticsjobCreation {
    pub input: Vec<InformaticsjobInput>,
}

impl InformaticsjobCreation {
    pub fn new(accession_number: &str, runs: Vec<SequencerRunInfo>) -> Self {
        InformaticsjobCreation {
            input: vec![InformaticsjobInput {
                accession_number: accession_number.to_string(),
                sequencer_run_infos: runs,
            }],
        }
    }

    pub fn from_specimen(info: &SpecimenSequencerInfo) -> Self {
        Self::new(&info.case_accession_number, vec![info.sequencer_run_info()])
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn info() -> SpecimenSequencerInfo {
        SpecimenSequencerInfo {
            run_id: "241024_A00130_0336_BHW7MVDSXC__L2400161_001".to_string(),
            case_accession_number: "L2400161_001".to_string(),
            barcode: "GAATCCGA-TTCGCAAG".to_string(),
            lane: 1,
            sample_id: "L2400161".to_string(),
            sample_type: SequencingSampleType::Dna,
        }
    }

    #[test]
    fn sequencer_run_drops_run_id_from_specimens() {
        let run = serde_json::to_value(SequencerrunCreation::new(&info(), SequencingType::PairedEnd)).unwrap();
        assert_eq!(run, json!({
            "runId": "241024_A00130_0336_BHW7MVDSXC__L2400161_001",
            "specimens": [{
                "accessionNumber": "L2400161_001",
                "barcode": "GAATCCGA-TTCGCAAG",
                "lane": "1",
                "sampleId": "L2400161",
                "sampleType": "DNA"
            }],
            "type": "pairedEnd"
        }));
    }

    #[test]
    fn informatics_job_keeps_accession_at_input_level_only() {
        let job = serde_json::to_value(InformaticsjobCreation::from_specimen(&info())).unwrap();
        assert_eq!(job, json!({
            "input": [{
                "accessionNumber": "L2400161_001",
                "sequencerRunInfos": [{
                    "runId": "241024_A00130_0336_BHW7MVDSXC__L2400161_001",
                    "barcode": "GAATCCGA-TTCGCAAG",
                    "lane": "1",
                    "sampleId": "L2400161",
                    "sampleType": "DNA"
                }]
            }]
        }));
    }
}
