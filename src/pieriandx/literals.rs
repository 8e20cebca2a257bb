use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Case sample type. Accepted in any letter case, always emitted lower case
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum SampleType {
    Patientcare,
    ClinicalTrial,
    Validation,
    ProficiencyTesting,
}

impl FromStr for SampleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "patientcare" => Ok(SampleType::Patientcare),
            "clinical_trial" => Ok(SampleType::ClinicalTrial),
            "validation" => Ok(SampleType::Validation),
            "proficiency_testing" => Ok(SampleType::ProficiencyTesting),
            _ => Err(format!("unknown sample type {s}")),
        }
    }
}

impl TryFrom<String> for SampleType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for SampleType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SampleType::Patientcare => write!(f, "patientcare"),
            SampleType::ClinicalTrial => write!(f, "clinical_trial"),
            SampleType::Validation => write!(f, "validation"),
            SampleType::ProficiencyTesting => write!(f, "proficiency_testing"),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SequencingType {
    PairedEnd,
    SingleEnd,
}

/// Sample type column of a sample sheet row; the vendor only knows DNA
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SequencingSampleType {
    #[serde(rename = "DNA")]
    Dna,
}

impl FromStr for SequencingSampleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DNA" => Ok(SequencingSampleType::Dna),
            _ => Err(format!("unsupported sequencing sample type {s}")),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Unknown,
    Male,
    Female,
    Unspecified,
    Other,
    Ambiguous,
    NotApplicable,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ethnicity {
    HispanicOrLatino,
    NotHispanicOrLatino,
    NotReported,
    Unknown,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Race {
    AmericanIndianOrAlaskaNative,
    Asian,
    BlackOrAfricanAmerican,
    NativeHawaiianOrOtherPacificIslander,
    NotReported,
    Unknown,
    White,
}

/// Result file kinds the vendor ingests, keyed the way the workflow payload names them
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DataType {
    #[serde(rename = "microsatOutputUri")]
    MicrosatOutput,
    #[serde(rename = "geneCovReportUri")]
    GeneCovReport,
    #[serde(rename = "exonCovReportUri")]
    ExonCovReport,
    #[serde(rename = "tmbMetricsUri")]
    TmbMetrics,
    #[serde(rename = "cnvVcfUri")]
    CnvVcf,
    #[serde(rename = "hardFilteredVcfUri")]
    HardFilteredVcf,
    #[serde(rename = "fusionsUri")]
    Fusions,
    #[serde(rename = "metricsOutputUri")]
    MetricsOutput,
    #[serde(rename = "samplesheetContents")]
    SamplesheetContents,
}

impl DataType {
    /// Every result file type, in the order they are discovered
    pub const RESULT_FILES: [DataType; 8] = [
        DataType::MicrosatOutput,
        DataType::GeneCovReport,
        DataType::ExonCovReport,
        DataType::TmbMetrics,
        DataType::CnvVcf,
        DataType::HardFilteredVcf,
        DataType::Fusions,
        DataType::MetricsOutput,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            DataType::MicrosatOutput => "microsatOutputUri",
            DataType::GeneCovReport => "geneCovReportUri",
            DataType::ExonCovReport => "exonCovReportUri",
            DataType::TmbMetrics => "tmbMetricsUri",
            DataType::CnvVcf => "cnvVcfUri",
            DataType::HardFilteredVcf => "hardFilteredVcfUri",
            DataType::Fusions => "fusionsUri",
            DataType::MetricsOutput => "metricsOutputUri",
            DataType::SamplesheetContents => "samplesheetContents",
        }
    }

    /// File name suffix appended to the sample id in the landing zone.
    ///
    /// The sample sheet has no suffix, it is written to the run root as `SampleSheet.csv`.
    pub fn destination_suffix(&self) -> Option<&'static str> {
        match self {
            DataType::MicrosatOutput => Some(".microsat_output.json"),
            DataType::GeneCovReport => Some(".gene_cov_report.tsv"),
            DataType::ExonCovReport => Some(".exon_cov_report.tsv"),
            DataType::TmbMetrics => Some(".tmb.metrics.csv"),
            DataType::CnvVcf => Some(".cnv.vcf"),
            DataType::HardFilteredVcf => Some(".hard-filtered.vcf"),
            DataType::Fusions => Some("_Fusions.csv"),
            DataType::MetricsOutput => Some("_MetricsOutput.tsv"),
            DataType::SamplesheetContents => None,
        }
    }

    /// Location of the file under a TSO500 ctDNA output directory, `{sample}` is the sample id
    pub fn source_pattern(&self) -> Option<&'static str> {
        match self {
            DataType::MicrosatOutput => Some("Logs_Intermediates/DragenCaller/{sample}/{sample}.microsat_output.json"),
            DataType::GeneCovReport => Some("Results/{sample}/{sample}.gene_cov_report.tsv"),
            DataType::ExonCovReport => Some("Results/{sample}/{sample}.exon_cov_report.tsv"),
            DataType::TmbMetrics => Some("Logs_Intermediates/Tmb/{sample}/{sample}.tmb.metrics.csv"),
            DataType::CnvVcf => Some("Results/{sample}/{sample}.cnv.vcf.gz"),
            DataType::HardFilteredVcf => Some("Results/{sample}/{sample}.hard-filtered.vcf.gz"),
            DataType::Fusions => Some("Results/{sample}/{sample}_Fusions.csv"),
            DataType::MetricsOutput => Some("Results/{sample}/{sample}_MetricsOutput.tsv"),
            DataType::SamplesheetContents => None,
        }
    }
}

impl FromStr for DataType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(serde_json::Value::String(s.to_string()))
            .map_err(|_| format!("unknown data file type {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_type_is_case_insensitive() {
        let sample_type: SampleType = serde_json::from_str("\"PatientCare\"").unwrap();
        assert_eq!(sample_type, SampleType::Patientcare);
        assert_eq!(serde_json::to_string(&sample_type).unwrap(), "\"patientcare\"");
        assert_eq!(serde_json::to_string(&SampleType::ClinicalTrial).unwrap(), "\"clinical_trial\"");
        assert!("research".parse::<SampleType>().is_err());
    }

    #[test]
    fn data_type_keys_round_trip() {
        for data_type in DataType::RESULT_FILES {
            assert_eq!(data_type.key().parse::<DataType>().unwrap(), data_type);
            assert!(data_type.destination_suffix().is_some());
            assert!(data_type.source_pattern().is_some());
        }
        assert!("samplesheetUri".parse::<DataType>().is_err());
    }
}
