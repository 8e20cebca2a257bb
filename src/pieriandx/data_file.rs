use serde::{Deserialize, Serialize};

use crate::pieriandx::literals::DataType;

/// Subpath under a sequencer run where the vendor looks for per-sample results
pub const BASECALLS_PATH: &str = "Data/Intensities/BaseCalls";
pub const SAMPLESHEET_NAME: &str = "SampleSheet.csv";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    /// Copy an existing object
    Uri(String),
    /// Write these bytes as-is
    Contents(String),
}

/// A file to place in the landing zone for one sample of a sequencer run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFile {
    pub sequencerrun_path_root: String,
    pub data_type: DataType,
    pub sample_id: String,
    pub source: DataSource,
}

impl DataFile {
    pub fn needs_decompression(&self) -> bool {
        matches!(&self.source, DataSource::Uri(uri) if uri.ends_with(".gz"))
    }

    pub fn destination_uri(&self) -> String {
        let root = self.sequencerrun_path_root.trim_end_matches('/');
        match self.data_type.destination_suffix() {
            Some(suffix) => format!("{root}/{BASECALLS_PATH}/{}{suffix}", self.sample_id),
            None => format!("{root}/{SAMPLESHEET_NAME}"),
        }
    }

    pub fn transfer(&self) -> DataFileTransfer {
        let (src_uri, contents) = match &self.source {
            DataSource::Uri(uri) => (Some(uri.clone()), None),
            DataSource::Contents(contents) => (None, Some(contents.clone())),
        };
        DataFileTransfer {
            src_uri,
            dest_uri: self.destination_uri(),
            needs_decompression: self.needs_decompression(),
            contents,
        }
    }
}

/// Manifest entry handed to the upload step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataFileTransfer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src_uri: Option<String>,
    pub dest_uri: String,
    #[serde(default)]
    pub needs_decompression: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contents: Option<String>,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    const RUN_ROOT: &str = "s3://pdx-cgwxfer-test/melbournetest/241024_A00130_0336_BHW7MVDSXC__L2400161_001/";

    fn data_file(data_type: DataType, source: DataSource) -> DataFile {
        DataFile {
            sequencerrun_path_root: RUN_ROOT.to_string(),
            data_type,
            sample_id: "L2400161".to_string(),
            source,
        }
    }

    #[test]
    fn result_files_go_under_basecalls() {
        let cnv = data_file(DataType::CnvVcf, DataSource::Uri("s3://bucket/Results/L2400161/L2400161.cnv.vcf.gz".to_string()));
        assert_eq!(cnv.destination_uri(),
                   "s3://pdx-cgwxfer-test/melbournetest/241024_A00130_0336_BHW7MVDSXC__L2400161_001/Data/Intensities/BaseCalls/L2400161.cnv.vcf");
        assert!(cnv.needs_decompression());

        let fusions = data_file(DataType::Fusions, DataSource::Uri("s3://bucket/Results/L2400161/L2400161_Fusions.csv".to_string()));
        assert!(fusions.destination_uri().ends_with("/Data/Intensities/BaseCalls/L2400161_Fusions.csv"));
        assert!(!fusions.needs_decompression());
    }

    #[test]
    fn samplesheet_goes_to_run_root() {
        let samplesheet = data_file(DataType::SamplesheetContents, DataSource::Contents("[Header]\n".to_string()));
        assert_eq!(samplesheet.destination_uri(),
                   "s3://pdx-cgwxfer-test/melbournetest/241024_A00130_0336_BHW7MVDSXC__L2400161_001/SampleSheet.csv");
        assert!(!samplesheet.needs_decompression());
    }

    #[test]
    fn transfer_exposes_only_set_fields() {
        let samplesheet = data_file(DataType::SamplesheetContents, DataSource::Contents("[Header]\n".to_string()));
        assert_eq!(serde_json::to_value(samplesheet.transfer()).unwrap(), json!({
            "destUri": "s3://pdx-cgwxfer-test/melbournetest/241024_A00130_0336_BHW7MVDSXC__L2400161_001/SampleSheet.csv",
            "needsDecompression": false,
            "contents": "[Header]\n"
        }));
    }
}
