use std::io::Read;

use flate2::read::MultiGzDecoder;
use log::info;
use serde_json::Value;
use tokio::sync::OnceCell;

use crate::services::{ObjectStore, ServiceError, StorageLocation};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("{table}: code {code} not found")]
    Missing { table: &'static str, code: u64 },
    #[error("{table}: code {code} matched {count} rows, expected exactly one")]
    Ambiguous { table: &'static str, code: u64, count: usize },
    #[error("{table}: can't read reference table: {reason}")]
    Malformed { table: &'static str, reason: String },
    #[error("can't fetch reference table: {0}")]
    Fetch(#[from] ServiceError),
}

/// Resolves SNOMED-CT codes to labels. Implemented by the cached tables, and by fixed tables in tests
pub trait CodeLookup {
    fn disease_label(&self, code: u64) -> Result<String, LookupError>;
    fn specimen_label(&self, code: u64) -> Result<String, LookupError>;
}

#[derive(Debug, Clone, PartialEq)]
struct SnomedEntry {
    code: u64,
    label: String,
}

/// One reference table: a JSON array of records with a `Code` column and a label column
#[derive(Debug, Clone)]
pub struct SnomedTable {
    name: &'static str,
    entries: Vec<SnomedEntry>,
}

impl SnomedTable {
    pub const DISEASE: &'static str = "disease tree";
    pub const SPECIMEN_TYPE: &'static str = "specimen type map";

    pub fn from_rows<I, S>(name: &'static str, rows: I) -> Self
        where I: IntoIterator<Item=(u64, S)>, S: Into<String> {
        let entries = rows.into_iter()
            .map(|(code, label)| SnomedEntry { code, label: label.into() })
            .collect();
        SnomedTable { name, entries }
    }

    /// Parse a (possibly gzipped) JSON table, reading labels from `label_column`
    pub fn from_json(name: &'static str, label_column: &str, bytes: &[u8]) -> Result<Self, LookupError> {
        let malformed = |reason: String| LookupError::Malformed { table: name, reason };

        let json = if bytes.starts_with(&GZIP_MAGIC) {
            let mut decompressed = Vec::new();
            MultiGzDecoder::new(bytes).read_to_end(&mut decompressed)
                .map_err(|err| malformed(err.to_string()))?;
            decompressed
        } else {
            bytes.to_vec()
        };

        let rows: Vec<Value> = serde_json::from_slice(&json).map_err(|err| malformed(err.to_string()))?;
        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let code = match row.get("Code") {
                Some(Value::Number(n)) => n.as_u64(),
                Some(Value::String(s)) => s.trim().parse().ok(),
                _ => None,
            }.ok_or_else(|| malformed(format!("row without a numeric Code: {row}")))?;
            let label = row.get(label_column)
                .and_then(Value::as_str)
                .ok_or_else(|| malformed(format!("row without {label_column}: {row}")))?;
            entries.push(SnomedEntry { code, label: label.to_string() });
        }

        info!("Loaded {} rows from SNOMED-CT {}", entries.len(), name);
        Ok(SnomedTable { name, entries })
    }

    /// Exactly one row must match, anything else is a data error
    pub fn label(&self, code: u64) -> Result<&str, LookupError> {
        let matches: Vec<&SnomedEntry> = self.entries.iter().filter(|e| e.code == code).collect();
        match matches.as_slice() {
            [entry] => Ok(&entry.label),
            [] => Err(LookupError::Missing { table: self.name, code }),
            _ => Err(LookupError::Ambiguous { table: self.name, code, count: matches.len() }),
        }
    }
}

/// The disease tree and specimen type map together
#[derive(Debug, Clone)]
pub struct SnomedLookup {
    disease: SnomedTable,
    specimen: SnomedTable,
}

static SNOMED_LOOKUP: OnceCell<SnomedLookup> = OnceCell::const_new();

impl SnomedLookup {
    pub fn new(disease: SnomedTable, specimen: SnomedTable) -> Self {
        SnomedLookup { disease, specimen }
    }

    /// Fetch both tables the first time this is called, then hand out the same instance
    pub async fn cached<S: ObjectStore>(store: &S, disease: &StorageLocation, specimen: &StorageLocation)
        -> Result<&'static SnomedLookup, LookupError> {
        SNOMED_LOOKUP.get_or_try_init(|| async {
            info!("Loading SNOMED-CT reference tables");
            let disease_bytes = store.fetch(disease).await?;
            let specimen_bytes = store.fetch(specimen).await?;
            Ok(SnomedLookup {
                disease: SnomedTable::from_json(SnomedTable::DISEASE, "Label", &disease_bytes)?,
                specimen: SnomedTable::from_json(SnomedTable::SPECIMEN_TYPE, "CodeLabel", &specimen_bytes)?,
            })
        }).await
    }
}

impl CodeLookup for SnomedLookup {
    fn disease_label(&self, code: u64) -> Result<String, LookupError> {
        self.disease.label(code).map(str::to_string)
    }

    fn specimen_label(&self, code: u64) -> Result<String, LookupError> {
        self.specimen.label(code).map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::Compression;
    use flate2::write::GzEncoder;

    use super::*;

    const DISEASE_JSON: &str = r#"[
        {"Code": 55342001, "CodeSystem": "SNOMED-CT", "Label": "Neoplastic disease"},
        {"Code": "254637007", "CodeSystem": "SNOMED-CT", "Label": "Non-small cell lung cancer"},
        {"Code": 1234, "CodeSystem": "SNOMED-CT", "Label": "First"},
        {"Code": 1234, "CodeSystem": "SNOMED-CT", "Label": "Second"}
    ]"#;

    #[test]
    fn resolves_exactly_one_row() {
        let table = SnomedTable::from_json(SnomedTable::DISEASE, "Label", DISEASE_JSON.as_bytes()).unwrap();
        assert_eq!(table.label(55342001).unwrap(), "Neoplastic disease");
        assert_eq!(table.label(254637007).unwrap(), "Non-small cell lung cancer");
    }

    #[test]
    fn missing_and_ambiguous_codes_are_distinct_errors() {
        let table = SnomedTable::from_json(SnomedTable::DISEASE, "Label", DISEASE_JSON.as_bytes()).unwrap();
        assert!(matches!(table.label(1), Err(LookupError::Missing { code: 1, .. })));
        assert!(matches!(table.label(1234), Err(LookupError::Ambiguous { count: 2, .. })));
    }

    #[test]
    fn reads_gzipped_tables() {
        let specimen = r#"[{"Code": 122561005, "CodeSystem": "SNOMED-CT", "CodeLabel": "Blood specimen from patient"}]"#;
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(specimen.as_bytes()).unwrap();
        let compressed = encoder.finish().unwrap();

        let table = SnomedTable::from_json(SnomedTable::SPECIMEN_TYPE, "CodeLabel", &compressed).unwrap();
        assert_eq!(table.label(122561005).unwrap(), "Blood specimen from patient");
    }

    #[test]
    fn wrong_label_column_is_malformed() {
        let result = SnomedTable::from_json(SnomedTable::SPECIMEN_TYPE, "CodeLabel", DISEASE_JSON.as_bytes());
        assert!(matches!(result, Err(LookupError::Malformed { .. })));
    }
}
