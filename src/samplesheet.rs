//! Illumina v2 sample sheets
//!
//! A v2 sheet is a CSV file split into `[Section]` blocks. Sections ending in `_Data` are tables
//! with a header row, every other section holds `key,value` settings. Sheets are read and written
//! back section by section so that a round trip preserves names, column order, and values.

use std::fmt;
use std::str::FromStr;

use log::info;

use crate::pieriandx::literals::SequencingSampleType;

/// The section describing the sample handed to the vendor
pub const TSO500L_DATA: &str = "TSO500L_Data";

#[derive(Debug, thiserror::Error)]
pub enum SampleSheetError {
    #[error("can't read sample sheet: {0}")]
    Csv(#[from] csv::Error),
    #[error("sample sheet rows appear before any [Section] header")]
    NoSection,
    #[error("sample sheet has no [{0}] section")]
    MissingSection(String),
    #[error("[{section}] should have exactly one row, found {count}")]
    DataRowCount { section: String, count: usize },
    #[error("[{section}] has no {column} column")]
    MissingColumn { section: String, column: String },
    #[error("invalid {column} {value:?}")]
    InvalidValue { column: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Section {
    Settings { name: String, records: Vec<Vec<String>> },
    Data { name: String, columns: Vec<String>, rows: Vec<Vec<String>> },
}

impl Section {
    fn new(name: &str) -> Section {
        if name.ends_with("_Data") {
            Section::Data { name: name.to_string(), columns: Vec::new(), rows: Vec::new() }
        } else {
            Section::Settings { name: name.to_string(), records: Vec::new() }
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Section::Settings { name, .. } | Section::Data { name, .. } => name,
        }
    }

    fn push(&mut self, record: Vec<String>) {
        match self {
            Section::Settings { records, .. } => records.push(record),
            Section::Data { columns, .. } if columns.is_empty() => *columns = record,
            Section::Data { rows, .. } => rows.push(record),
        }
    }

    fn records(&self) -> Vec<&Vec<String>> {
        match self {
            Section::Settings { records, .. } => records.iter().collect(),
            Section::Data { columns, rows, .. } => std::iter::once(columns)
                .filter(|columns| !columns.is_empty())
                .chain(rows.iter())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleSheet {
    pub sections: Vec<Section>,
}

/// The one sample a case is created for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleSheetEntry {
    pub sample_id: String,
    pub sample_type: SequencingSampleType,
    pub index: String,
    pub index2: String,
    pub lane: u32,
}

impl SampleSheetEntry {
    pub fn barcode(&self) -> String {
        format!("{}-{}", self.index, self.index2)
    }
}

fn section_header(record: &[String]) -> Option<&str> {
    let first = record.first()?.trim();
    let is_header = first.starts_with('[') && first.ends_with(']')
        && record[1..].iter().all(|field| field.trim().is_empty());
    is_header.then(|| first.trim_start_matches('[').trim_end_matches(']'))
}

/// Non-empty value of `column` in `row`, column names match in any case
fn cell<'a>(columns: &[String], row: &'a [String], column: &str) -> Option<&'a str> {
    columns.iter()
        .position(|name| name.eq_ignore_ascii_case(column))
        .and_then(|i| row.get(i))
        .map(String::as_str)
        .filter(|value| !value.is_empty())
}

fn trim_trailing_empty(mut record: Vec<String>) -> Vec<String> {
    while record.last().is_some_and(|field| field.is_empty()) {
        record.pop();
    }
    record
}

impl FromStr for SampleSheet {
    type Err = SampleSheetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(s.as_bytes());

        let mut sections: Vec<Section> = Vec::new();
        for result in reader.records() {
            let record: Vec<String> = result?.iter().map(|field| field.trim().to_string()).collect();
            if let Some(name) = section_header(&record) {
                sections.push(Section::new(name));
                continue;
            }
            let record = trim_trailing_empty(record);
            if record.is_empty() {
                continue;
            }
            sections.last_mut().ok_or(SampleSheetError::NoSection)?.push(record);
        }

        Ok(SampleSheet { sections })
    }
}

impl fmt::Display for SampleSheet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for section in &self.sections {
            writeln!(f, "[{}]", section.name())?;
            let mut writer = csv::WriterBuilder::new()
                .flexible(true)
                .terminator(csv::Terminator::Any(b'\n'))
                .from_writer(Vec::new());
            for record in section.records() {
                writer.write_record(record).map_err(|_| fmt::Error)?;
            }
            let bytes = writer.into_inner().map_err(|_| fmt::Error)?;
            write!(f, "{}", String::from_utf8_lossy(&bytes))?;
            writeln!(f)?;
        }
        Ok(())
    }
}

impl SampleSheet {
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|section| section.name().eq_ignore_ascii_case(name))
    }

    /// The single row of the TSO500L data section
    pub fn tso500l_entry(&self) -> Result<SampleSheetEntry, SampleSheetError> {
        let (columns, rows) = match self.section(TSO500L_DATA) {
            Some(Section::Data { columns, rows, .. }) => (columns, rows),
            _ => return Err(SampleSheetError::MissingSection(TSO500L_DATA.to_string())),
        };
        let row = match rows.as_slice() {
            [row] => row,
            _ => return Err(SampleSheetError::DataRowCount { section: TSO500L_DATA.to_string(), count: rows.len() }),
        };

        let value = |column: &str| cell(columns, row, column);
        let required = |column: &str| cell(columns, row, column).ok_or_else(|| SampleSheetError::MissingColumn {
            section: TSO500L_DATA.to_string(),
            column: column.to_string(),
        });

        let sample_type = required("Sample_Type")?;
        let lane = match value("Lane") {
            Some(lane) => lane.parse().map_err(|_| SampleSheetError::InvalidValue { column: "Lane".to_string(), value: lane.to_string() })?,
            None => 1,
        };

        let entry = SampleSheetEntry {
            sample_id: required("Sample_ID")?.to_string(),
            sample_type: sample_type.parse().map_err(|_| SampleSheetError::InvalidValue {
                column: "Sample_Type".to_string(),
                value: sample_type.to_string(),
            })?,
            index: required("Index")?.to_string(),
            index2: required("Index2")?.to_string(),
            lane,
        };
        info!("Sample sheet entry {} on lane {} with barcode {}", entry.sample_id, entry.lane, entry.barcode());
        Ok(entry)
    }
}

/// The vendor can't parse `Index`/`Index2` column headers. Settings such as `Index1Cycles`
/// start a line rather than follow a comma, so they are left alone
pub fn lowercase_index_headers(samplesheet: &str) -> String {
    samplesheet.replace(",Index", ",index")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const SAMPLESHEET: &str = "\
[Header]
FileFormatVersion,2
RunName,Tsqn241024
InstrumentType,NovaSeq 6000

[Reads]
Read1Cycles,151
Read2Cycles,151
Index1Cycles,8
Index2Cycles,8

[BCLConvert_Settings]
AdapterBehavior,trim
OverrideCycles,U7N1Y143;I8;I8;U7N1Y143

[BCLConvert_Data]
Lane,Sample_ID,Index,Index2
1,L2400161,GAATCCGA,TTCGCAAG
1,L2400162,ACAGAGGT,CAATGCAG

[TSO500L_Settings]
AdapterRead1,CTGTCTCTTATACACATCT,,

[TSO500L_Data]
Sample_ID,Sample_Type,Lane,Index,Index2,I7_Index_ID,I5_Index_ID
L2400161,DNA,1,GAATCCGA,TTCGCAAG,UDP0049,UDP0049
";

    #[test]
    fn reads_sections() {
        let sheet: SampleSheet = SAMPLESHEET.parse().unwrap();
        let names: Vec<&str> = sheet.sections.iter().map(Section::name).collect();
        assert_eq!(names, vec!["Header", "Reads", "BCLConvert_Settings", "BCLConvert_Data", "TSO500L_Settings", "TSO500L_Data"]);
        match sheet.section("BCLConvert_Data").unwrap() {
            Section::Data { columns, rows, .. } => {
                assert_eq!(columns, &vec!["Lane", "Sample_ID", "Index", "Index2"]);
                assert_eq!(rows.len(), 2);
            }
            other => panic!("expected a data section, got {other:?}"),
        }
    }

    #[test]
    fn extracts_the_tso500l_entry() {
        let sheet: SampleSheet = SAMPLESHEET.parse().unwrap();
        let entry = sheet.tso500l_entry().unwrap();
        assert_eq!(entry.sample_id, "L2400161");
        assert_eq!(entry.sample_type, SequencingSampleType::Dna);
        assert_eq!(entry.lane, 1);
        assert_eq!(entry.barcode(), "GAATCCGA-TTCGCAAG");
    }

    #[test]
    fn lane_defaults_to_one() {
        let sheet: SampleSheet = "[TSO500L_Data]\nSample_ID,Sample_Type,Index,Index2\nL2400161,DNA,GAATCCGA,TTCGCAAG\n".parse().unwrap();
        assert_eq!(sheet.tso500l_entry().unwrap().lane, 1);
    }

    #[test]
    fn needs_exactly_one_tso500l_row() {
        let none: SampleSheet = "[TSO500L_Data]\nSample_ID,Sample_Type,Index,Index2\n".parse().unwrap();
        assert!(matches!(none.tso500l_entry(), Err(SampleSheetError::DataRowCount { count: 0, .. })));

        let two: SampleSheet = "[TSO500L_Data]\nSample_ID,Sample_Type,Index,Index2\nA,DNA,AC,GT\nB,DNA,CA,TG\n".parse().unwrap();
        assert!(matches!(two.tso500l_entry(), Err(SampleSheetError::DataRowCount { count: 2, .. })));

        let missing: SampleSheet = "[Header]\nFileFormatVersion,2\n".parse().unwrap();
        assert!(matches!(missing.tso500l_entry(), Err(SampleSheetError::MissingSection(_))));
    }

    #[test]
    fn writes_back_what_it_read() {
        let sheet: SampleSheet = SAMPLESHEET.parse().unwrap();
        let written = sheet.to_string();
        assert_eq!(written.parse::<SampleSheet>().unwrap(), sheet);
        assert!(written.contains("[TSO500L_Settings]\nAdapterRead1,CTGTCTCTTATACACATCT\n"));
    }

    #[test]
    fn header_fix_only_touches_column_headers() {
        let fixed = lowercase_index_headers(SAMPLESHEET);
        assert!(fixed.contains("Sample_ID,Sample_Type,Lane,index,index2,I7_Index_ID,I5_Index_ID"));
        assert!(fixed.contains("Lane,Sample_ID,index,index2"));
        assert!(fixed.contains("Index1Cycles,8\nIndex2Cycles,8"));
    }
}
