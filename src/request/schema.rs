use jsonschema::JSONSchema;
use serde_json::Value;

/// Schema describing the required keys of one handler's event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSchema {
    CaseMetadata,
    CreateCase,
    CreateSequencerrun,
    CreateInformaticsjob,
    PieriandxObjects,
    JobStatus,
    Upload,
    SelectLibrary,
    DataFiles,
    ProjectInfo,
}

impl EventSchema {
    pub const ALL: [EventSchema; 10] = [
        EventSchema::CaseMetadata,
        EventSchema::CreateCase,
        EventSchema::CreateSequencerrun,
        EventSchema::CreateInformaticsjob,
        EventSchema::PieriandxObjects,
        EventSchema::JobStatus,
        EventSchema::Upload,
        EventSchema::SelectLibrary,
        EventSchema::DataFiles,
        EventSchema::ProjectInfo,
    ];

    fn source(&self) -> &'static str {
        match self {
            EventSchema::CaseMetadata => include_str!("../../data/schemas/case_metadata.json"),
            EventSchema::CreateCase => include_str!("../../data/schemas/create_case.json"),
            EventSchema::CreateSequencerrun => include_str!("../../data/schemas/create_sequencerrun.json"),
            EventSchema::CreateInformaticsjob => include_str!("../../data/schemas/create_informaticsjob.json"),
            EventSchema::PieriandxObjects => include_str!("../../data/schemas/pieriandx_objects.json"),
            EventSchema::JobStatus => include_str!("../../data/schemas/job_status.json"),
            EventSchema::Upload => include_str!("../../data/schemas/upload.json"),
            EventSchema::SelectLibrary => include_str!("../../data/schemas/select_library.json"),
            EventSchema::DataFiles => include_str!("../../data/schemas/data_files.json"),
            EventSchema::ProjectInfo => include_str!("../../data/schemas/project_info.json"),
        }
    }

    /// Schemas are compiled into the binary, see the test below
    pub fn compile(&self) -> JSONSchema {
        let schema: Value = serde_json::from_str(self.source()).expect("Valid JSON");
        JSONSchema::options()
            .compile(&schema)
            .expect("Valid schema")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_schemas_compile() {
        for schema in EventSchema::ALL {
            schema.compile();
        }
    }
}
