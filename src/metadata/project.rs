use std::collections::HashMap;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::metadata::case_metadata::optional_snomed_code;
use crate::pieriandx::literals::SampleType;
use crate::services::{MetadataService, ServiceError};

static BUNDLED_PROJECT_INFO: &str = include_str!("../../data/project_info.json");

#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("library {0} has no projects")]
    NoProjectSet(String),
    #[error("can't read project table: {0}")]
    Table(String),
    #[error(transparent)]
    Fetch(#[from] ServiceError),
}

/// Reporting defaults shared by every library of a project
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInfo {
    /// Panel alias, `main` or `subpanel`
    pub panel: String,
    pub sample_type: SampleType,
    pub is_identified: bool,
    #[serde(default, deserialize_with = "optional_snomed_code")]
    pub default_snomed_disease_code: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectTable {
    default: ProjectInfo,
    projects: HashMap<String, ProjectInfo>,
}

/// Redcap tags for a library
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectTags {
    pub panel_version: String,
    pub is_identified: bool,
    pub sample_type: SampleType,
    pub project_id: String,
    pub default_snomed_disease_code: Option<u64>,
}

impl ProjectTable {
    pub fn bundled() -> ProjectTable {
        serde_json::from_str(BUNDLED_PROJECT_INFO).expect("Bundled project table is valid")
    }

    pub fn from_path(path: &Path) -> Result<ProjectTable, ProjectError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|err| ProjectError::Table(format!("{}: {err}", path.display())))?;
        serde_json::from_str(&contents).map_err(|err| ProjectError::Table(err.to_string()))
    }

    /// Projects without an entry get the default
    pub fn get(&self, project_id: &str) -> &ProjectInfo {
        self.projects.get(project_id).unwrap_or_else(|| {
            info!("No project info for {project_id}, using default");
            &self.default
        })
    }

    /// Tags come from the last project the library was added to
    pub async fn tags<M: MetadataService>(&self, service: &M, library_id: &str) -> Result<ProjectTags, ProjectError> {
        let library = service.library(library_id).await?;
        let project_id = library.project_set.last()
            .map(|project| project.project_id.clone())
            .ok_or_else(|| ProjectError::NoProjectSet(library_id.to_string()))?;
        let info = self.get(&project_id);

        Ok(ProjectTags {
            panel_version: info.panel.clone(),
            is_identified: info.is_identified,
            sample_type: info.sample_type,
            project_id,
            default_snomed_disease_code: info.default_snomed_disease_code,
        })
    }
}
