//! Command line and environment configuration
//!
//! Every setting can be passed as a flag or an environment variable. Settings are only checked
//! when a handler needs them, so the pure handlers run without any credentials.

use std::path::PathBuf;

use chrono_tz::Tz;
use clap::{Args, Parser, Subcommand};
use rusoto_core::Region;
use url::Url;

use crate::metadata::assemble::DEFAULT_MAX_ACCESSION_ATTEMPTS;
use crate::metadata::project::{ProjectError, ProjectTable};
use crate::namespace::PlatformNamespace;
use crate::pieriandx::PierianDxClient;
use crate::request::{EventSchema, EventSource};
use crate::services::orcabus::OrcabusClient;
use crate::services::s3::S3Store;
use crate::services::{ServiceError, StorageLocation};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

#[derive(Debug, Parser)]
#[command(name = "pieriandx-bridge")]
#[command(about = "Submit TSO500 ctDNA samples to PierianDx and track their reports", long_about = None)]
pub struct Config {
    #[arg(long, value_enum, env = "PLATFORM_NAMESPACE", default_value_t = PlatformNamespace::Dev, global = true)]
    pub namespace: PlatformNamespace,

    /// Event JSON file, read from stdin when omitted
    #[arg(long, global = true)]
    pub event: Option<PathBuf>,

    #[command(flatten)]
    pub pieriandx: PierianDxSettings,

    #[command(flatten)]
    pub orcabus: OrcabusSettings,

    #[command(flatten)]
    pub lookup: LookupSettings,

    #[command(flatten)]
    pub landing_zone: LandingZoneSettings,

    /// Timezone reception dates are reported in
    #[arg(long, env = "REPORTING_TIMEZONE", default_value = "Australia/Melbourne")]
    pub reporting_timezone: Tz,

    /// Upper bound on accession number probes per library
    #[arg(long, env = "MAX_ACCESSION_ATTEMPTS", default_value_t = DEFAULT_MAX_ACCESSION_ATTEMPTS)]
    pub max_accession_attempts: u32,

    /// Replaces the bundled project table
    #[arg(long, env = "PROJECT_INFO_PATH")]
    pub project_info_path: Option<PathBuf>,

    /// Rename `[Run QC Metrics]` to `[Run Metrics]` in staged metrics output
    #[arg(long, env = "REWRITE_METRICS_OUTPUT_HEADER")]
    pub rewrite_metrics_output_header: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Args)]
pub struct PierianDxSettings {
    /// Defaults to the namespace's CGW API
    #[arg(long = "pieriandx-base-url", env = "PIERIANDX_BASE_URL")]
    pub base_url: Option<String>,
    /// Defaults to the namespace's institution
    #[arg(long = "pieriandx-institution", env = "PIERIANDX_INSTITUTION")]
    pub institution: Option<String>,
    #[arg(long = "pieriandx-user-email", env = "PIERIANDX_USER_EMAIL", default_value = "services@umccr.org")]
    pub user_email: String,
    #[arg(long = "pieriandx-auth-token", env = "PIERIANDX_AUTH_TOKEN", hide_env_values = true)]
    pub auth_token: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct OrcabusSettings {
    #[arg(long = "orcabus-metadata-url", env = "ORCABUS_METADATA_URL")]
    pub metadata_url: Option<Url>,
    #[arg(long = "orcabus-workflow-url", env = "ORCABUS_WORKFLOW_URL")]
    pub workflow_url: Option<Url>,
    #[arg(long = "orcabus-filemanager-url", env = "ORCABUS_FILEMANAGER_URL")]
    pub filemanager_url: Option<Url>,
    #[arg(long = "orcabus-token", env = "ORCABUS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

/// SNOMED-CT reference tables, `s3://bucket/key` or a local path
#[derive(Debug, Clone, Args)]
pub struct LookupSettings {
    #[arg(long, env = "SNOMED_CT_DISEASE_TREE_URI")]
    pub disease_tree_uri: Option<String>,
    #[arg(long, env = "SNOMED_CT_SPECIMEN_TYPE_URI")]
    pub specimen_type_uri: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct LandingZoneSettings {
    #[arg(long = "landing-zone-access-key-id", env = "PIERIANDX_S3_ACCESS_KEY_ID")]
    pub access_key_id: Option<String>,
    #[arg(long = "landing-zone-secret-access-key", env = "PIERIANDX_S3_SECRET_ACCESS_KEY", hide_env_values = true)]
    pub secret_access_key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Assemble case metadata for a library
    CaseMetadata,
    /// Create a vendor case
    CreateCase,
    /// Create a vendor sequencer run
    CreateSequencerrun,
    /// Create an informatics job on a case
    CreateInformaticsjob,
    /// Build the case, sequencer run, informatics job, and data file manifest
    PieriandxObjects,
    /// Poll a case's latest informatics job and report
    JobStatus,
    /// Stage one data file in the landing zone
    Upload,
    /// Pick the single library of an event
    SelectLibrary,
    /// Find result files of a TSO500 workflow run
    DataFiles,
    /// Redcap tags from a library's project
    ProjectInfo,
}

impl Command {
    pub fn schema(&self) -> EventSchema {
        match self {
            Command::CaseMetadata => EventSchema::CaseMetadata,
            Command::CreateCase => EventSchema::CreateCase,
            Command::CreateSequencerrun => EventSchema::CreateSequencerrun,
            Command::CreateInformaticsjob => EventSchema::CreateInformaticsjob,
            Command::PieriandxObjects => EventSchema::PieriandxObjects,
            Command::JobStatus => EventSchema::JobStatus,
            Command::Upload => EventSchema::Upload,
            Command::SelectLibrary => EventSchema::SelectLibrary,
            Command::DataFiles => EventSchema::DataFiles,
            Command::ProjectInfo => EventSchema::ProjectInfo,
        }
    }
}

impl Config {
    pub fn event_source(&self) -> EventSource {
        match &self.event {
            Some(path) => EventSource::Path(path.clone()),
            None => EventSource::Stdin,
        }
    }

    pub fn pieriandx_client(&self) -> PierianDxClient {
        let settings = &self.pieriandx;
        PierianDxClient::new(
            settings.base_url.as_deref().unwrap_or(self.namespace.pieriandx_base_url()),
            &settings.user_email,
            settings.institution.as_deref().unwrap_or(self.namespace.pieriandx_institution()),
            settings.auth_token.clone(),
        )
    }

    pub fn orcabus_client(&self) -> OrcabusClient {
        let settings = self.orcabus.clone();
        OrcabusClient::new(settings.metadata_url, settings.workflow_url, settings.filemanager_url, settings.token)
    }

    /// Reference data bucket, credentials from the default AWS chain
    pub fn reference_store(&self) -> S3Store {
        S3Store::new(Region::default())
    }

    /// The vendor's bucket, only reachable with the access key it issued
    pub fn landing_zone_store(&self) -> Result<S3Store, ConfigError> {
        let access_key_id = self.landing_zone.access_key_id.as_deref()
            .ok_or(ConfigError::Missing("PIERIANDX_S3_ACCESS_KEY_ID"))?;
        let secret_access_key = self.landing_zone.secret_access_key.as_deref()
            .ok_or(ConfigError::Missing("PIERIANDX_S3_SECRET_ACCESS_KEY"))?;
        Ok(S3Store::with_credentials(access_key_id, secret_access_key, Region::default())?)
    }

    pub fn snomed_locations(&self) -> Result<(StorageLocation, StorageLocation), ConfigError> {
        let disease = self.lookup.disease_tree_uri.as_deref()
            .ok_or(ConfigError::Missing("SNOMED_CT_DISEASE_TREE_URI"))?;
        let specimen = self.lookup.specimen_type_uri.as_deref()
            .ok_or(ConfigError::Missing("SNOMED_CT_SPECIMEN_TYPE_URI"))?;
        Ok((disease.parse()?, specimen.parse()?))
    }

    pub fn project_table(&self) -> Result<ProjectTable, ProjectError> {
        match &self.project_info_path {
            Some(path) => ProjectTable::from_path(path),
            None => Ok(ProjectTable::bundled()),
        }
    }
}
