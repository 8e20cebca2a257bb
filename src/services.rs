//! Collaborators outside this crate
//!
//! Library metadata, workflow payloads, file listing, presigned downloads, and S3 storage are owned
//! by other systems. Handlers only see the traits below so tests can swap in fixed data.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;
use serde_json::Value;
use url::Url;

/// HTTP clients for the orcabus metadata, workflow, and file manager services
pub mod orcabus;
/// S3 object storage with rusoto
pub mod s3;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{url} returned {status}: {body}")]
    Status { url: String, status: u16, body: String },
    #[error("S3 request failed: {0}")]
    S3(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
    #[error("invalid storage uri {0:?}")]
    InvalidUri(String),
    #[error("unexpected response: {0}")]
    Unexpected(String),
}

/// Where a blob lives: an S3 object or a file on local disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageLocation {
    S3 { bucket: String, key: String },
    Local(PathBuf),
}

impl FromStr for StorageLocation {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.starts_with("s3://") {
            return Ok(StorageLocation::Local(PathBuf::from(s)));
        }
        let url = Url::parse(s).map_err(|_| ServiceError::InvalidUri(s.to_string()))?;
        let bucket = url.host_str()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| ServiceError::InvalidUri(s.to_string()))?;
        let key = url.path().trim_start_matches('/');
        if key.is_empty() {
            return Err(ServiceError::InvalidUri(s.to_string()));
        }
        Ok(StorageLocation::S3 { bucket: bucket.to_string(), key: key.to_string() })
    }
}

impl fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StorageLocation::S3 { bucket, key } => write!(f, "s3://{bucket}/{key}"),
            StorageLocation::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Library {
    pub library_id: String,
    pub sample: LibrarySample,
    pub subject: LibrarySubject,
    #[serde(default)]
    pub project_set: Vec<Project>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibrarySample {
    pub external_sample_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibrarySubject {
    pub subject_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub project_id: String,
}

/// An object recorded by the file manager
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileObject {
    pub bucket: String,
    pub key: String,
}

impl FileObject {
    pub fn uri(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.key)
    }
}

#[allow(async_fn_in_trait)]
pub trait MetadataService {
    async fn library(&self, library_id: &str) -> Result<Library, ServiceError>;
}

#[allow(async_fn_in_trait)]
pub trait WorkflowService {
    /// Payload attached to the most recent state of the workflow run
    async fn latest_payload(&self, portal_run_id: &str) -> Result<Value, ServiceError>;
}

#[allow(async_fn_in_trait)]
pub trait FileManager {
    async fn list_run_files(&self, portal_run_id: &str) -> Result<Vec<FileObject>, ServiceError>;
    /// Download an object through a presigned URL
    async fn download(&self, uri: &str) -> Result<Vec<u8>, ServiceError>;
}

#[allow(async_fn_in_trait)]
pub trait ObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, ServiceError>;
    /// Upload with server side encryption
    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<(), ServiceError>;

    async fn fetch(&self, location: &StorageLocation) -> Result<Vec<u8>, ServiceError> {
        match location {
            StorageLocation::S3 { bucket, key } => self.get_object(bucket, key).await,
            StorageLocation::Local(path) => Ok(tokio::fs::read(path).await?),
        }
    }
}
