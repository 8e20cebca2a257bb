use log::{info, warn};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::services::{FileManager, FileObject, Library, MetadataService, ServiceError, StorageLocation, WorkflowService};

/// Page size when listing run outputs
const ROWS_PER_PAGE: &str = "1000";

/// Orcabus platform APIs. Each endpoint is optional so handlers that don't need it can run without it
pub struct OrcabusClient {
    http: Client,
    pub metadata_url: Option<Url>,
    pub workflow_url: Option<Url>,
    pub filemanager_url: Option<Url>,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(default)]
    links: Option<Links>,
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct Links {
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorkflowRun {
    orcabus_id: String,
}

#[derive(Debug, Deserialize)]
struct WorkflowRunState {
    timestamp: String,
    payload: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct S3Record {
    s3_object_id: String,
    bucket: String,
    key: String,
}

impl OrcabusClient {
    pub fn new(metadata_url: Option<Url>, workflow_url: Option<Url>, filemanager_url: Option<Url>, token: Option<String>) -> OrcabusClient {
        OrcabusClient { http: Client::new(), metadata_url, workflow_url, filemanager_url, token }
    }

    fn endpoint(base: &Option<Url>, name: &'static str, path: &str) -> Result<Url, ServiceError> {
        let base = base.as_ref().ok_or(ServiceError::NotConfigured(name))?;
        let joined = format!("{}/{}", base.as_str().trim_end_matches('/'), path.trim_start_matches('/'));
        Url::parse(&joined).map_err(|_| ServiceError::InvalidUri(joined))
    }

    fn authorised(&self, request: RequestBuilder) -> Result<RequestBuilder, ServiceError> {
        let token = self.token.as_ref().ok_or(ServiceError::NotConfigured("ORCABUS_TOKEN"))?;
        Ok(request.bearer_auth(token))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ServiceError> {
        let response = self.authorised(self.http.get(url.clone()))?.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("GET {url} failed with {status}");
            return Err(ServiceError::Status { url: url.to_string(), status: status.as_u16(), body });
        }
        Ok(response.json().await?)
    }

    /// Follow `links.next` until the listing is exhausted
    async fn get_all<T: DeserializeOwned>(&self, first: Url) -> Result<Vec<T>, ServiceError> {
        let mut results = Vec::new();
        let mut next = Some(first);
        while let Some(url) = next {
            let page: Page<T> = self.get_json(url).await?;
            results.extend(page.results);
            next = match page.links.and_then(|links| links.next) {
                Some(link) => Some(Url::parse(&link).map_err(|_| ServiceError::InvalidUri(link))?),
                None => None,
            };
        }
        Ok(results)
    }

    async fn presigned_url(&self, uri: &str) -> Result<String, ServiceError> {
        let (bucket, key) = match uri.parse::<StorageLocation>()? {
            StorageLocation::S3 { bucket, key } => (bucket, key),
            StorageLocation::Local(_) => return Err(ServiceError::InvalidUri(uri.to_string())),
        };

        let mut url = Self::endpoint(&self.filemanager_url, "ORCABUS_FILEMANAGER_URL", "api/v1/s3")?;
        url.query_pairs_mut()
            .append_pair("bucket", &bucket)
            .append_pair("key", &key)
            .append_pair("currentState", "true");
        let page: Page<S3Record> = self.get_json(url).await?;
        let record = match page.results.as_slice() {
            [record] => record,
            _ => return Err(ServiceError::Unexpected(format!("expected one file manager record for {uri}, found {}", page.results.len()))),
        };

        let mut presign = Self::endpoint(&self.filemanager_url, "ORCABUS_FILEMANAGER_URL",
                                         &format!("api/v1/s3/presign/{}", record.s3_object_id))?;
        presign.query_pairs_mut().append_pair("responseContentDisposition", "inline");
        self.get_json(presign).await
    }
}

impl MetadataService for OrcabusClient {
    async fn library(&self, library_id: &str) -> Result<Library, ServiceError> {
        info!("Fetching library {library_id}");
        let mut url = Self::endpoint(&self.metadata_url, "ORCABUS_METADATA_URL", "api/v1/library")?;
        url.query_pairs_mut().append_pair("libraryId", library_id);
        let page: Page<Library> = self.get_json(url).await?;
        let count = page.results.len();
        page.results.into_iter().next()
            .filter(|_| count == 1)
            .ok_or_else(|| ServiceError::Unexpected(format!("expected one library {library_id}, found {count}")))
    }
}

impl WorkflowService for OrcabusClient {
    async fn latest_payload(&self, portal_run_id: &str) -> Result<Value, ServiceError> {
        info!("Fetching latest payload for workflow run {portal_run_id}");
        let mut url = Self::endpoint(&self.workflow_url, "ORCABUS_WORKFLOW_URL", "api/v1/workflowrun")?;
        url.query_pairs_mut().append_pair("portalRunId", portal_run_id);
        let page: Page<WorkflowRun> = self.get_json(url).await?;
        let run = page.results.into_iter().next()
            .ok_or_else(|| ServiceError::Unexpected(format!("no workflow run {portal_run_id}")))?;

        let states_url = Self::endpoint(&self.workflow_url, "ORCABUS_WORKFLOW_URL",
                                        &format!("api/v1/workflowrun/{}/state", run.orcabus_id))?;
        let states: Vec<WorkflowRunState> = self.get_json(states_url).await?;
        // timestamps are ISO 8601 in UTC so lexical order is chronological
        let payload_id = states.into_iter()
            .filter(|state| state.payload.is_some())
            .max_by(|a, b| a.timestamp.cmp(&b.timestamp))
            .and_then(|state| state.payload)
            .ok_or_else(|| ServiceError::Unexpected(format!("workflow run {portal_run_id} has no payload")))?;

        let payload_url = Self::endpoint(&self.workflow_url, "ORCABUS_WORKFLOW_URL",
                                         &format!("api/v1/payload/{payload_id}"))?;
        self.get_json(payload_url).await
    }
}

impl FileManager for OrcabusClient {
    async fn list_run_files(&self, portal_run_id: &str) -> Result<Vec<FileObject>, ServiceError> {
        info!("Listing files for workflow run {portal_run_id}");
        let mut url = Self::endpoint(&self.filemanager_url, "ORCABUS_FILEMANAGER_URL", "api/v1/s3")?;
        url.query_pairs_mut()
            .append_pair("attributes[portalRunId]", portal_run_id)
            .append_pair("currentState", "true")
            .append_pair("rowsPerPage", ROWS_PER_PAGE);
        let records: Vec<S3Record> = self.get_all(url).await?;
        Ok(records.into_iter().map(|r| FileObject { bucket: r.bucket, key: r.key }).collect())
    }

    async fn download(&self, uri: &str) -> Result<Vec<u8>, ServiceError> {
        let presigned = self.presigned_url(uri).await?;
        info!("Downloading {uri}");
        let response = self.http.get(&presigned).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Status { url: uri.to_string(), status: status.as_u16(), body: String::new() });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_join_without_double_slashes() {
        let base = Some(Url::parse("https://metadata.example.org/").unwrap());
        let url = OrcabusClient::endpoint(&base, "ORCABUS_METADATA_URL", "/api/v1/library").unwrap();
        assert_eq!(url.as_str(), "https://metadata.example.org/api/v1/library");
    }

    #[test]
    fn missing_endpoint_is_reported_by_name() {
        let err = OrcabusClient::endpoint(&None, "ORCABUS_WORKFLOW_URL", "api").unwrap_err();
        assert_eq!(err.to_string(), "ORCABUS_WORKFLOW_URL is not configured");
    }
}
