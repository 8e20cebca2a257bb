use log::{error, info, warn};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum VendorError {
    #[error("PierianDx request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("PierianDx {endpoint} returned {status}: {body}")]
    Status { endpoint: String, status: u16, body: String },
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
    #[error("invalid PierianDx url {0:?}")]
    InvalidUrl(String),
}

/// The calls this crate makes against the CGW API
#[allow(async_fn_in_trait)]
pub trait PierianDx {
    /// Is a case already registered with this accession number
    async fn case_exists(&self, accession_number: &str) -> Result<bool, VendorError>;
    async fn create_case(&self, case: &Value) -> Result<Value, VendorError>;
    async fn create_sequencer_run(&self, run: &Value) -> Result<Value, VendorError>;
    async fn create_informatics_job(&self, case_id: &str, job: &Value) -> Result<Value, VendorError>;
    /// Full case state: specimens, sequencer runs, informatics jobs, reports
    async fn get_case(&self, case_id: &str) -> Result<Value, VendorError>;
}

pub struct PierianDxClient {
    http: Client,
    base_url: String,
    email: String,
    institution: String,
    token: Option<String>,
}

impl PierianDxClient {
    pub fn new(base_url: &str, email: &str, institution: &str, token: Option<String>) -> PierianDxClient {
        PierianDxClient {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            email: email.to_string(),
            institution: institution.to_string(),
            token,
        }
    }

    fn url(&self, endpoint: &str) -> Result<Url, VendorError> {
        let url = format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'));
        Url::parse(&url).map_err(|_| VendorError::InvalidUrl(url))
    }

    fn authorised(&self, request: RequestBuilder) -> Result<RequestBuilder, VendorError> {
        let token = self.token.as_ref().ok_or(VendorError::NotConfigured("PIERIANDX_AUTH_TOKEN"))?;
        Ok(request
            .header("X-Auth-Email", &self.email)
            .header("X-Auth-Institution", &self.institution)
            .header("X-Auth-Token", token))
    }

    /// Creation endpoints answer 200 on success, anything else is fatal
    async fn post(&self, endpoint: &str, body: &Value) -> Result<Value, VendorError> {
        let url = self.url(endpoint)?;
        info!("POST {url}");
        let response = self.authorised(self.http.post(url).json(body))?.send().await?;
        let response = expect_status(endpoint, response, StatusCode::OK).await?;
        Ok(response.json().await?)
    }

    async fn get(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<Response, VendorError> {
        let url = self.url(endpoint)?;
        info!("GET {url}");
        Ok(self.authorised(self.http.get(url).query(query))?.send().await?)
    }
}

async fn expect_status(endpoint: &str, response: Response, expected: StatusCode) -> Result<Response, VendorError> {
    let status = response.status();
    if status == expected {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    error!("PierianDx {endpoint} returned {status}: {body}");
    Err(VendorError::Status { endpoint: endpoint.to_string(), status: status.as_u16(), body })
}

/// A case search with no matches comes back empty, as `null`, or as an empty list
fn is_empty_result(body: &str) -> bool {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Null) => true,
        Ok(Value::Array(cases)) => cases.is_empty(),
        Ok(Value::Object(fields)) => fields.is_empty(),
        Ok(_) => false,
        Err(_) => body.trim().is_empty(),
    }
}

/// Whether a case search response means the accession number is taken
fn case_search_outcome(status: StatusCode, body: String) -> Result<bool, VendorError> {
    match status {
        StatusCode::NO_CONTENT | StatusCode::NOT_FOUND => Ok(false),
        StatusCode::OK => Ok(!is_empty_result(&body)),
        status => Err(VendorError::Status { endpoint: "case".to_string(), status: status.as_u16(), body }),
    }
}

impl PierianDx for PierianDxClient {
    async fn case_exists(&self, accession_number: &str) -> Result<bool, VendorError> {
        let response = self.get("case", &[("accessionNumber", accession_number)]).await?;
        let status = response.status();
        let body = match status {
            StatusCode::OK => response.text().await?,
            _ => response.text().await.unwrap_or_default(),
        };
        case_search_outcome(status, body).map_err(|err| {
            warn!("Case search for {accession_number} returned {status}");
            err
        })
    }

    async fn create_case(&self, case: &Value) -> Result<Value, VendorError> {
        self.post("case", case).await
    }

    async fn create_sequencer_run(&self, run: &Value) -> Result<Value, VendorError> {
        self.post("sequencerRun", run).await
    }

    async fn create_informatics_job(&self, case_id: &str, job: &Value) -> Result<Value, VendorError> {
        self.post(&format!("case/{case_id}/informaticsJobs"), job).await
    }

    async fn get_case(&self, case_id: &str) -> Result<Value, VendorError> {
        let endpoint = format!("case/{case_id}");
        let response = self.get(&endpoint, &[]).await?;
        let response = expect_status(&endpoint, response, StatusCode::OK).await?;
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_search_results_mean_free() {
        assert!(is_empty_result(""));
        assert!(is_empty_result("null"));
        assert!(is_empty_result("[]"));
        assert!(!is_empty_result(r#"[{"id": "12345", "accessionNumber": "L2400161_001"}]"#));
        assert!(!is_empty_result(r#"{"id": "12345"}"#));
    }

    #[test]
    fn case_search_statuses() {
        let taken = r#"[{"id": "12345", "accessionNumber": "L2400161_001"}]"#;
        assert!(case_search_outcome(StatusCode::OK, taken.to_string()).unwrap());
        for body in ["", "null", "[]", "{}"] {
            assert!(!case_search_outcome(StatusCode::OK, body.to_string()).unwrap(), "{body:?}");
        }
        assert!(!case_search_outcome(StatusCode::NO_CONTENT, String::new()).unwrap());
        assert!(!case_search_outcome(StatusCode::NOT_FOUND, taken.to_string()).unwrap());

        for status in [StatusCode::UNAUTHORIZED, StatusCode::INTERNAL_SERVER_ERROR] {
            match case_search_outcome(status, "nope".to_string()) {
                Err(VendorError::Status { endpoint, status: code, body }) => {
                    assert_eq!((endpoint.as_str(), code, body.as_str()), ("case", status.as_u16(), "nope"));
                }
                other => panic!("expected a status error for {status}, got {other:?}"),
            }
        }
    }

    #[test]
    fn endpoints_hang_off_the_api_root() {
        let client = PierianDxClient::new("https://app.uat.pieriandx.com/cgw-api/v2.0.0/", "services@umccr.org", "melbournetest", None);
        assert_eq!(client.url("/case/1234").unwrap().as_str(), "https://app.uat.pieriandx.com/cgw-api/v2.0.0/case/1234");
    }

    #[test]
    fn calls_need_a_token() {
        let client = PierianDxClient::new("https://app.uat.pieriandx.com/cgw-api/v2.0.0", "services@umccr.org", "melbournetest", None);
        let request = client.http.get("https://app.uat.pieriandx.com");
        assert!(matches!(client.authorised(request), Err(VendorError::NotConfigured("PIERIANDX_AUTH_TOKEN"))));
    }
}
