use log::info;
use rusoto_core::{HttpClient, Region};
use rusoto_credential::StaticProvider;
use rusoto_s3::{GetObjectRequest, PutObjectRequest, S3, S3Client};
use tokio::io::AsyncReadExt;

use crate::services::{ObjectStore, ServiceError};

/// Every object written to the vendor landing zone is encrypted at rest
static SERVER_SIDE_ENCRYPTION: &str = "AES256";

pub struct S3Store {
    client: S3Client,
}

impl S3Store {
    /// Credentials from the default provider chain (environment, profile, instance role)
    pub fn new(region: Region) -> S3Store {
        S3Store { client: S3Client::new(region) }
    }

    /// Static credentials, the vendor issues an access key pair for its bucket
    pub fn with_credentials(access_key_id: &str, secret_access_key: &str, region: Region) -> Result<S3Store, ServiceError> {
        let provider = StaticProvider::new_minimal(access_key_id.to_string(), secret_access_key.to_string());
        let http = HttpClient::new().map_err(|err| ServiceError::S3(err.to_string()))?;
        Ok(S3Store { client: S3Client::new_with(http, provider, region) })
    }
}

impl ObjectStore for S3Store {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, ServiceError> {
        info!("Downloading s3://{bucket}/{key}");
        let request = GetObjectRequest {
            bucket: bucket.to_string(),
            key: key.to_string(),
            ..Default::default()
        };
        let output = self.client.get_object(request).await
            .map_err(|err| ServiceError::S3(err.to_string()))?;
        let body = output.body.ok_or_else(|| ServiceError::S3(format!("s3://{bucket}/{key} has no body")))?;

        let mut bytes = Vec::new();
        body.into_async_read().read_to_end(&mut bytes).await?;
        Ok(bytes)
    }

    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<(), ServiceError> {
        info!("Uploading {} bytes to s3://{bucket}/{key}", body.len());
        let request = PutObjectRequest {
            bucket: bucket.to_string(),
            key: key.to_string(),
            body: Some(body.into()),
            server_side_encryption: Some(SERVER_SIDE_ENCRYPTION.to_string()),
            ..Default::default()
        };
        self.client.put_object(request).await
            .map_err(|err| ServiceError::S3(err.to_string()))?;
        Ok(())
    }
}
