use std::io::Read;

use flate2::read::MultiGzDecoder;
use log::info;
use serde::Serialize;

use crate::pieriandx::data_file::DataFileTransfer;
use crate::services::{FileManager, ObjectStore, StorageLocation};
use crate::staging::StagingError;

const METRICS_OUTPUT_SUFFIX: &str = "_MetricsOutput.tsv";
const RUN_QC_METRICS_HEADER: &str = "[Run QC Metrics]";
const RUN_METRICS_HEADER: &str = "[Run Metrics]";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedObject {
    pub bucket: String,
    pub key: String,
    pub size: usize,
}

fn gunzip(uri: &str, compressed: &[u8]) -> Result<Vec<u8>, StagingError> {
    let mut decompressed = Vec::new();
    MultiGzDecoder::new(compressed)
        .read_to_end(&mut decompressed)
        .map_err(|source| StagingError::Decompress { uri: uri.to_string(), source })?;
    Ok(decompressed)
}

/// Older vendor ingestion only recognises the `[Run Metrics]` section header
fn rewrite_metrics_header(key: &str, body: Vec<u8>) -> Vec<u8> {
    if !key.ends_with(METRICS_OUTPUT_SUFFIX) {
        return body;
    }
    match String::from_utf8(body) {
        Ok(text) => text.replace(RUN_QC_METRICS_HEADER, RUN_METRICS_HEADER).into_bytes(),
        Err(err) => err.into_bytes(),
    }
}

/// Copy one manifest entry into the landing zone
pub async fn upload<F: FileManager, S: ObjectStore>(files: &F, store: &S, transfer: &DataFileTransfer, rewrite_metrics: bool)
    -> Result<UploadedObject, StagingError> {
    let (bucket, key) = match transfer.dest_uri.parse::<StorageLocation>() {
        Ok(StorageLocation::S3 { bucket, key }) => (bucket, key),
        _ => return Err(StagingError::Destination(transfer.dest_uri.clone())),
    };

    let body = match (&transfer.src_uri, &transfer.contents) {
        (Some(src_uri), None) => {
            let bytes = files.download(src_uri).await?;
            if transfer.needs_decompression {
                info!("Decompressing {src_uri}");
                gunzip(src_uri, &bytes)?
            } else {
                bytes
            }
        }
        (None, Some(contents)) => contents.clone().into_bytes(),
        _ => return Err(StagingError::Source),
    };

    let body = if rewrite_metrics { rewrite_metrics_header(&key, body) } else { body };
    let size = body.len();
    store.put_object(&bucket, &key, body).await?;
    info!("Staged {size} bytes at s3://{bucket}/{key}");

    Ok(UploadedObject { bucket, key, size })
}
