use crate::dataverse::responses::{ApiResponse, UploadPlan, UploadUrls};
use crate::error::{Error, Result};
use crate::upload::{DirectUploadRequest, DirectUploader, UploadRecord};
use reqwest::blocking::{multipart, Body, Client, Response};
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::{debug, info, warn};

const API_KEY_HEADER: &str = "X-Dataverse-key";
const TEMP_TAG_HEADER: &str = "x-amz-tagging";
const TEMP_TAG_VALUE: &str = "dv-state=temp";

/// Blocking client for the Dataverse direct-upload API.
#[derive(Clone)]
pub struct DataverseClient {
    client: Client,
}

impl DataverseClient {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("dataverse-uploader/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn request_upload_urls(
        &self,
        request: &DirectUploadRequest<'_>,
        size: u64,
    ) -> Result<UploadUrls> {
        let url = api_url(request.dataverse_url, "/api/datasets/:persistentId/uploadurls");
        debug!("Requesting upload URLs from {}", url);
        let size = size.to_string();
        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, request.api_token)
            .query(&[("persistentId", request.dataset_pid), ("size", size.as_str())])
            .send()?;
        let response = check_status(response)?;
        response.json::<ApiResponse<UploadUrls>>()?.into_data()
    }

    fn put_single(&self, url: &str, path: &Path, size: u64) -> Result<()> {
        let file = File::open(path)?;
        let response = self
            .client
            .put(url)
            .header(TEMP_TAG_HEADER, TEMP_TAG_VALUE)
            .body(Body::sized(file, size))
            .send()?;
        check_status(response)?;
        Ok(())
    }

    /// Upload each presigned part straight from the file, then hand the
    /// collected ETags to the installation's `complete` endpoint.
    ///
    /// Part URLs are signed without the temp tag, so unlike a single-part PUT
    /// they must not carry `x-amz-tagging`.
    fn put_multipart(
        &self,
        request: &DirectUploadRequest<'_>,
        path: &Path,
        size: u64,
        parts: &[(u32, &str)],
        part_size: u64,
        complete: &str,
    ) -> Result<()> {
        let file = File::open(path)?;
        let mut etags = Map::new();

        for (number, url) in parts {
            let offset = u64::from(number.saturating_sub(1)) * part_size;
            let len = part_size.min(size.saturating_sub(offset));
            let mut part = file.try_clone()?;
            part.seek(SeekFrom::Start(offset))?;
            debug!(part = *number, bytes = len, "Uploading part");

            let response = self
                .client
                .put(*url)
                .body(Body::sized(part.take(len), len))
                .send()?;
            let response = check_status(response)?;
            let etag = response
                .headers()
                .get(reqwest::header::ETAG)
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| Error::Api(format!("part {} returned no ETag", number)))?;
            etags.insert(number.to_string(), Value::String(etag.to_string()));
        }

        let response = self
            .client
            .put(api_url(request.dataverse_url, complete))
            .header(API_KEY_HEADER, request.api_token)
            .json(&etags)
            .send()?;
        check_status(response)?;
        Ok(())
    }

    fn abort_multipart(&self, request: &DirectUploadRequest<'_>, abort: &str) {
        let result = self
            .client
            .delete(api_url(request.dataverse_url, abort))
            .header(API_KEY_HEADER, request.api_token)
            .send();
        if let Err(e) = result {
            warn!("Failed to abort multipart upload of {}: {}", request.filename, e);
        }
    }

    fn try_upload(
        &self,
        request: &DirectUploadRequest<'_>,
        path: &Path,
        size: u64,
    ) -> Result<UploadRecord> {
        let urls = self.request_upload_urls(request, size)?;

        match urls.plan()? {
            UploadPlan::Single(url) => self.put_single(url, path, size)?,
            UploadPlan::Multipart {
                parts,
                part_size,
                complete,
                abort,
            } => {
                if let Err(e) = self.put_multipart(request, path, size, &parts, part_size, complete) {
                    if let Some(abort) = abort {
                        self.abort_multipart(request, abort);
                    }
                    return Err(e);
                }
            }
        }

        let checksum = sha256_file(path)?;
        Ok(build_record(
            &urls.storage_identifier,
            request.filename,
            request.mime_type,
            &checksum,
        ))
    }
}

impl DirectUploader for DataverseClient {
    fn direct_upload(&self, request: &DirectUploadRequest<'_>) -> Result<UploadRecord> {
        let path = request.data_directory.join(request.filename);
        let size = fs::metadata(&path)?.len();
        let attempts = request.retries.max(1);
        info!(file = request.filename, bytes = size, "Direct upload");

        let mut last_error = None;
        for attempt in 1..=attempts {
            match self.try_upload(request, &path, size) {
                Ok(record) => return Ok(record),
                Err(e) => {
                    warn!(
                        "Attempt {}/{} for {} failed: {}",
                        attempt, attempts, request.filename, e
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(Error::RetriesExhausted {
            filename: request.filename.to_string(),
            attempts,
            last_error: last_error.map(|e| e.to_string()).unwrap_or_default(),
        })
    }

    fn finalize_direct_upload(
        &self,
        dataverse_url: &str,
        dataset_pid: &str,
        records: &[UploadRecord],
        api_token: &str,
    ) -> Result<()> {
        let url = api_url(dataverse_url, "/api/datasets/:persistentId/addFiles");
        let form = multipart::Form::new().text("jsonData", serde_json::to_string(records)?);
        debug!("Registering {} file(s) at {}", records.len(), url);

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, api_token)
            .query(&[("persistentId", dataset_pid)])
            .multipart(form)
            .send()?;
        let response = check_status(response)?;
        response.json::<ApiResponse<Value>>()?.ensure_ok()
    }
}

fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(Error::Api(format!("HTTP {}: {}", status.as_u16(), body.trim())))
}

/// Join an installation base URL and an API path.
pub fn api_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

fn build_record(
    storage_identifier: &str,
    filename: &str,
    mime_type: &str,
    checksum: &str,
) -> UploadRecord {
    let mut record = UploadRecord::new();
    record.insert("storageIdentifier", storage_identifier);
    record.insert("fileName", filename);
    record.insert("mimeType", mime_type);
    record.insert("checksum", json!({"@type": "SHA-256", "@value": checksum}));
    record
}
