use crate::config::UploadConfig;
use crate::metadata::{Table, DESCRIPTION_COLUMN, FILENAME_COLUMN};
use crate::upload::direct::{DirectUploadRequest, DirectUploader};
use crate::upload::types::{ApiHandle, FileStatus, UploadOutcome, UploadRecord, UploadStatus};
use std::path::Path;
use tracing::{error, info, warn};

pub const DEFAULT_MIME_TYPE: &str = "application/zip";
pub const DEFAULT_RETRIES: u32 = 10;
const CATEGORIES: [&str; 1] = ["Data"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    pub mime_type: String,
    pub retries: u32,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            mime_type: DEFAULT_MIME_TYPE.to_string(),
            retries: DEFAULT_RETRIES,
        }
    }
}

impl From<&UploadConfig> for UploadOptions {
    fn from(config: &UploadConfig) -> Self {
        Self {
            mime_type: config.mime_type.clone(),
            retries: config.retries,
        }
    }
}

/// Uploads every datafile named in a metadata table and finalizes them as
/// one batch on the dataset.
pub struct FileProcessor<U> {
    uploader: U,
    options: UploadOptions,
}

impl<U: DirectUploader> FileProcessor<U> {
    pub fn new(uploader: U, options: UploadOptions) -> Self {
        Self { uploader, options }
    }

    pub fn options(&self) -> &UploadOptions {
        &self.options
    }

    /// Upload each row of `metadata` from `data_directory`, then finalize the
    /// successful uploads with a single call.
    ///
    /// A failed file is recorded in the outcome's error list and does not stop
    /// the batch. Finalize runs even when some (or all) files failed.
    pub fn process_files(
        &self,
        api: Option<&ApiHandle>,
        dataverse_url: &str,
        dataset_pid: &str,
        data_directory: &Path,
        metadata: &Table,
    ) -> UploadOutcome {
        let api = match api {
            Some(api) if !api.api_token.is_empty() => api,
            _ => {
                error!("Missing API token, refusing to upload");
                return UploadOutcome::rejected();
            }
        };
        if dataverse_url.is_empty() || dataset_pid.is_empty() || metadata.is_empty() {
            error!("Missing Dataverse URL, dataset PID or metadata, refusing to upload");
            return UploadOutcome::rejected();
        }

        let key = api.api_token.as_str();
        let mut errors = Vec::new();
        let mut file_statuses = Vec::with_capacity(metadata.len());
        let mut json_data = Vec::with_capacity(metadata.len());

        info!(
            "Uploading {} datafile(s) to {} ({})",
            metadata.len(),
            dataset_pid,
            dataverse_url
        );

        for (idx, row) in metadata.rows() {
            let description = row.get(DESCRIPTION_COLUMN).unwrap_or_default();
            let filename = match row.get(FILENAME_COLUMN) {
                Some(name) if !name.is_empty() => name,
                _ => {
                    let msg = format!("Warning: Failed to upload: row {} has no filename", idx);
                    warn!("{}", msg);
                    file_statuses.push(FileStatus {
                        name: format!("row {}", idx),
                        status: UploadStatus::Failed("No filename".to_string()),
                    });
                    errors.push(msg);
                    continue;
                }
            };

            info!("Uploading {} ({}/{})", filename, idx + 1, metadata.len());
            let request = DirectUploadRequest {
                dataverse_url,
                dataset_pid,
                api_token: key,
                filename,
                data_directory,
                mime_type: &self.options.mime_type,
                retries: self.options.retries,
            };

            match self.uploader.direct_upload(&request) {
                Ok(record) => {
                    json_data.push(Self::annotate(record, description));
                    file_statuses.push(FileStatus {
                        name: filename.to_string(),
                        status: UploadStatus::Success,
                    });
                }
                Err(e) => {
                    warn!("Upload of {} failed: {}", filename, e);
                    errors.push(format!("Warning: Failed to upload: {}", filename));
                    file_statuses.push(FileStatus {
                        name: filename.to_string(),
                        status: UploadStatus::Failed(e.to_string()),
                    });
                }
            }
        }

        info!("Finalizing {} uploaded datafile(s)", json_data.len());
        let finalize_succeeded =
            match self
                .uploader
                .finalize_direct_upload(dataverse_url, dataset_pid, &json_data, key)
            {
                Ok(()) => true,
                Err(e) => {
                    error!("Finalize failed for {}: {}", dataset_pid, e);
                    false
                }
            };

        UploadOutcome {
            success: errors.is_empty(),
            errors,
            finalize_succeeded,
            file_statuses,
        }
    }

    fn annotate(mut record: UploadRecord, description: &str) -> UploadRecord {
        record.insert("description", description);
        record.insert("categories", CATEGORIES.to_vec());
        record
    }
}
