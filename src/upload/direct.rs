use crate::error::Result;
use crate::upload::types::UploadRecord;
use std::path::Path;

/// Everything needed to push one datafile through a direct upload.
#[derive(Debug, Clone, Copy)]
pub struct DirectUploadRequest<'a> {
    pub dataverse_url: &'a str,
    pub dataset_pid: &'a str,
    pub api_token: &'a str,
    pub filename: &'a str,
    pub data_directory: &'a Path,
    pub mime_type: &'a str,
    pub retries: u32,
}

/// Direct-upload transport. Retries for a single file are the
/// implementation's business; callers only see the final result.
pub trait DirectUploader {
    fn direct_upload(&self, request: &DirectUploadRequest<'_>) -> Result<UploadRecord>;

    fn finalize_direct_upload(
        &self,
        dataverse_url: &str,
        dataset_pid: &str,
        records: &[UploadRecord],
        api_token: &str,
    ) -> Result<()>;
}

impl<U: DirectUploader + ?Sized> DirectUploader for &U {
    fn direct_upload(&self, request: &DirectUploadRequest<'_>) -> Result<UploadRecord> {
        (**self).direct_upload(request)
    }

    fn finalize_direct_upload(
        &self,
        dataverse_url: &str,
        dataset_pid: &str,
        records: &[UploadRecord],
        api_token: &str,
    ) -> Result<()> {
        (**self).finalize_direct_upload(dataverse_url, dataset_pid, records, api_token)
    }
}
