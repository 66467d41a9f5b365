mod direct;
mod file_processor;
mod types;

pub use direct::{DirectUploadRequest, DirectUploader};
pub use file_processor::{FileProcessor, UploadOptions, DEFAULT_MIME_TYPE, DEFAULT_RETRIES};
pub use types::{ApiHandle, FileStatus, UploadOutcome, UploadRecord, UploadStatus};
