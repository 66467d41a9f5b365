//! Dataverse native API client implementing the direct-upload protocol.

mod client;
mod responses;

pub use client::{api_url, sha256_file, DataverseClient};
pub use responses::{ApiResponse, UploadPlan, UploadUrls};

/// Landing page of a dataset in the Dataverse web UI.
pub fn dataset_page_url(dataverse_url: &str, dataset_pid: &str) -> String {
    format!(
        "{}?persistentId={}",
        api_url(dataverse_url, "/dataset.xhtml"),
        dataset_pid
    )
}
