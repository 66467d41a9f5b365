//! Prepare per-file metadata for a batch of datafiles and push them to a
//! Dataverse dataset with the direct-upload protocol.
//!
//! The pipeline is one-way: an inventory table goes through
//! [`build_datafile_metadata`], and the resulting metadata table is handed to
//! a [`FileProcessor`], which uploads each file through a [`DirectUploader`]
//! and finalizes the batch with a single call.

pub mod config;
pub mod dataverse;
pub mod error;
pub mod metadata;
pub mod upload;
pub mod utils;

pub use config::Config;
pub use dataverse::DataverseClient;
pub use error::{Error, Result};
pub use metadata::{build_datafile_metadata, Table};
pub use upload::{ApiHandle, DirectUploader, FileProcessor, UploadOptions, UploadOutcome};
