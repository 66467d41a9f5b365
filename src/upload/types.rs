use derivative::Derivative;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Credentials for the Dataverse installation.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct ApiHandle {
    #[derivative(Debug(format_with = "redact"))]
    pub api_token: String,
}

fn redact(_: &String, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    f.write_str("\"***\"")
}

impl ApiHandle {
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
        }
    }
}

/// Per-file JSON record produced by a direct upload and later sent to the
/// dataset's `addFiles` endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UploadRecord(Map<String, Value>);

impl UploadRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

impl From<Map<String, Value>> for UploadRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStatus {
    Success,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStatus {
    pub name: String,
    pub status: UploadStatus,
}

/// Result of uploading a metadata table.
///
/// `success` only reflects the per-file uploads; the finalize step is
/// reported separately in `finalize_succeeded`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadOutcome {
    pub success: bool,
    pub errors: Vec<String>,
    pub finalize_succeeded: bool,
    pub file_statuses: Vec<FileStatus>,
}

impl UploadOutcome {
    /// Outcome for a call rejected before any network activity.
    pub fn rejected() -> Self {
        Self::default()
    }

    pub fn as_triple(&self) -> (bool, &[String], bool) {
        (self.success, self.errors.as_slice(), self.finalize_succeeded)
    }
}
