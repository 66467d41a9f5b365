use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;

/// Envelope used by every Dataverse native API response.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub status: String,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn into_data(self) -> Result<T> {
        if self.status != "OK" {
            return Err(Error::Api(
                self.message
                    .unwrap_or_else(|| format!("status {}", self.status)),
            ));
        }
        self.data
            .ok_or_else(|| Error::Api("response has no data".to_string()))
    }

    pub fn ensure_ok(&self) -> Result<()> {
        if self.status == "OK" {
            Ok(())
        } else {
            Err(Error::Api(
                self.message
                    .clone()
                    .unwrap_or_else(|| format!("status {}", self.status)),
            ))
        }
    }
}

/// Answer of `/api/datasets/:persistentId/uploadurls`.
///
/// Small files get a single presigned `url`; large ones get numbered part
/// `urls` plus `complete`/`abort` endpoints relative to the installation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrls {
    pub storage_identifier: String,
    pub url: Option<String>,
    pub urls: Option<HashMap<String, String>>,
    pub part_size: Option<u64>,
    pub complete: Option<String>,
    pub abort: Option<String>,
}

pub enum UploadPlan<'a> {
    Single(&'a str),
    Multipart {
        parts: Vec<(u32, &'a str)>,
        part_size: u64,
        complete: &'a str,
        abort: Option<&'a str>,
    },
}

impl UploadUrls {
    pub fn plan(&self) -> Result<UploadPlan<'_>> {
        if let Some(url) = &self.url {
            return Ok(UploadPlan::Single(url));
        }

        let urls = self
            .urls
            .as_ref()
            .ok_or_else(|| Error::Api("upload URL response has no url(s)".to_string()))?;
        let part_size = self
            .part_size
            .filter(|size| *size > 0)
            .ok_or_else(|| Error::Api("multipart upload without partSize".to_string()))?;
        let complete = self
            .complete
            .as_deref()
            .ok_or_else(|| Error::Api("multipart upload without complete URL".to_string()))?;

        let mut parts = urls
            .iter()
            .map(|(number, url)| {
                number
                    .parse::<u32>()
                    .map(|n| (n, url.as_str()))
                    .map_err(|_| Error::Api(format!("invalid part number: {}", number)))
            })
            .collect::<Result<Vec<_>>>()?;
        parts.sort_by_key(|(number, _)| *number);

        Ok(UploadPlan::Multipart {
            parts,
            part_size,
            complete,
            abort: self.abort.as_deref(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_part_plan() {
        let body = r#"{"status":"OK","data":{"url":"https://s3.example/put?sig=1","partSize":1073741824,"storageIdentifier":"s3://bucket:18b2a"}}"#;
        let response: ApiResponse<UploadUrls> = serde_json::from_str(body).unwrap();
        let urls = response.into_data().unwrap();
        assert_eq!(urls.storage_identifier, "s3://bucket:18b2a");
        assert!(matches!(urls.plan().unwrap(), UploadPlan::Single("https://s3.example/put?sig=1")));
    }

    #[test]
    fn multipart_plan_orders_parts_numerically() {
        let body = r#"{"status":"OK","data":{
            "urls":{"10":"u10","2":"u2","1":"u1"},
            "abort":"/api/datasets/mpupload?uploadid=x&storageidentifier=y",
            "complete":"/api/datasets/mpupload?uploadid=x&storageidentifier=y",
            "partSize":5242880,
            "storageIdentifier":"s3://bucket:18b2b"}}"#;
        let response: ApiResponse<UploadUrls> = serde_json::from_str(body).unwrap();
        let urls = response.into_data().unwrap();
        match urls.plan().unwrap() {
            UploadPlan::Multipart {
                parts,
                part_size,
                abort,
                ..
            } => {
                assert_eq!(parts, vec![(1, "u1"), (2, "u2"), (10, "u10")]);
                assert_eq!(part_size, 5242880);
                assert!(abort.is_some());
            }
            UploadPlan::Single(_) => panic!("expected multipart plan"),
        }
    }

    #[test]
    fn multipart_without_complete_is_error() {
        let body = r#"{"urls":{"1":"u1"},"partSize":5,"storageIdentifier":"s3://b:1"}"#;
        let urls: UploadUrls = serde_json::from_str(body).unwrap();
        assert!(urls.plan().is_err());
    }

    #[test]
    fn error_status_carries_message() {
        let body = r#"{"status":"ERROR","message":"Bad api key "}"#;
        let response: ApiResponse<UploadUrls> = serde_json::from_str(body).unwrap();
        assert!(response.ensure_ok().is_err());
        let err = response.into_data().unwrap_err();
        assert!(err.to_string().contains("Bad api key"));
    }
}
