use crate::error::{Error, Result};
use crate::upload::{DEFAULT_MIME_TYPE, DEFAULT_RETRIES};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub dataverse: DataverseConfig,
    #[serde(default)]
    pub upload: UploadConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DataverseConfig {
    /// Base URL of the installation, e.g. "https://dataverse.harvard.edu"
    pub server_url: Option<String>,
    /// Can also be given with --api-token or DATAVERSE_API_TOKEN.
    pub api_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadConfig {
    #[serde(default = "default_mime_type")]
    pub mime_type: String,
    /// Attempts per file before it is reported as failed.
    #[serde(default = "default_retries")]
    pub retries: u32,
}

fn default_mime_type() -> String {
    DEFAULT_MIME_TYPE.to_string()
}

fn default_retries() -> u32 {
    DEFAULT_RETRIES
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            mime_type: default_mime_type(),
            retries: default_retries(),
        }
    }
}

impl Config {
    /// Platform config location, e.g. `~/.config/dataverse-uploader/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("org", "dataverse", "dataverse-uploader")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load an explicit config file, or the default one if it exists.
    ///
    /// A missing default file yields the built-in defaults; a missing
    /// explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                path.to_path_buf()
            }
            None => match Self::default_path() {
                Some(path) if path.exists() => path,
                _ => {
                    debug!("No config file, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        debug!("Reading config from {:?}", path);
        let content = fs::read_to_string(&path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.upload.mime_type.trim().is_empty() {
            return Err(Error::Config("upload.mime_type must not be empty".to_string()));
        }
        if self.upload.retries == 0 {
            return Err(Error::Config("upload.retries must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.upload.mime_type, "application/zip");
        assert_eq!(config.upload.retries, 10);
        assert!(config.dataverse.server_url.is_none());
    }

    #[test]
    fn values_override_defaults() {
        let config = Config::from_toml(
            r#"
            [dataverse]
            server_url = "https://dataverse.harvard.edu"

            [upload]
            retries = 3
            "#,
        )
        .unwrap();
        assert_eq!(
            config.dataverse.server_url.as_deref(),
            Some("https://dataverse.harvard.edu")
        );
        assert_eq!(config.upload.retries, 3);
        assert_eq!(config.upload.mime_type, "application/zip");
    }

    #[test]
    fn zero_retries_rejected() {
        let err = Config::from_toml("[upload]\nretries = 0\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn load_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[upload]\nmime_type = \"application/gzip\"").unwrap();
        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.upload.mime_type, "application/gzip");
    }

    #[test]
    fn missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(dir.path().join("nope.toml").as_path())).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
