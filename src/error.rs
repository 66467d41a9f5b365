use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The inventory lacks a column the metadata builder needs.
    #[error("Inventory is missing required field: {0}")]
    MissingField(String),

    #[error("Column '{column}' has {actual} values but the table has {expected} rows")]
    ColumnLength {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("Row has {actual} values but the table has {expected} columns")]
    RowWidth { expected: usize, actual: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Table error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Dataverse API error: {0}")]
    Api(String),

    #[error("Failed to upload {filename} after {attempts} attempt(s): {last_error}")]
    RetriesExhausted {
        filename: String,
        attempts: u32,
        last_error: String,
    },

    #[error("Config error: {0}")]
    Config(String),
}

// Convenient crate-wide result type
pub type Result<T> = std::result::Result<T, Error>;
