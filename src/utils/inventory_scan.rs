use crate::error::{Error, Result};
use crate::metadata::{Table, FILENAME_COLUMN, FILE_PART_COLUMN};
use glob::Pattern;
use ignore::WalkBuilder;
use std::path::Path;
use tracing::{debug, info};

pub const DEFAULT_PATTERN: &str = "*.zip";

/// Build an inventory from the datafiles sitting directly in `data_directory`.
///
/// Files whose name matches `pattern` are numbered `1..=N` in file-name order.
/// Hidden and ignored files are skipped the same way `ignore` skips them.
pub fn scan_inventory(data_directory: &Path, pattern: &str) -> Result<Table> {
    let pattern = Pattern::new(pattern)
        .map_err(|e| Error::Config(format!("Invalid file pattern '{}': {}", pattern, e)))?;
    if !data_directory.is_dir() {
        return Err(Error::Config(format!(
            "Data directory not found: {}",
            data_directory.display()
        )));
    }

    let mut filenames = Vec::new();
    for entry in WalkBuilder::new(data_directory).max_depth(Some(1)).build() {
        let entry = entry.map_err(|e| Error::Io(std::io::Error::other(e)))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if pattern.matches(name) {
                filenames.push(name.to_string());
            } else {
                debug!("Skipping {}", name);
            }
        }
    }
    filenames.sort();

    let mut inventory = Table::new([FILE_PART_COLUMN, FILENAME_COLUMN]);
    for (idx, name) in filenames.into_iter().enumerate() {
        inventory.push_row([(idx + 1).to_string(), name])?;
    }
    info!(
        "Found {} datafile(s) matching {} in {}",
        inventory.len(),
        pattern,
        data_directory.display()
    );

    Ok(inventory)
}
