use crate::error::{Error, Result};
use crate::metadata::table::Table;
use tracing::{debug, info};

pub const FILE_PART_COLUMN: &str = "file_part";
pub const FILENAME_COLUMN: &str = "filename";
pub const DESCRIPTION_COLUMN: &str = "description";

/// Build per-file metadata for every datafile in `inventory` from `template`.
///
/// Each row gets a `description` of the form
/// `"{template} File part: {file_part} of {total}"`, where `total` is the
/// number of rows in the inventory at the time of the call.
///
/// An empty inventory or an empty template produces an empty table. The
/// inventory must carry both `file_part` and `filename`, otherwise
/// [`Error::MissingField`] is returned. The input is never modified.
pub fn build_datafile_metadata(inventory: &Table, template: &str) -> Result<Table> {
    if inventory.is_empty() || template.is_empty() {
        debug!("Empty inventory or template, nothing to build");
        return Ok(Table::default());
    }

    for required in [FILE_PART_COLUMN, FILENAME_COLUMN] {
        if !inventory.has_column(required) {
            return Err(Error::MissingField(required.to_string()));
        }
    }

    let mut metadata = inventory.clone();
    let num_files = metadata.len();

    let descriptions: Vec<String> = metadata
        .rows()
        .map(|(_, row)| {
            let part = row.get(FILE_PART_COLUMN).unwrap_or_default();
            format!("{} File part: {} of {}", template, part, num_files)
        })
        .collect();

    metadata.set_column(DESCRIPTION_COLUMN, descriptions)?;
    info!("Built metadata for {} datafile(s)", num_files);

    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inventory(rows: &[(&str, &str)]) -> Table {
        let mut table = Table::new([FILE_PART_COLUMN, FILENAME_COLUMN]);
        for (part, name) in rows {
            table.push_row([*part, *name]).unwrap();
        }
        table
    }

    fn descriptions(table: &Table) -> Vec<String> {
        table
            .rows()
            .map(|(_, row)| row.get(DESCRIPTION_COLUMN).unwrap().to_string())
            .collect()
    }

    #[test]
    fn two_part_archive() {
        let inv = inventory(&[("1", "a.zip"), ("2", "b.zip")]);
        let metadata = build_datafile_metadata(&inv, "Archive").unwrap();
        assert_eq!(
            descriptions(&metadata),
            vec!["Archive File part: 1 of 2", "Archive File part: 2 of 2"]
        );
    }

    #[test]
    fn total_is_row_count_not_max_part() {
        let inv = inventory(&[("7", "g.zip"), ("3", "c.zip"), ("5", "e.zip")]);
        let metadata = build_datafile_metadata(&inv, "Harvard open metadata").unwrap();
        assert_eq!(metadata.len(), 3);
        assert_eq!(
            descriptions(&metadata),
            vec![
                "Harvard open metadata File part: 7 of 3",
                "Harvard open metadata File part: 3 of 3",
                "Harvard open metadata File part: 5 of 3",
            ]
        );
    }

    #[test]
    fn extra_columns_pass_through() {
        let mut inv = Table::new(["size", FILENAME_COLUMN, FILE_PART_COLUMN]);
        inv.push_row(["100", "a.zip", "1"]).unwrap();
        let metadata = build_datafile_metadata(&inv, "T").unwrap();
        assert_eq!(
            metadata.columns(),
            &["size", FILENAME_COLUMN, FILE_PART_COLUMN, DESCRIPTION_COLUMN]
        );
        let (_, row) = metadata.rows().next().unwrap();
        assert_eq!(row.get("size"), Some("100"));
        assert_eq!(row.get(FILENAME_COLUMN), Some("a.zip"));
    }

    #[test]
    fn empty_inventory_or_template_is_noop() {
        let empty = Table::new([FILE_PART_COLUMN, FILENAME_COLUMN]);
        assert!(build_datafile_metadata(&empty, "Archive").unwrap().is_empty());

        let inv = inventory(&[("1", "a.zip")]);
        assert!(build_datafile_metadata(&inv, "").unwrap().is_empty());

        // No-op wins over schema validation.
        let malformed = Table::new(["other"]);
        assert!(build_datafile_metadata(&malformed, "").unwrap().is_empty());
    }

    #[test]
    fn missing_required_columns() {
        let mut no_part = Table::new([FILENAME_COLUMN]);
        no_part.push_row(["a.zip"]).unwrap();
        let err = build_datafile_metadata(&no_part, "Archive").unwrap_err();
        assert!(matches!(err, Error::MissingField(ref f) if f == FILE_PART_COLUMN));

        let mut no_name = Table::new([FILE_PART_COLUMN]);
        no_name.push_row(["1"]).unwrap();
        let err = build_datafile_metadata(&no_name, "Archive").unwrap_err();
        assert!(matches!(err, Error::MissingField(ref f) if f == FILENAME_COLUMN));
    }

    #[test]
    fn input_is_untouched() {
        let inv = inventory(&[("1", "a.zip"), ("2", "b.zip")]);
        let before = inv.clone();
        let _ = build_datafile_metadata(&inv, "Archive").unwrap();
        assert_eq!(inv, before);
        assert!(!inv.has_column(DESCRIPTION_COLUMN));
    }
}
