mod builder;
mod table;

pub use builder::{
    build_datafile_metadata, DESCRIPTION_COLUMN, FILENAME_COLUMN, FILE_PART_COLUMN,
};
pub use table::{Row, Table};
