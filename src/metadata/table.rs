use crate::error::{Error, Result};
use arrow::array::{Array, ArrayRef, AsArray, StringArray};
use arrow::compute::{concat, concat_batches};
use arrow::csv::{reader::Format, ReaderBuilder, WriterBuilder};
use arrow::datatypes::{DataType, Field, FieldRef, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;

/// Column-named table of UTF-8 cells backed by an arrow [`RecordBatch`].
///
/// Rows keep insertion order. Arrays are immutable, so a clone never
/// observes changes made through the original and vice versa.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    batch: RecordBatch,
}

/// Borrowed view of one table row.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    batch: &'a RecordBatch,
    idx: usize,
}

impl<'a> Row<'a> {
    /// Cell value, `None` when the column is absent or the cell is null.
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let array = self.batch.column_by_name(column)?.as_string_opt::<i32>()?;
        (!array.is_null(self.idx)).then(|| array.value(self.idx))
    }
}

fn utf8_schema<I, S>(columns: I) -> SchemaRef
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let fields: Vec<Field> = columns
        .into_iter()
        .map(|name| Field::new(name, DataType::Utf8, true))
        .collect();
    Arc::new(Schema::new(fields))
}

impl Default for Table {
    fn default() -> Self {
        Self {
            batch: RecordBatch::new_empty(Arc::new(Schema::empty())),
        }
    }
}

impl Table {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            batch: RecordBatch::new_empty(utf8_schema(columns)),
        }
    }

    pub fn push_row<I, S>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        if values.len() != self.batch.num_columns() {
            return Err(Error::RowWidth {
                expected: self.batch.num_columns(),
                actual: values.len(),
            });
        }
        // A table without columns cannot hold rows.
        if values.is_empty() {
            return Ok(());
        }

        let columns = self
            .batch
            .columns()
            .iter()
            .zip(values)
            .map(|(column, value)| {
                let tail = StringArray::from(vec![value]);
                concat(&[column.as_ref(), &tail as &dyn Array])
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        self.batch = RecordBatch::try_new(self.batch.schema(), columns)?;
        Ok(())
    }

    /// True when the table has no rows or no columns.
    pub fn is_empty(&self) -> bool {
        self.batch.num_rows() == 0 || self.batch.num_columns() == 0
    }

    pub fn len(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn columns(&self) -> Vec<&str> {
        self.batch
            .schema_ref()
            .fields()
            .iter()
            .map(|f| f.name().as_str())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.batch.column_by_name(name).is_some()
    }

    pub fn record_batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn rows(&self) -> impl Iterator<Item = (usize, Row<'_>)> + '_ {
        (0..self.batch.num_rows()).map(move |idx| {
            (
                idx,
                Row {
                    batch: &self.batch,
                    idx,
                },
            )
        })
    }

    /// Assign `values` to `name`, aligned to row order. An existing column is
    /// overwritten, otherwise the column is appended.
    pub fn set_column<I, S>(&mut self, name: &str, values: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        if values.len() != self.batch.num_rows() {
            return Err(Error::ColumnLength {
                column: name.to_string(),
                expected: self.batch.num_rows(),
                actual: values.len(),
            });
        }

        let array: ArrayRef = Arc::new(StringArray::from(values));
        let schema = self.batch.schema();
        let mut columns = self.batch.columns().to_vec();

        let schema = match schema.index_of(name) {
            Ok(idx) => {
                columns[idx] = array;
                schema
            }
            Err(_) => {
                let mut fields: Vec<FieldRef> = schema.fields().iter().cloned().collect();
                fields.push(Arc::new(Field::new(name, DataType::Utf8, true)));
                columns.push(array);
                Arc::new(Schema::new(fields))
            }
        };

        self.batch = RecordBatch::try_new(schema, columns)?;
        Ok(())
    }

    /// Read a headed CSV. Every column is loaded as text.
    pub fn from_csv_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;

        let (inferred, _) = Format::default()
            .with_header(true)
            .infer_schema(data.as_slice(), Some(0))?;
        if inferred.fields().is_empty() {
            return Ok(Self::default());
        }
        let schema = utf8_schema(inferred.fields().iter().map(|f| f.name().clone()));

        let csv_reader = ReaderBuilder::new(schema.clone())
            .with_header(true)
            .build(data.as_slice())?;
        let batches = csv_reader.collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            batch: concat_batches(&schema, &batches)?,
        })
    }

    pub fn from_csv_path(path: &Path) -> Result<Self> {
        Self::from_csv_reader(File::open(path)?)
    }

    pub fn to_csv_writer<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = WriterBuilder::new().with_header(true).build(writer);
        csv_writer.write(&self.batch)?;
        Ok(())
    }

    pub fn to_csv_path(&self, path: &Path) -> Result<()> {
        self.to_csv_writer(File::create(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        let mut table = Table::new(["file_part", "filename"]);
        table.push_row(["1", "a.zip"]).unwrap();
        table.push_row(["2", "b.zip"]).unwrap();
        table
    }

    #[test]
    fn empty_without_rows_or_columns() {
        assert!(Table::default().is_empty());
        assert!(Table::new(["filename"]).is_empty());
        assert!(!sample().is_empty());
    }

    #[test]
    fn push_row_rejects_wrong_width() {
        let mut table = Table::new(["a", "b"]);
        let err = table.push_row(["only one"]).unwrap_err();
        assert!(matches!(err, Error::RowWidth { expected: 2, actual: 1 }));
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn rows_yield_index_and_cells() {
        let table = sample();
        let collected: Vec<_> = table
            .rows()
            .map(|(idx, row)| (idx, row.get("filename").unwrap().to_string()))
            .collect();
        assert_eq!(collected, vec![(0, "a.zip".to_string()), (1, "b.zip".to_string())]);
        assert!(table.rows().next().unwrap().1.get("missing").is_none());
    }

    #[test]
    fn backed_by_utf8_record_batch() {
        let table = sample();
        let batch = table.record_batch();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.schema().field(1).data_type(), &DataType::Utf8);
    }

    #[test]
    fn set_column_appends_then_overwrites() {
        let mut table = sample();
        table.set_column("description", ["x", "y"]).unwrap();
        assert_eq!(table.columns(), vec!["file_part", "filename", "description"]);
        table.set_column("description", ["p", "q"]).unwrap();
        assert_eq!(table.columns().len(), 3);
        let (_, last) = table.rows().last().unwrap();
        assert_eq!(last.get("description"), Some("q"));
    }

    #[test]
    fn set_column_length_mismatch() {
        let mut table = sample();
        let err = table.set_column("description", ["only one"]).unwrap_err();
        assert!(matches!(err, Error::ColumnLength { expected: 2, actual: 1, .. }));
        assert!(!table.has_column("description"));
    }

    #[test]
    fn clone_is_unaffected_by_later_changes() {
        let original = sample();
        let mut copy = original.clone();
        copy.set_column("filename", ["x.zip", "y.zip"]).unwrap();
        copy.push_row(["3", "z.zip"]).unwrap();

        assert_eq!(original.len(), 2);
        let (_, first) = original.rows().next().unwrap();
        assert_eq!(first.get("filename"), Some("a.zip"));
    }

    #[test]
    fn csv_round_trip_keeps_order_and_extra_columns() {
        let input = "file_part,filename,size\n2,b.zip,10\n1,a.zip,20\n";
        let table = Table::from_csv_reader(input.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.has_column("size"));
        let (_, first) = table.rows().next().unwrap();
        assert_eq!(first.get("size"), Some("10"));

        let mut out = Vec::new();
        table.to_csv_writer(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), input);
    }

    #[test]
    fn header_only_csv_is_empty() {
        let table = Table::from_csv_reader("file_part,filename\n".as_bytes()).unwrap();
        assert!(table.is_empty());
        assert!(table.has_column("filename"));
    }
}
