
use serde::Serialize;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::data_types::variant_row::VariantRow;
use crate::util::file_io::{create_output, table_delimiter};
use crate::writers::VariantSink;

/// Column labels of the variant table, always written first
pub const VARIANT_TABLE_HEADER: [&str; 5] = [
    "COG-ID",
    "Position",
    "Reference_Base",
    "Alternate_Base",
    "Is_Indel"
];

/// Writes the main variant table, one line per emitted row
pub struct VariantTableWriter<W: Write> {
    /// Handle on the writer
    csv_writer: csv::Writer<W>,
}

/// Contains all the data written to each row of the variant table
#[derive(Serialize)]
struct VariantTableRow<'a> {
    /// Sample identifier
    sample_id: &'a str,
    /// 1-based reference position
    position: u64,
    /// Reference base, empty for deletions
    reference_base: &'a str,
    /// Alternate base, `N`, or `<len>D`
    alternate_base: &'a str,
    /// 1 for deletions, 0 otherwise
    is_indel: u8,
}

impl<'a> VariantTableRow<'a> {
    /// Creates a new table row from a variant row
    fn new(row: &'a VariantRow) -> Self {
        Self {
            sample_id: row.sample_id(),
            position: row.position(),
            reference_base: row.reference_base(),
            alternate_base: row.alternate_base(),
            is_indel: if row.is_indel() { 1 } else { 0 },
        }
    }
}

impl VariantTableWriter<Box<dyn Write + Send>> {
    /// Creates a table writer on a file.
    /// The delimiter is a tab for `.tsv` and a comma otherwise; `.gz` paths are compressed.
    /// # Arguments
    /// * `filename` - path to the output file
    pub fn from_path(filename: &Path) -> csv::Result<Self> {
        let delimiter = table_delimiter(filename);
        let writer = create_output(filename)?;
        Self::with_delimiter(writer, delimiter)
    }

    /// Creates a comma-delimited table writer on stdout
    pub fn stdout() -> csv::Result<Self> {
        let writer: Box<dyn Write + Send> = Box::new(BufWriter::new(std::io::stdout()));
        Self::with_delimiter(writer, b',')
    }
}

impl<W: Write> VariantTableWriter<W> {
    /// Creates a comma-delimited table writer on any output
    pub fn from_writer(writer: W) -> csv::Result<Self> {
        Self::with_delimiter(writer, b',')
    }

    /// Creates a table writer with a specific delimiter and writes the header line.
    /// # Arguments
    /// * `writer` - the output handle
    /// * `delimiter` - field separator
    pub fn with_delimiter(writer: W, delimiter: u8) -> csv::Result<Self> {
        // header is written by hand so it appears even when no rows are emitted
        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .from_writer(writer);
        csv_writer.write_record(VARIANT_TABLE_HEADER)?;
        Ok(Self {
            csv_writer
        })
    }

    /// Flushes and returns the underlying writer
    pub fn into_inner(self) -> std::io::Result<W> {
        self.csv_writer.into_inner()
            .map_err(|e| e.into_error())
    }
}

impl<W: Write> VariantSink for VariantTableWriter<W> {
    fn write_row(&mut self, row: &VariantRow) -> csv::Result<()> {
        self.csv_writer.serialize(VariantTableRow::new(row))
    }

    fn finish(&mut self) -> csv::Result<()> {
        self.csv_writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_only() {
        let writer = VariantTableWriter::from_writer(vec![]).unwrap();
        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(text, "COG-ID,Position,Reference_Base,Alternate_Base,Is_Indel\n");
    }

    #[test]
    fn test_rows() {
        let mut writer = VariantTableWriter::from_writer(vec![]).unwrap();
        writer.begin_sample("COG-002").unwrap();
        writer.write_row(&VariantRow::new_snv("COG-002", 2, b'T', b'C')).unwrap();
        writer.write_row(&VariantRow::new_deletion("COG-002", 3, 1)).unwrap();
        writer.write_row(&VariantRow::new_no_call("COG-002", 14, b'A')).unwrap();
        writer.finish().unwrap();

        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        let expected = "COG-ID,Position,Reference_Base,Alternate_Base,Is_Indel
COG-002,2,T,C,0
COG-002,3,,1D,1
COG-002,14,A,N,0
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_tab_delimited() {
        let mut writer = VariantTableWriter::with_delimiter(vec![], b'\t').unwrap();
        writer.write_row(&VariantRow::new_deletion("s", 5, 3)).unwrap();
        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(text, "COG-ID\tPosition\tReference_Base\tAlternate_Base\tIs_Indel\ns\t5\t\t3D\t1\n");
    }
}
