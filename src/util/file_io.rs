
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Returns true if the path ends in `.gz`
pub fn is_gzipped(filename: &Path) -> bool {
    filename.extension().unwrap_or_default() == "gz"
}

/// Picks the table delimiter from the file extension, ignoring any trailing `.gz`.
/// `.tsv` gives a tab, everything else gives a comma.
/// # Arguments
/// * `filename` - the output path the table will be written to
pub fn table_delimiter(filename: &Path) -> u8 {
    let core_name = if is_gzipped(filename) {
        Path::new(filename.file_stem().unwrap_or_default())
    } else {
        filename
    };
    let is_tsv: bool = core_name.extension().unwrap_or_default() == "tsv";
    if is_tsv { b'\t' } else { b',' }
}

/// Opens a file for buffered reading, transparently decompressing `.gz` files
/// # Arguments
/// * `filename` - the file path to open
/// # Errors
/// * if the file cannot be opened
pub fn open_input(filename: &Path) -> std::io::Result<Box<dyn BufRead + Send>> {
    let file = File::open(filename)?;
    let reader: Box<dyn BufRead + Send> = if is_gzipped(filename) {
        Box::new(BufReader::new(flate2::read::MultiGzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };
    Ok(reader)
}

/// Creates a file for buffered writing, compressing the output if the path ends in `.gz`
/// # Arguments
/// * `filename` - the file path to create, overwritten if present
/// # Errors
/// * if the file cannot be created
pub fn create_output(filename: &Path) -> std::io::Result<Box<dyn Write + Send>> {
    let file = File::create(filename)?;
    let writer: Box<dyn Write + Send> = if is_gzipped(filename) {
        Box::new(BufWriter::new(
            flate2::write::GzEncoder::new(file, flate2::Compression::default())
        ))
    } else {
        Box::new(BufWriter::new(file))
    };
    Ok(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::path::PathBuf;

    #[test]
    fn test_table_delimiter() {
        assert_eq!(table_delimiter(&PathBuf::from("variants.csv")), b',');
        assert_eq!(table_delimiter(&PathBuf::from("variants.tsv")), b'\t');
        assert_eq!(table_delimiter(&PathBuf::from("variants.tsv.gz")), b'\t');
        assert_eq!(table_delimiter(&PathBuf::from("variants.csv.gz")), b',');
        assert_eq!(table_delimiter(&PathBuf::from("variants")), b',');
    }

    #[test]
    fn test_gzip_round_trip() {
        let filename = std::env::temp_dir().join(format!("refdiff_file_io_{}.txt.gz", std::process::id()));
        {
            let mut writer = create_output(&filename).unwrap();
            writer.write_all(b">s1\nACGT\n").unwrap();
            writer.flush().unwrap();
        }

        let mut text = String::new();
        open_input(&filename).unwrap().read_to_string(&mut text).unwrap();
        assert_eq!(text, ">s1\nACGT\n");
        std::fs::remove_file(&filename).unwrap();
    }
}
