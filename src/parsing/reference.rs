
use log::debug;
use std::path::{Path, PathBuf};

use crate::data_types::sequence_record::SequenceRecord;
use crate::parsing::record_reader::{RecordError, RecordReader};

#[derive(thiserror::Error, Debug)]
pub enum ReferenceError {
    #[error("could not open reference {filename:?}: {source}")]
    Open {
        filename: PathBuf,
        #[source]
        source: std::io::Error
    },
    #[error("no records found in reference {filename:?}")]
    Empty { filename: PathBuf },
    #[error("could not read first record of reference {filename:?}: {source}")]
    Malformed {
        filename: PathBuf,
        #[source]
        source: RecordError
    },
}

/// Loads the first record of a FASTA/FASTQ file as the reference sequence.
/// Any records after the first are ignored.
/// # Arguments
/// * `filename` - path to the reference file, optionally gzipped
/// # Errors
/// * if the file cannot be opened
/// * if the file has no records
/// * if the first record is malformed or has no sequence
pub fn load_reference(filename: &Path) -> Result<SequenceRecord, ReferenceError> {
    let mut reader = RecordReader::from_path(filename)
        .map_err(|source| ReferenceError::Open { filename: filename.to_path_buf(), source })?;

    let reference = match reader.next() {
        Some(Ok(record)) => record,
        Some(Err(source)) => {
            return Err(ReferenceError::Malformed { filename: filename.to_path_buf(), source });
        },
        None => {
            return Err(ReferenceError::Empty { filename: filename.to_path_buf() });
        }
    };

    if reader.next().is_some() {
        debug!("Additional records found in {filename:?}, only the first is used.");
    }

    Ok(reference)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_reference() {
        let reference = load_reference(&PathBuf::from("test_data/reference.fa")).unwrap();
        assert_eq!(reference.identifier(), "reference");
        assert_eq!(reference.sequence(), "ATGCGGCTGAATTAA");

        // multi-record file, first one wins
        let reference = load_reference(&PathBuf::from("test_data/msa.fa")).unwrap();
        assert_eq!(reference.identifier(), "COG-001");
    }

    #[test]
    fn test_bad_references() {
        let result = load_reference(&PathBuf::from("test_data/does_not_exist.fa"));
        assert!(matches!(result, Err(ReferenceError::Open { .. })));

        let result = load_reference(&PathBuf::from("test_data/empty.fa"));
        assert!(matches!(result, Err(ReferenceError::Empty { .. })));

        let result = load_reference(&PathBuf::from("test_data/no_sequence.fa"));
        assert!(matches!(result, Err(ReferenceError::Malformed { source: RecordError::MissingSequence { .. }, .. })));
    }
}
