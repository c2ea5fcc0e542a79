/*!
# Record reader
Streams [`SequenceRecord`]s out of a FASTA or FASTQ source using the `noodles` readers.

The format is picked from the first non-blank byte (`@` is FASTQ, anything else is FASTA).
Malformed records are reported one at a time and the reader moves on to the next record,
so a single bad entry never hides the rest of the alignment.
*/
use log::trace;
use noodles::{fasta, fastq};
use std::io::{BufRead, ErrorKind};
use std::path::Path;

use crate::data_types::sequence_record::SequenceRecord;
use crate::util::file_io::open_input;

#[derive(thiserror::Error, Debug)]
pub enum RecordError {
    #[error("I/O error: {0}")]
    Io(#[source] std::io::Error),
    #[error("expected a '>' or '@' header line")]
    MissingHeader,
    #[error("header line is not valid UTF-8")]
    InvalidHeader,
    #[error("malformed FASTQ record: {0}")]
    Malformed(#[source] std::io::Error),
    #[error("record {identifier:?} has no sequence")]
    MissingSequence { identifier: String },
    #[error("record {identifier:?} contains non-ASCII sequence data")]
    NonAsciiSequence { identifier: String },
    #[error("record {identifier:?} is missing its quality string")]
    MissingQuality { identifier: String },
    #[error("record {identifier:?} has quality length {quality_len}, expected {sequence_len}")]
    QualityLength { identifier: String, sequence_len: usize, quality_len: usize },
}

impl RecordError {
    /// Malformed records can be skipped; I/O errors leave the stream in an unknown state
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, RecordError::Io(_))
    }
}

/// Format specific reader, chosen once the first byte of the stream is known
enum FormatReader<R: BufRead> {
    Fasta(fasta::io::Reader<R>),
    Fastq(fastq::io::Reader<R>),
}

/// Streaming FASTA/FASTQ reader that yields one record at a time.
/// FASTA records may be wrapped and separated by blank lines; FASTQ records are the usual four lines.
pub struct RecordReader<R: BufRead> {
    /// Raw input, held until the format is detected
    source: Option<R>,
    /// The active noodles reader
    format_reader: Option<FormatReader<R>>,
    /// Re-used FASTA definition line buffer
    definition_buffer: String,
    /// Re-used FASTA sequence buffer
    sequence_buffer: Vec<u8>,
    /// Re-used FASTQ record
    fastq_record: fastq::Record,
    /// Result found while resynchronizing after a bad FASTQ record
    pending: Option<Result<SequenceRecord, RecordError>>,
    /// Set once EOF or an I/O error has been seen
    is_finished: bool,
}

impl RecordReader<Box<dyn BufRead + Send>> {
    /// Opens a (optionally gzipped) sequence file for streaming
    /// # Arguments
    /// * `filename` - path to the .fa/.fasta/.fq(.gz) file to open
    pub fn from_path(filename: &Path) -> std::io::Result<Self> {
        Ok(Self::new(open_input(filename)?))
    }
}

impl<R: BufRead> RecordReader<R> {
    /// Creates a new reader over any buffered source
    pub fn new(reader: R) -> Self {
        Self {
            source: Some(reader),
            format_reader: None,
            definition_buffer: String::with_capacity(256),
            sequence_buffer: Vec::with_capacity(1 << 16),
            fastq_record: fastq::Record::default(),
            pending: None,
            is_finished: false,
        }
    }

    /// Picks the format reader on first use.
    /// Returns false if the stream holds nothing but whitespace.
    fn init_format(&mut self) -> Result<bool, RecordError> {
        if self.format_reader.is_some() {
            return Ok(true);
        }
        let Some(mut reader) = self.source.take() else {
            return Ok(false);
        };

        let first_byte = match skip_blank(&mut reader).map_err(RecordError::Io)? {
            Some(b) => b,
            None => return Ok(false)
        };
        self.format_reader = Some(if first_byte == b'@' {
            trace!("Detected FASTQ input");
            FormatReader::Fastq(fastq::io::Reader::new(reader))
        } else {
            trace!("Detected FASTA input");
            FormatReader::Fasta(fasta::io::Reader::new(reader))
        });
        Ok(true)
    }

    /// Reads the next record from the active format reader; Ok(None) at end-of-stream
    fn read_next(&mut self) -> Result<Option<SequenceRecord>, RecordError> {
        match self.format_reader.as_mut() {
            Some(FormatReader::Fasta(reader)) => read_fasta_record(reader, &mut self.definition_buffer, &mut self.sequence_buffer),
            Some(FormatReader::Fastq(reader)) => read_fastq_record(reader, &mut self.fastq_record),
            None => Ok(None)
        }
    }

    /// After a bad FASTQ record the line framing is unknown.
    /// Lines are dropped until one starts with `@`, failed parses restart the scan, and the first
    /// clean record (or the next validation error) is held for the following call.
    fn resync_fastq(&mut self) {
        loop {
            let Some(FormatReader::Fastq(reader)) = self.format_reader.as_mut() else {
                return;
            };
            match skip_to_fastq_header(reader.get_mut()) {
                Ok(true) => {},
                Ok(false) => {
                    self.is_finished = true;
                    return;
                },
                Err(e) => {
                    self.is_finished = true;
                    self.pending = Some(Err(RecordError::Io(e)));
                    return;
                }
            }

            match self.read_next() {
                Ok(Some(record)) => {
                    self.pending = Some(Ok(record));
                    return;
                },
                Ok(None) => {
                    self.is_finished = true;
                    return;
                },
                Err(RecordError::Malformed(e)) => {
                    trace!("Dropping unparsed FASTQ data: {e}");
                },
                Err(e) => {
                    if !e.is_recoverable() {
                        self.is_finished = true;
                    }
                    self.pending = Some(Err(e));
                    return;
                }
            }
        }
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = Result<SequenceRecord, RecordError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(result) = self.pending.take() {
            return Some(result);
        }
        if self.is_finished {
            return None;
        }

        match self.init_format() {
            Ok(true) => {},
            Ok(false) => {
                self.is_finished = true;
                return None;
            },
            Err(e) => {
                self.is_finished = true;
                return Some(Err(e));
            }
        }

        match self.read_next() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.is_finished = true;
                None
            },
            Err(e) => {
                if e.is_recoverable() {
                    self.resync_fastq();
                } else {
                    self.is_finished = true;
                }
                Some(Err(e))
            }
        }
    }
}

/// Consumes leading whitespace and returns the first byte after it without consuming it
fn skip_blank<R: BufRead>(reader: &mut R) -> std::io::Result<Option<u8>> {
    loop {
        let buffer = reader.fill_buf()?;
        if buffer.is_empty() {
            return Ok(None);
        }
        let blank = buffer.iter().take_while(|b| b.is_ascii_whitespace()).count();
        if blank < buffer.len() {
            let first_byte = buffer[blank];
            reader.consume(blank);
            return Ok(Some(first_byte));
        }
        let consumed = buffer.len();
        reader.consume(consumed);
    }
}

/// Drops whole lines until the next one starts with `@`; returns false at end-of-stream
fn skip_to_fastq_header<R: BufRead>(reader: &mut R) -> std::io::Result<bool> {
    let mut discarded = Vec::new();
    loop {
        match skip_blank(reader)? {
            Some(b'@') => return Ok(true),
            Some(_) => {
                discarded.clear();
                reader.read_until(b'\n', &mut discarded)?;
            },
            None => return Ok(false)
        }
    }
}

/// Reads one FASTA record: a definition line followed by sequence lines up to the next `>`
fn read_fasta_record<R: BufRead>(
    reader: &mut fasta::io::Reader<R>, definition: &mut String, sequence: &mut Vec<u8>
) -> Result<Option<SequenceRecord>, RecordError> {
    definition.clear();
    sequence.clear();

    let header = match reader.read_definition(definition) {
        Ok(0) => return Ok(None),
        Ok(_) => definition.trim_end().strip_prefix('>').map(str::to_string),
        Err(e) if e.kind() == ErrorKind::InvalidData => {
            // the bad line is already consumed, drop its body too
            reader.read_sequence(sequence).map_err(RecordError::Io)?;
            return Err(RecordError::InvalidHeader);
        },
        Err(e) => return Err(RecordError::Io(e))
    };

    // for junk lines this swallows everything up to the next header, so it is only reported once
    reader.read_sequence(sequence).map_err(RecordError::Io)?;
    let header = header.ok_or(RecordError::MissingHeader)?;
    build_record(parse_identifier(&header), sequence, None).map(Some)
}

/// Reads one four-line FASTQ record
fn read_fastq_record<R: BufRead>(
    reader: &mut fastq::io::Reader<R>, record: &mut fastq::Record
) -> Result<Option<SequenceRecord>, RecordError> {
    if skip_blank(reader.get_mut()).map_err(RecordError::Io)?.is_none() {
        return Ok(None);
    }

    match reader.read_record(record) {
        Ok(0) => Ok(None),
        Ok(_) => {
            let name = String::from_utf8_lossy(record.name());
            let mut sequence = record.sequence().to_vec();
            let quality = record.quality_scores().to_vec();
            build_record(parse_identifier(&name), &mut sequence, Some(quality)).map(Some)
        },
        Err(e) if matches!(e.kind(), ErrorKind::InvalidData | ErrorKind::UnexpectedEof) => {
            Err(RecordError::Malformed(e))
        },
        Err(e) => Err(RecordError::Io(e))
    }
}

/// Validates raw record parts and converts them into a [`SequenceRecord`]
fn build_record(identifier: String, sequence: &mut Vec<u8>, quality: Option<Vec<u8>>) -> Result<SequenceRecord, RecordError> {
    sequence.retain(|&b| b != b'\r');
    if sequence.is_empty() {
        return Err(RecordError::MissingSequence { identifier });
    }
    let sequence = match String::from_utf8(std::mem::take(sequence)) {
        Ok(s) if s.is_ascii() => s,
        _ => return Err(RecordError::NonAsciiSequence { identifier })
    };

    let quality = match quality {
        Some(mut quality) => {
            quality.retain(|&b| b != b'\r');
            if quality.is_empty() {
                return Err(RecordError::MissingQuality { identifier });
            }
            if quality.len() != sequence.len() {
                return Err(RecordError::QualityLength {
                    identifier, sequence_len: sequence.len(), quality_len: quality.len()
                });
            }
            match String::from_utf8(quality) {
                Ok(q) if q.is_ascii() => Some(q),
                _ => return Err(RecordError::NonAsciiSequence { identifier })
            }
        },
        None => None
    };

    trace!("Parsed {identifier:?} with {} symbols", sequence.len());
    Ok(SequenceRecord::new(identifier, sequence, quality))
}

/// Extracts the record identifier from header text: everything before the first whitespace or `|`
/// # Arguments
/// * `header` - the header line with the leading `>`/`@` removed
pub fn parse_identifier(header: &str) -> String {
    header.split(|c: char| c.is_whitespace() || c == '|')
        .next()
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::path::PathBuf;

    fn read_all(data: &[u8]) -> Vec<Result<SequenceRecord, RecordError>> {
        RecordReader::new(Cursor::new(data.to_vec())).collect()
    }

    #[test]
    fn test_parse_identifier() {
        assert_eq!(parse_identifier("COG-123 some description"), "COG-123");
        assert_eq!(parse_identifier("COG-123|2020-03-01|UK"), "COG-123");
        assert_eq!(parse_identifier("COG-123\tdesc"), "COG-123");
        assert_eq!(parse_identifier("plain"), "plain");
        assert_eq!(parse_identifier(""), "");
    }

    #[test]
    fn test_wrapped_fasta() {
        let records = read_all(b"\n>s1 first\nACGT\nAC\n\n>s2|meta\r\nTT--\r\nGG\r\n");
        assert_eq!(records.len(), 2);
        let s1 = records[0].as_ref().unwrap();
        assert_eq!(s1.identifier(), "s1");
        assert_eq!(s1.sequence(), "ACGTAC");
        assert_eq!(s1.quality(), None);
        let s2 = records[1].as_ref().unwrap();
        assert_eq!(s2.identifier(), "s2");
        assert_eq!(s2.sequence(), "TT--GG");
    }

    #[test]
    fn test_fastq() {
        let records = read_all(b"@r1\nACGT\n+\nIIII\n@r2 x\nACGT\n+r2\nIII#\n\n");
        assert_eq!(records.len(), 2);
        let r1 = records[0].as_ref().unwrap();
        assert_eq!(r1.sequence(), "ACGT");
        assert_eq!(r1.quality(), Some("IIII"));
        let r2 = records[1].as_ref().unwrap();
        assert_eq!(r2.identifier(), "r2");
        assert_eq!(r2.quality(), Some("III#"));
    }

    #[test]
    fn test_empty_stream() {
        assert!(read_all(b"").is_empty());
        assert!(read_all(b"\n\n").is_empty());
    }

    #[test]
    fn test_missing_sequence_recovers() {
        let records = read_all(b">empty\n>full\nACGT\n");
        assert_eq!(records.len(), 2);
        assert!(matches!(
            records[0],
            Err(RecordError::MissingSequence { ref identifier }) if identifier == "empty"
        ));
        assert!(records[0].as_ref().unwrap_err().is_recoverable());
        assert_eq!(records[1].as_ref().unwrap().sequence(), "ACGT");

        // trailing header with nothing after it
        let records = read_all(b">full\nACGT\n>empty\n");
        assert_eq!(records.len(), 2);
        assert!(records[0].is_ok());
        assert!(matches!(records[1], Err(RecordError::MissingSequence { .. })));
    }

    #[test]
    fn test_missing_header_recovers() {
        let records = read_all(b"junk\nmore junk\n>s1\nAC\n");
        assert_eq!(records.len(), 2);
        assert!(matches!(records[0], Err(RecordError::MissingHeader)));
        assert_eq!(records[1].as_ref().unwrap().identifier(), "s1");

        // junk with no header at all
        let records = read_all(b"junk\n");
        assert_eq!(records.len(), 1);
        assert!(records[0].is_err());
    }

    #[test]
    fn test_invalid_bytes_recover() {
        let records = read_all(b">BAD\nATGCGGCTGAAT\xffAA\n>COG-002\nACGT\n");
        assert_eq!(records.len(), 2);
        assert!(matches!(
            records[0],
            Err(RecordError::NonAsciiSequence { ref identifier }) if identifier == "BAD"
        ));
        assert!(records[0].as_ref().unwrap_err().is_recoverable());
        assert_eq!(records[1].as_ref().unwrap().identifier(), "COG-002");

        // broken header bytes
        let records = read_all(b">B\xffD\nACGT\n>ok\nAC\n");
        assert_eq!(records.len(), 2);
        assert!(matches!(records[0], Err(RecordError::InvalidHeader)));
        assert_eq!(records[1].as_ref().unwrap().identifier(), "ok");
    }

    #[test]
    fn test_bad_quality() {
        let records = read_all(b"@r1\nACGT\n+\n");
        assert_eq!(records.len(), 1);
        assert!(records[0].as_ref().unwrap_err().is_recoverable());

        let records = read_all(b"@r1\nACGT\n+\nII\n");
        assert_eq!(records.len(), 1);
        assert!(records[0].as_ref().unwrap_err().is_recoverable());
    }

    #[test]
    fn test_missing_quality_line_resyncs() {
        // r1 loses its quality line, so its framing swallows r2; r3 must still come through
        let records = read_all(b"@r1\nACGT\n+\n@r2\nACGT\n+\nIIII\n@r3\nAC\n+\nII\n");
        assert_eq!(records.len(), 2);
        assert!(records[0].is_err());
        let r3 = records[1].as_ref().unwrap();
        assert_eq!(r3.identifier(), "r3");
        assert_eq!(r3.sequence(), "AC");
    }

    #[test]
    fn test_fixture_files() {
        let reader = RecordReader::from_path(&PathBuf::from("test_data/reference.fa")).unwrap();
        let records: Vec<SequenceRecord> = reader.map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].identifier(), "reference");
        assert_eq!(records[0].sequence(), "ATGCGGCTGAATTAA");

        let reader = RecordReader::from_path(&PathBuf::from("test_data/msa.fa")).unwrap();
        let ids: Vec<String> = reader.map(|r| r.unwrap().identifier().to_string()).collect();
        assert_eq!(ids, vec!["COG-001", "COG-002", "COG-003", "COG-004"]);

        let reader = RecordReader::from_path(&PathBuf::from("test_data/msa.fq")).unwrap();
        let records: Vec<SequenceRecord> = reader.map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.quality().is_some()));
        assert_eq!(records[2].quality(), Some("IIIIIII#IIIIIII"));
    }
}
