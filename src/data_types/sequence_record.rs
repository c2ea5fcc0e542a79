
/// The alignment symbol for "no base aligned to this reference position"
pub const GAP_SYMBOL: u8 = b'-';

/// A single FASTA/FASTQ record as parsed by the record reader.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SequenceRecord {
    /// Leading token of the header line, everything before the first whitespace or `|`
    identifier: String,
    /// The sequence body with line breaks removed
    sequence: String,
    /// The quality string, only present for FASTQ-style records
    quality: Option<String>,
}

impl SequenceRecord {
    /// Constructor
    /// # Arguments
    /// * `identifier` - the record identifier, typically the sample ID
    /// * `sequence` - the full sequence, unwrapped
    /// * `quality` - optional quality string
    pub fn new(identifier: String, sequence: String, quality: Option<String>) -> Self {
        Self {
            identifier,
            sequence,
            quality,
        }
    }

    /// Number of aligned symbols in the record
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Position of the rightmost non-gap symbol, 1-based; 0 if the sequence is all gaps
    pub fn last_called_position(&self) -> u64 {
        self.sequence.bytes()
            .rposition(|b| b != GAP_SYMBOL)
            .map(|i| i as u64 + 1)
            .unwrap_or(0)
    }

    // getters
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    pub fn sequence_bytes(&self) -> &[u8] {
        self.sequence.as_bytes()
    }

    pub fn quality(&self) -> Option<&str> {
        self.quality.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_called_position() {
        let record = SequenceRecord::new("s1".to_string(), "AC-C---TGAACT--".to_string(), None);
        assert_eq!(record.len(), 15);
        assert_eq!(record.last_called_position(), 13);

        let record = SequenceRecord::new("s2".to_string(), "-----".to_string(), None);
        assert_eq!(record.last_called_position(), 0);

        let record = SequenceRecord::new("s3".to_string(), "ACGT".to_string(), Some("IIII".to_string()));
        assert_eq!(record.last_called_position(), 4);
        assert_eq!(record.quality(), Some("IIII"));
    }
}
