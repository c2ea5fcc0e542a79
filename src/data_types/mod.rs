
/// Per-sample counters for the emitted rows
pub mod sample_summary;
/// Parsed FASTA/FASTQ records
pub mod sequence_record;
/// Contains the variant row definition that every sink consumes
pub mod variant_row;
/// The trusted analysis window and its bounds checks
pub mod window;
