/*!
# Parsing module
Contains the logic for parsing input sequence files into records.
*/
/// Streaming FASTA/FASTQ reader shared by the reference load and the query stream
pub mod record_reader;
/// Loads the single reference record
pub mod reference;
