/*!
# Pipeline
Driver glue that streams query records through a fresh [`VariantCaller`](crate::variant_caller::VariantCaller) each and fans the rows out to the sinks.

Records are pulled in batches; each batch is called in parallel on the current rayon pool and then written strictly in input order,
so the output does not depend on the thread count.

## Example usage
```rust
use refdiff::data_types::sequence_record::SequenceRecord;
use refdiff::data_types::window::AnalysisWindow;
use refdiff::parsing::record_reader::RecordReader;
use refdiff::pipeline::{call_alignment, CallConfigBuilder};
use refdiff::writers::VariantSink;
use refdiff::writers::collector::VariantCollector;

let reference = SequenceRecord::new("ref".to_string(), "ATGCGGCTGAATTAA".to_string(), None);
let msa = ">COG-002\nAC-C---TGAACT--\n>COG-003\nATGCGGCTGAATTAA\n";
let records = RecordReader::new(msa.as_bytes());

let config = CallConfigBuilder::default()
    .window(AnalysisWindow::new(1, 15).unwrap())
    .build().unwrap();
let mut collector = VariantCollector::new();
let stats = call_alignment(&reference, records, config, &mut [&mut collector as &mut dyn VariantSink]).unwrap();
assert_eq!(stats.samples_processed, 2);
assert_eq!(collector.rows().len(), 6);
```
*/
use derive_builder::Builder;
use itertools::Itertools;
use log::{debug, info, warn};
use rayon::prelude::*;
use rustc_hash::FxHashSet as HashSet;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::data_types::sequence_record::SequenceRecord;
use crate::data_types::variant_row::VariantRow;
use crate::data_types::window::{AnalysisWindow, WindowError};
use crate::parsing::record_reader::{RecordError, RecordReader};
use crate::parsing::reference::ReferenceError;
use crate::util::progress_bar::record_spinner;
use crate::variant_caller::{call_record, CallerError};
use crate::writers::VariantSink;

/// Default number of query records pulled per parallel batch
pub const DEFAULT_BATCH_SIZE: usize = 256;

#[derive(thiserror::Error, Debug)]
pub enum RunError {
    #[error("{label} does not exist: {filename:?}")]
    MissingInput { label: String, filename: PathBuf },
    #[error("could not open {filename:?}: {source}")]
    Open {
        filename: PathBuf,
        #[source]
        source: std::io::Error
    },
    #[error("failed to load reference: {0}")]
    ReferenceLoad(#[from] ReferenceError),
    #[error("{0}")]
    LengthMismatch(#[from] CallerError),
    #[error("malformed record #{record_index}: {source}")]
    Format {
        record_index: usize,
        #[source]
        source: RecordError
    },
    #[error("invalid analysis window: {0}")]
    Config(#[from] WindowError),
    #[error("error while writing output: {0}")]
    Output(#[from] csv::Error),
    #[error("error while reading record #{record_index}: {source}")]
    Io {
        record_index: usize,
        #[source]
        source: RecordError
    },
}

impl RunError {
    /// Process exit status for this error kind
    pub fn exit_code(&self) -> exitcode::ExitCode {
        match self {
            RunError::MissingInput { .. } |
            RunError::Open { .. } |
            RunError::ReferenceLoad(_) => exitcode::NOINPUT,
            RunError::Format { .. } => exitcode::DATAERR,
            RunError::Config(_) => exitcode::CONFIG,
            RunError::LengthMismatch(_) => exitcode::SOFTWARE,
            RunError::Output(_) |
            RunError::Io { .. } => exitcode::IOERR,
        }
    }
}

/// Controls how the alignment is processed
#[derive(Builder, Clone, Copy, Debug)]
#[builder(default)]
pub struct CallConfig {
    /// Trusted region for SNV and no-call emission
    window: AnalysisWindow,
    /// if true, the first malformed record aborts the run instead of being skipped
    strict: bool,
    /// Number of records called in parallel before writing; 0 is treated as 1
    batch_size: usize,
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            window: AnalysisWindow::default(),
            strict: false,
            batch_size: DEFAULT_BATCH_SIZE
        }
    }
}

impl CallConfig {
    // mostly getters
    pub fn window(&self) -> AnalysisWindow {
        self.window
    }

    pub fn strict(&self) -> bool {
        self.strict
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size.max(1)
    }
}

/// Counters reported at the end of a run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Records pulled from the alignment, good or bad
    pub records_read: u64,
    /// Malformed records that were skipped
    pub records_skipped: u64,
    /// Records that went through the variant caller
    pub samples_processed: u64,
    /// Total rows handed to the sinks
    pub rows_emitted: u64,
    /// Records whose sample identifier had already been seen
    pub duplicate_samples: u64,
}

/// Result of one record within a batch
enum RecordOutcome {
    /// The record was called; rows are in position order
    Called {
        sample_id: String,
        rows: Vec<VariantRow>,
        all_gaps: bool
    },
    /// The record was malformed and skipped
    Skipped {
        record_index: usize,
        error: RecordError
    }
}

/// Runs one record from the reader through the caller
fn process_record(
    reference: &SequenceRecord, record_index: usize, parsed: Result<SequenceRecord, RecordError>, config: CallConfig
) -> Result<RecordOutcome, RunError> {
    match parsed {
        Ok(query) => {
            let rows = call_record(reference, &query, config.window())?;
            Ok(RecordOutcome::Called {
                all_gaps: query.last_called_position() == 0,
                sample_id: query.identifier().to_string(),
                rows
            })
        },
        Err(error) if !error.is_recoverable() => Err(RunError::Io { record_index, source: error }),
        Err(error) if config.strict() => Err(RunError::Format { record_index, source: error }),
        Err(error) => Ok(RecordOutcome::Skipped { record_index, error })
    }
}

/// Calls every record of an alignment against the reference and hands the rows to each sink.
/// # Arguments
/// * `reference` - the loaded reference record
/// * `records` - the query record stream, usually a `RecordReader`
/// * `config` - window, strictness, and batching controls
/// * `sinks` - every consumer of the rows; all of them see the same rows in the same order
/// # Errors
/// * if the window does not fit on the reference
/// * if any query length differs from the reference length
/// * if a record is malformed and strict mode is enabled
/// * if reading the stream or writing to a sink fails
pub fn call_alignment<I>(
    reference: &SequenceRecord,
    records: I,
    config: CallConfig,
    sinks: &mut [&mut dyn VariantSink]
) -> Result<RunStats, RunError>
where
    I: Iterator<Item = Result<SequenceRecord, RecordError>>
{
    let window = config.window();
    window.validate(reference.len())?;
    debug!("Analysis window {window} on a {} bp reference", reference.len());

    let mut stats = RunStats::default();
    let mut seen_samples: HashSet<String> = Default::default();
    let spinner = record_spinner();

    let batches = records
        .enumerate()
        .map(|(i, parsed)| (i + 1, parsed))
        .chunks(config.batch_size());
    for batch in &batches {
        let batch: Vec<(usize, Result<SequenceRecord, RecordError>)> = batch.collect();
        stats.records_read += batch.len() as u64;

        // calling is independent per record; collect keeps input order
        let outcomes: Vec<Result<RecordOutcome, RunError>> = batch.into_par_iter()
            .map(|(record_index, parsed)| process_record(reference, record_index, parsed, config))
            .collect();

        for outcome in outcomes.into_iter() {
            match outcome? {
                RecordOutcome::Called { sample_id, rows, all_gaps } => {
                    if !seen_samples.insert(sample_id.clone()) {
                        warn!("Sample {sample_id:?} appears more than once in the alignment.");
                        stats.duplicate_samples += 1;
                    }
                    if all_gaps {
                        warn!("Sample {sample_id:?} has no called bases.");
                    }
                    debug!("{sample_id}: {} rows", rows.len());

                    for sink in sinks.iter_mut() {
                        sink.begin_sample(&sample_id)?;
                        for row in rows.iter() {
                            sink.write_row(row)?;
                        }
                    }
                    stats.samples_processed += 1;
                    stats.rows_emitted += rows.len() as u64;
                },
                RecordOutcome::Skipped { record_index, error } => {
                    warn!("Skipping malformed record #{record_index}: {error}");
                    stats.records_skipped += 1;
                }
            }
            spinner.inc(1);
        }
    }

    for sink in sinks.iter_mut() {
        sink.finish()?;
    }
    spinner.finish_and_clear();

    info!(
        "Records read: {}, skipped: {}, samples called: {}, rows emitted: {}",
        stats.records_read, stats.records_skipped, stats.samples_processed, stats.rows_emitted
    );
    Ok(stats)
}

/// Opens an alignment file and runs [`call_alignment`] over it.
/// # Arguments
/// * `reference` - the loaded reference record
/// * `msa_filename` - path to the aligned queries, optionally gzipped
/// * `config` - window, strictness, and batching controls
/// * `sinks` - every consumer of the rows
/// # Errors
/// * if the alignment cannot be opened
/// * any error from [`call_alignment`]
pub fn call_alignment_file(
    reference: &SequenceRecord,
    msa_filename: &Path,
    config: CallConfig,
    sinks: &mut [&mut dyn VariantSink]
) -> Result<RunStats, RunError> {
    let records = RecordReader::from_path(msa_filename)
        .map_err(|source| RunError::Open { filename: msa_filename.to_path_buf(), source })?;
    call_alignment(reference, records, config, sinks)
}
