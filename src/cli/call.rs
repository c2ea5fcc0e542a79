
use anyhow::ensure;
use clap::Args;
use log::info;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::core::{check_required_filename, AFTER_HELP, FULL_VERSION};
use crate::data_types::window::{DEFAULT_WINDOW_END, DEFAULT_WINDOW_START};
use crate::pipeline::DEFAULT_BATCH_SIZE;

#[derive(Args, Clone, Default, Serialize)]
#[clap(author, about,
    after_help = &**AFTER_HELP
)]
pub struct CallSettings {
    #[clap(default_value = "")]
    #[clap(hide = true)]
    refdiff_version: String,

    /// Reference sequence (FASTA/FASTQ); only the first record is used
    #[clap(required = true)]
    #[clap(short = 'r')]
    #[clap(long = "reference")]
    #[clap(value_name = "FASTA")]
    #[clap(help_heading = Some("Input/Output"))]
    pub reference_fn: PathBuf,

    /// Aligned query sequences (FASTA/FASTQ), each the same length as the reference
    #[clap(required = true)]
    #[clap(short = 'm')]
    #[clap(long = "msa")]
    #[clap(value_name = "FASTA")]
    #[clap(help_heading = Some("Input/Output"))]
    pub msa_fn: PathBuf,

    /// Output variant table (.csv/.tsv, optionally .gz) [default: stdout]
    #[clap(short = 'o')]
    #[clap(long = "output")]
    #[clap(value_name = "FILE")]
    #[clap(help_heading = Some("Input/Output"))]
    pub output_fn: Option<PathBuf>,

    /// Optional per-sample summary table (.csv/.tsv, optionally .gz)
    #[clap(long = "summary")]
    #[clap(value_name = "FILE")]
    #[clap(help_heading = Some("Input/Output"))]
    pub summary_fn: Option<PathBuf>,

    /// Optional output debug folder
    #[clap(long = "output-debug")]
    #[clap(value_name = "DIR")]
    #[clap(help_heading = Some("Input/Output"))]
    pub debug_folder: Option<PathBuf>,

    /// First trusted reference position (1-based)
    #[clap(long = "window-start")]
    #[clap(value_name = "POS")]
    #[clap(help_heading = Some("Analysis window"))]
    #[clap(default_value_t = DEFAULT_WINDOW_START)]
    pub window_start: u64,

    /// Last trusted reference position (1-based, inclusive)
    #[clap(long = "window-end")]
    #[clap(value_name = "POS")]
    #[clap(help_heading = Some("Analysis window"))]
    #[clap(default_value_t = DEFAULT_WINDOW_END)]
    pub window_end: u64,

    /// Abort on the first malformed alignment record instead of skipping it
    #[clap(long = "strict")]
    #[clap(help_heading = Some("Processing"))]
    pub strict: bool,

    /// Number of threads to use for calling
    #[clap(long = "threads")]
    #[clap(value_name = "THREADS")]
    #[clap(help_heading = Some("Processing"))]
    #[clap(default_value = "1")]
    pub threads: usize,

    /// Number of records called in parallel before writing
    #[clap(long = "batch-size")]
    #[clap(value_name = "INT")]
    #[clap(help_heading = Some("Processing"))]
    #[clap(default_value_t = DEFAULT_BATCH_SIZE)]
    #[clap(hide = true)]
    pub batch_size: usize,

    /// Enable verbose output.
    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = clap::ArgAction::Count)]
    pub verbosity: u8,
}

pub fn check_call_settings(mut settings: CallSettings) -> anyhow::Result<CallSettings> {
    // hard code the version in
    settings.refdiff_version = FULL_VERSION.clone();
    info!("refdiff version: {:?}", &settings.refdiff_version);
    info!("Sub-command: call");
    info!("Inputs:");

    // check for all the required input files
    check_required_filename(&settings.reference_fn, "Reference")?;
    check_required_filename(&settings.msa_fn, "Alignment")?;
    info!("\tReference: {:?}", &settings.reference_fn);
    info!("\tAlignment: {:?}", &settings.msa_fn);

    // outputs
    info!("Outputs:");
    if let Some(output_fn) = settings.output_fn.as_deref() {
        info!("\tVariant table: {output_fn:?}");
    } else {
        info!("\tVariant table: stdout");
    }
    if let Some(summary_fn) = settings.summary_fn.as_deref() {
        info!("\tSummary: {summary_fn:?}");
    }
    if let Some(debug_folder) = settings.debug_folder.as_ref() {
        info!("\tDebug folder: {debug_folder:?}");
    }

    // the full check against the reference length happens once the reference is loaded
    info!("Analysis window:");
    ensure!(settings.window_start >= 1, "--window-start must be >= 1");
    ensure!(
        settings.window_start <= settings.window_end,
        "--window-start ({}) must be <= --window-end ({})", settings.window_start, settings.window_end
    );
    info!("\tStart: {}", settings.window_start);
    info!("\tEnd: {}", settings.window_end);

    info!("Processing:");
    info!("\tMalformed records: {}", if settings.strict { "FATAL" } else { "SKIPPED" });
    ensure!(settings.batch_size > 0, "--batch-size must be >0");
    if settings.threads == 0 {
        settings.threads = 1;
    }
    info!("\tThreads: {}", settings.threads);

    Ok(settings)
}
