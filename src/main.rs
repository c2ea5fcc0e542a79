
use log::{LevelFilter, error, info};
use std::path::Path;
use std::time::Instant;
use strum::IntoEnumIterator;

use refdiff::cli::call::{CallSettings, check_call_settings};
use refdiff::cli::core::{Commands, get_cli};
use refdiff::data_types::variant_row::VariantKind;
use refdiff::data_types::window::AnalysisWindow;
use refdiff::parsing::reference::load_reference;
use refdiff::pipeline::{CallConfigBuilder, RunError, call_alignment_file};
use refdiff::util::json_io::save_json;
use refdiff::writers::VariantSink;
use refdiff::writers::sample_summary::SampleSummaryWriter;
use refdiff::writers::variant_table::VariantTableWriter;

/// Logs a run failure and exits with the status mapped from its kind
fn exit_on_run_error(prefix: &str, e: RunError) -> ! {
    error!("{prefix}: {e}");
    std::process::exit(e.exit_code());
}

fn run_call(settings: CallSettings) {
    // start the timer
    let start_time = Instant::now();

    // set up logging before we check the other settings
    let filter_level: LevelFilter = match settings.verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace
    };
    env_logger::builder()
        .format_timestamp_millis()
        .filter_level(filter_level)
        .init();

    let settings = match check_call_settings(settings) {
        Ok(s) => s,
        Err(e) => {
            error!("Error while verifying settings: {e:#}");
            let exit_code = e.downcast_ref::<RunError>()
                .map(|run_error| run_error.exit_code())
                .unwrap_or(exitcode::CONFIG);
            std::process::exit(exit_code);
        }
    };

    // set up the number of threads for rayon
    match rayon::ThreadPoolBuilder::new().num_threads(settings.threads).build_global() {
        Ok(()) => {},
        Err(e) => {
            error!("Error while building thread pool: {e}");
            std::process::exit(exitcode::OSERR);
        }
    };

    // create a debug folder if specified
    if let Some(debug_folder) = settings.debug_folder.as_ref() {
        info!("Creating debug folder at {debug_folder:?}...");
        match std::fs::create_dir_all(debug_folder) {
            Ok(()) => {},
            Err(e) => {
                error!("Error while creating debug folder: {e}");
                std::process::exit(exitcode::IOERR);
            }
        }

        // save the CLI options
        let cli_json = debug_folder.join("cli_settings.json");
        info!("Saving CLI options to {cli_json:?}...");
        if let Err(e) = save_json(&settings, &cli_json) {
            error!("Error while saving CLI options: {e}");
            std::process::exit(exitcode::IOERR);
        }
    }

    // load the reference, it is shared read-only by every record
    info!("Loading reference from {:?}...", settings.reference_fn);
    let reference = match load_reference(&settings.reference_fn) {
        Ok(r) => r,
        Err(e) => exit_on_run_error("Error while loading reference", e.into())
    };
    info!("Loaded reference {:?} ({} bp)", reference.identifier(), reference.len());

    let window = match AnalysisWindow::new(settings.window_start, settings.window_end)
        .and_then(|w| w.validate(reference.len()).map(|_| w)) {
        Ok(w) => w,
        Err(e) => exit_on_run_error("Error while checking analysis window", e.into())
    };

    let config = match CallConfigBuilder::default()
        .window(window)
        .strict(settings.strict)
        .batch_size(settings.batch_size)
        .build() {
        Ok(c) => c,
        Err(e) => {
            error!("Error while building call config: {e}");
            std::process::exit(exitcode::SOFTWARE);
        }
    };

    // prep the writers
    let table_result = match settings.output_fn.as_deref() {
        Some(output_fn) => {
            info!("Writing variant table to {output_fn:?}...");
            VariantTableWriter::from_path(output_fn)
        },
        None => VariantTableWriter::stdout()
    };
    let mut table_writer = match table_result {
        Ok(w) => w,
        Err(e) => exit_on_run_error("Error while creating variant table", e.into())
    };
    let mut summary_writer = settings.summary_fn.as_ref().map(|_| SampleSummaryWriter::new());

    // now run the calls through every sink
    let run_result = {
        let mut sinks: Vec<&mut dyn VariantSink> = Vec::with_capacity(2);
        sinks.push(&mut table_writer);
        if let Some(sw) = summary_writer.as_mut() {
            sinks.push(sw);
        }
        call_alignment_file(&reference, &settings.msa_fn, config, &mut sinks)
    };
    let run_stats = match run_result {
        Ok(s) => s,
        Err(e) => {
            // rows from records before the failure are still kept
            if let Err(flush_error) = table_writer.into_inner() {
                error!("Error while closing variant table: {flush_error}");
            }
            exit_on_run_error("Error while calling variants", e)
        }
    };

    // make sure the table is fully written before the summary
    if let Err(e) = table_writer.into_inner() {
        error!("Error while closing variant table: {e}");
        std::process::exit(exitcode::IOERR);
    }

    if let (Some(summary_fn), Some(sw)) = (settings.summary_fn.as_deref(), summary_writer.as_ref()) {
        write_summary(sw, summary_fn);
    }

    if let Some(debug_folder) = settings.debug_folder.as_ref() {
        let stats_json = debug_folder.join("run_stats.json");
        info!("Saving run statistics to {stats_json:?}...");
        if let Err(e) = save_json(&run_stats, &stats_json) {
            error!("Error while saving run statistics: {e}");
            std::process::exit(exitcode::IOERR);
        }
    }

    info!("Process finished successfully in {} seconds.", start_time.elapsed().as_secs_f64());
}

fn write_summary(summary_writer: &SampleSummaryWriter, summary_fn: &Path) {
    let joint_summary = summary_writer.joint_summary();
    info!("Joint summary: {} events across {} samples", joint_summary.total_events(), summary_writer.num_samples());
    for variant_type in VariantKind::iter() {
        let metrics = joint_summary.metrics(variant_type);
        info!("\t{}: {} events, {} bases", variant_type.as_ref(), metrics.events, metrics.bases);
    }

    info!("Writing summary to {summary_fn:?}...");
    if let Err(e) = summary_writer.write_summary(summary_fn) {
        error!("Error while writing summary file: {e}");
        std::process::exit(exitcode::IOERR);
    }
}

fn main() {
    let cli = get_cli();
    match cli.command {
        Commands::Call(settings) => {
            run_call(*settings);
        }
    }
}
