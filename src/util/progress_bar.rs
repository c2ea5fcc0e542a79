
use indicatif::{ProgressBar, ProgressState, ProgressStyle};

/// Shared spinner styling for streams where the total record count is unknown
pub fn get_spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("[{elapsed_precise}] {spinner:.cyan} {pos} records; Speed: {per_sec} {msg}")
        .unwrap()
        .with_key("per_sec", |state: &ProgressState, w: &mut dyn std::fmt::Write| write!(w, "{:.0}/s", state.per_sec()).unwrap())
}

/// Builds the spinner used while streaming query records
pub fn record_spinner() -> ProgressBar {
    ProgressBar::new_spinner()
        .with_style(get_spinner_style())
        .with_message("Calling variants...")
}
