
use indexmap::IndexMap;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use strum::IntoEnumIterator;

use crate::data_types::sample_summary::{KindMetrics, SampleSummary};
use crate::data_types::variant_row::{VariantKind, VariantRow};
use crate::util::file_io::{create_output, table_delimiter};
use crate::writers::VariantSink;

/// Accumulates per-sample counts and writes them out as a table at the end of the run
#[derive(Default)]
pub struct SampleSummaryWriter {
    /// Samples in first-seen order
    sample_summaries: IndexMap<String, SampleSummary>,
}

/// Contains all the data written to each row of the summary file
#[derive(Serialize)]
struct SampleSummaryRow<'a> {
    /// Sample identifier
    sample_id: &'a str,
    /// The type of variant represented by this row
    variant_type: &'a str,
    /// Number of emitted rows of this type
    events: u64,
    /// Number of reference bases covered by those rows
    bases: u64,
}

impl<'a> SampleSummaryRow<'a> {
    /// Creates a new row from labels and metrics
    fn new(sample_id: &'a str, variant_type: VariantKind, metrics: KindMetrics) -> Self {
        Self {
            sample_id,
            variant_type: variant_type.into(),
            events: metrics.events,
            bases: metrics.bases,
        }
    }
}

impl SampleSummaryWriter {
    /// Creates a new writer to accumulate stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of every sample's counts
    pub fn joint_summary(&self) -> SampleSummary {
        let mut joint = SampleSummary::default();
        for summary in self.sample_summaries.values() {
            joint += summary;
        }
        joint
    }

    /// Number of distinct samples seen
    pub fn num_samples(&self) -> usize {
        self.sample_summaries.len()
    }

    /// Will write the summary out to the given file path
    /// # Arguments
    /// * `filename` - the filename for the output (tsv/csv, optionally .gz)
    pub fn write_summary(&self, filename: &Path) -> csv::Result<()> {
        let writer = create_output(filename)?;
        self.write_to(writer, table_delimiter(filename))
    }

    /// Writes the summary table to any output; one row per sample per variant type, zero counts included
    /// # Arguments
    /// * `writer` - the output handle
    /// * `delimiter` - field separator
    pub fn write_to<W: Write>(&self, writer: W, delimiter: u8) -> csv::Result<()> {
        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_writer(writer);

        for (sample_id, summary) in self.sample_summaries.iter() {
            for variant_type in VariantKind::iter() {
                let row = SampleSummaryRow::new(sample_id, variant_type, summary.metrics(variant_type));
                csv_writer.serialize(&row)?;
            }
        }

        csv_writer.flush()?;
        Ok(())
    }
}

impl VariantSink for SampleSummaryWriter {
    fn begin_sample(&mut self, sample_id: &str) -> csv::Result<()> {
        // repeated identifiers are folded into one entry
        self.sample_summaries.entry(sample_id.to_string()).or_default();
        Ok(())
    }

    fn write_row(&mut self, row: &VariantRow) -> csv::Result<()> {
        let entry = self.sample_summaries.entry(row.sample_id().to_string()).or_default();
        entry.add_row(row);
        Ok(())
    }
}
