/*!
# Writers module
Contains the sinks that consume variant rows.
Every sink implements [`VariantSink`]; the pipeline fans each query's rows out to all of them.
*/
/// In-memory collector for the rows, mostly for library and test use
pub mod collector;
/// Generates the per-sample summary table
pub mod sample_summary;
/// Generates the main variant table
pub mod variant_table;

use crate::data_types::variant_row::VariantRow;

/// Production interface for variant rows.
/// Sinks see samples in input order and, within a sample, rows in position order.
pub trait VariantSink {
    /// Called once per successfully called query, before any of its rows
    /// # Arguments
    /// * `sample_id` - the query sample identifier
    fn begin_sample(&mut self, _sample_id: &str) -> csv::Result<()> {
        Ok(())
    }

    /// Called once per emitted row
    fn write_row(&mut self, row: &VariantRow) -> csv::Result<()>;

    /// Called once after the last query
    fn finish(&mut self) -> csv::Result<()> {
        Ok(())
    }
}
