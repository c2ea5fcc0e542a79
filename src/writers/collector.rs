
use crate::data_types::variant_row::VariantRow;
use crate::writers::VariantSink;

/// Keeps every row in memory, in the order it was produced
#[derive(Debug, Default)]
pub struct VariantCollector {
    /// All rows seen so far
    rows: Vec<VariantRow>,
    /// Samples seen so far, including those with no rows
    samples: Vec<String>,
}

impl VariantCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all rows for a single sample
    pub fn sample_rows(&self, sample_id: &str) -> Vec<&VariantRow> {
        self.rows.iter()
            .filter(|r| r.sample_id() == sample_id)
            .collect()
    }

    // getters
    pub fn rows(&self) -> &[VariantRow] {
        &self.rows
    }

    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    pub fn into_rows(self) -> Vec<VariantRow> {
        self.rows
    }
}

impl VariantSink for VariantCollector {
    fn begin_sample(&mut self, sample_id: &str) -> csv::Result<()> {
        self.samples.push(sample_id.to_string());
        Ok(())
    }

    fn write_row(&mut self, row: &VariantRow) -> csv::Result<()> {
        self.rows.push(row.clone());
        Ok(())
    }
}
