use crate::core::csv_writer::CsvWriter;
use crate::core::pipeline::ElectionPipeline;
use crate::core::{PageFetcher, Reporter, RunSummary};
use crate::utils::error::Result;
use std::path::Path;

/// Runs the scrape and writes the dataset: listing → records → file.
pub struct EtlEngine<F: PageFetcher, R: Reporter> {
    pipeline: ElectionPipeline<F, R>,
    writer: CsvWriter,
}

impl<F: PageFetcher, R: Reporter> EtlEngine<F, R> {
    pub fn new(pipeline: ElectionPipeline<F, R>, writer: CsvWriter) -> Self {
        Self { pipeline, writer }
    }

    pub async fn run<P: AsRef<Path>>(&self, listing_url: &str, output_path: P) -> Result<RunSummary> {
        let output_path = output_path.as_ref();
        tracing::info!("🚀 Scraping election results from {}", listing_url);

        // Extract
        let report = self.pipeline.run(listing_url).await?;

        // Load
        tracing::info!("💾 Writing {} records...", report.records.len());
        let schema = self.writer.write(&report.records, output_path)?;

        Ok(RunSummary {
            output_path: output_path.display().to_string(),
            records_written: report.records.len(),
            towns_failed: report.failures.len(),
            columns: schema.columns().len(),
        })
    }
}
