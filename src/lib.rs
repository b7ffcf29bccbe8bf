pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::{CliConfig, Command};
pub use crate::config::ScraperSettings;

pub use crate::core::{
    csv_writer::CsvWriter, etl::EtlEngine, fetcher::HttpFetcher, pipeline::ElectionPipeline,
    reporter::TracingReporter,
};
pub use crate::domain::model::{ElectionRecord, HeaderMode, OutputFormat, RunReport, RunSummary};
pub use crate::utils::error::{Result, ScrapeError};
