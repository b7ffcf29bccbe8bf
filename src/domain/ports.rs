use crate::domain::model::{HeaderMode, OutputFormat};
use crate::utils::error::{Result, ScrapeError};
use async_trait::async_trait;
use std::time::Duration;

/// Source of raw page HTML.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Receives progress and per-town failures from the aggregator.
pub trait Reporter: Send + Sync {
    fn listing_loaded(&self, listing_url: &str, towns: usize);
    fn town_started(&self, url: &str);
    fn town_failed(&self, url: &str, error: &ScrapeError);
}

pub trait ConfigProvider: Send + Sync {
    fn base_url(&self) -> &str;
    fn request_timeout(&self) -> Duration;
    fn user_agent(&self) -> &str;
    fn header_mode(&self) -> HeaderMode;
    fn output_format(&self) -> OutputFormat;
}
