use crate::core::Reporter;
use crate::utils::error::ScrapeError;

/// Reports progress through `tracing`; failures become warnings.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn listing_loaded(&self, listing_url: &str, towns: usize) {
        tracing::info!("📋 Found {} municipalities on {}", towns, listing_url);
    }

    fn town_started(&self, url: &str) {
        tracing::info!("Processing {}", url);
    }

    fn town_failed(&self, url: &str, error: &ScrapeError) {
        tracing::warn!("⚠️ Skipping {}: {}", url, error);
    }
}
