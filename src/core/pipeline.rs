use crate::core::extract::{extract_record, extract_town_code, extract_town_links};
use crate::core::{ElectionRecord, PageFetcher, Reporter, RunReport, TownFailure};
use crate::utils::error::{Result, ScrapeError};
use url::Url;

/// Drives listing → municipality pages → records, one request at a time.
pub struct ElectionPipeline<F: PageFetcher, R: Reporter> {
    pub(crate) fetcher: F,
    pub(crate) reporter: R,
    pub(crate) base_url: Url,
}

impl<F: PageFetcher, R: Reporter> ElectionPipeline<F, R> {
    /// `base_url` is treated as a directory: a missing trailing `/` is added,
    /// so `.../ps2017nss` and `.../ps2017nss/` resolve links the same way.
    pub fn new(fetcher: F, reporter: R, base_url: &str) -> Result<Self> {
        let mut base_url = Url::parse(base_url).map_err(|e| ScrapeError::InvalidConfigValueError {
            field: "base_url".to_string(),
            value: base_url.to_string(),
            reason: format!("Invalid URL format: {}", e),
        })?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            fetcher,
            reporter,
            base_url,
        })
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Absolute URL of a municipality link taken from the listing page.
    pub fn resolve_town_url(&self, link: &str) -> Result<String> {
        self.base_url
            .join(link)
            .map(String::from)
            .map_err(|e| ScrapeError::structure(format!("cannot resolve town link '{}': {}", link, e)))
    }

    async fn fetch_town_links(&self, listing_url: &str) -> Result<Vec<String>> {
        tracing::debug!("Fetching listing page {}", listing_url);
        let html = self.fetcher.fetch(listing_url).await?;
        let links = extract_town_links(&html);
        self.reporter.listing_loaded(listing_url, links.len());
        Ok(links)
    }

    /// Absolute municipality URLs found on the listing page.
    ///
    /// Links that cannot be resolved are reported and left out.
    pub async fn list_towns(&self, listing_url: &str) -> Result<Vec<String>> {
        let links = self.fetch_town_links(listing_url).await?;

        let mut urls = Vec::with_capacity(links.len());
        for link in links {
            match self.resolve_town_url(&link) {
                Ok(url) => urls.push(url),
                Err(e) => self.reporter.town_failed(&link, &e),
            }
        }
        Ok(urls)
    }

    /// Fetches and parses a single municipality page.
    pub async fn process_town(&self, town_url: &str) -> Result<ElectionRecord> {
        self.reporter.town_started(town_url);

        let html = self.fetcher.fetch(town_url).await?;
        let results = extract_record(&html)?;
        let town_code = extract_town_code(town_url)?;

        let record = results.with_town_code(town_code);
        tracing::debug!("{:?}", record);
        Ok(record)
    }

    /// Processes every municipality on the listing page.
    ///
    /// A failure on the listing page is returned as `Err`. Municipality
    /// failures that are recoverable per town are reported and collected in
    /// `RunReport::failures`; any other error aborts the run.
    pub async fn run(&self, listing_url: &str) -> Result<RunReport> {
        let links = self.fetch_town_links(listing_url).await?;

        let mut report = RunReport::default();
        for link in links {
            let (url, outcome) = match self.resolve_town_url(&link) {
                Ok(url) => {
                    let outcome = self.process_town(&url).await;
                    (url, outcome)
                }
                Err(e) => (link, Err(e)),
            };

            match outcome {
                Ok(record) => report.records.push(record),
                Err(error) if error.is_recoverable_per_town() => {
                    self.reporter.town_failed(&url, &error);
                    report.failures.push(TownFailure { url, error });
                }
                Err(error) => return Err(error),
            }
        }

        tracing::info!(
            "Collected {} records, {} municipalities skipped",
            report.records.len(),
            report.failures.len()
        );
        Ok(report)
    }
}
