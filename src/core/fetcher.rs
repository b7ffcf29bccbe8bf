use crate::core::{ConfigProvider, PageFetcher};
use crate::utils::error::{Result, ScrapeError};
use async_trait::async_trait;
use reqwest::{header, redirect, Client};

const MAX_REDIRECTS: usize = 10;

/// Fetches pages over HTTP with one reused client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new<C: ConfigProvider>(config: &C) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8"),
        );

        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent())
            .default_headers(headers)
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| ScrapeError::ConfigError {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ScrapeError::fetch(url, e))?;

        let status = response.status();
        tracing::debug!("Response status: {}", status);
        if !status.is_success() {
            return Err(ScrapeError::fetch(url, format!("HTTP {}", status)));
        }

        response.text().await.map_err(|e| ScrapeError::fetch(url, e))
    }
}
