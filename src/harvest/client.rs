/// Shared HTTP client for catalog pages and asset downloads
use crate::config::Config;
use crate::error::Result;
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::debug;

/// Thin wrapper over a reqwest client carrying the site's request settings
#[derive(Clone)]
pub struct SiteClient {
    client: Client,
    base_url: String,
    page_timeout: Duration,
    asset_timeout: Duration,
}

impl SiteClient {
    /// Create a client from configuration
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.site.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            base_url: config.site.base_url.trim_end_matches('/').to_string(),
            page_timeout: Duration::from_secs(config.http.page_timeout_seconds),
            asset_timeout: Duration::from_secs(config.http.asset_timeout_seconds),
        })
    }

    /// Site root without a trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve a site-relative path against the base URL
    pub fn absolute(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Fetch an HTML page, failing on transport errors and non-success statuses
    pub async fn fetch_page(&self, url: &str) -> Result<String> {
        debug!("GET {} (timeout {:?})", url, self.page_timeout);
        let response = self
            .client
            .get(url)
            .timeout(self.page_timeout)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.text().await?)
    }

    /// Start an asset download; the status is left for the caller to judge
    pub async fn fetch_asset(&self, url: &str) -> Result<Response> {
        debug!("GET {} (timeout {:?})", url, self.asset_timeout);
        Ok(self
            .client
            .get(url)
            .timeout(self.asset_timeout)
            .send()
            .await?)
    }
}
