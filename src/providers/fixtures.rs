use crate::core::{Company, CompanyDetail, DataProvider};
use crate::providers::util::{companies_path, detail_path, keep_identified, parse_fixture};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Reads the published JSON fixtures from a web server.
pub struct HttpFixtureProvider {
    base_url: String,
    client: reqwest::Client,
}

impl HttpFixtureProvider {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("oakie/1.0")
            .build()
            .context("Failed to build HTTP client")?;
        Ok(HttpFixtureProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, relative: &str) -> Result<T> {
        let url = format!("{}/{}", self.base_url, relative);
        debug!("Requesting fixture from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} URL: {}", e, url))?;

        if !response.status().is_success() {
            return Err(anyhow!("HTTP error: {} for URL: {}", response.status(), url));
        }

        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read response body from {url}"))?;
        parse_fixture(&body, &url)
    }
}

#[async_trait]
impl DataProvider for HttpFixtureProvider {
    #[instrument(name = "HttpCompaniesFetch", skip(self))]
    async fn fetch_companies(&self) -> Result<Vec<Company>> {
        let companies = keep_identified(self.get_json(&companies_path()).await?);
        debug!(count = companies.len(), "Loaded company list");
        Ok(companies)
    }

    #[instrument(name = "HttpDetailFetch", skip(self), fields(ticker = %ticker))]
    async fn fetch_detail(&self, ticker: &str) -> Result<CompanyDetail> {
        self.get_json(&detail_path(ticker)).await
    }
}

/// Reads the same fixture layout from a local directory.
pub struct LocalFixtureProvider {
    root: PathBuf,
}

impl LocalFixtureProvider {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        LocalFixtureProvider {
            root: root.as_ref().to_path_buf(),
        }
    }

    async fn read_json<T: DeserializeOwned>(&self, relative: &str) -> Result<T> {
        let path = self.root.join(relative);
        debug!("Reading fixture from {}", path.display());
        let body = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read fixture: {}", path.display()))?;
        parse_fixture(&body, &path.display().to_string())
    }
}

#[async_trait]
impl DataProvider for LocalFixtureProvider {
    #[instrument(name = "LocalCompaniesFetch", skip(self))]
    async fn fetch_companies(&self) -> Result<Vec<Company>> {
        let companies = keep_identified(self.read_json(&companies_path()).await?);
        debug!(count = companies.len(), "Loaded company list");
        Ok(companies)
    }

    #[instrument(name = "LocalDetailFetch", skip(self), fields(ticker = %ticker))]
    async fn fetch_detail(&self, ticker: &str) -> Result<CompanyDetail> {
        self.read_json(&detail_path(ticker)).await
    }
}
