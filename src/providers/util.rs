use crate::core::Company;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use tracing::debug;

const DATA_DIR: &str = "companies-data";

/// Fixture path of the company list, relative to the data source root.
pub fn companies_path() -> String {
    format!("{DATA_DIR}/companies.json")
}

/// Fixture path of a company detail document. Tickers are stored upper case.
pub fn detail_path(ticker: &str) -> String {
    format!("{DATA_DIR}/details/{}.json", ticker.trim().to_uppercase())
}

/// Parses a fixture body, naming its origin in the error.
pub fn parse_fixture<T: DeserializeOwned>(body: &str, origin: &str) -> Result<T> {
    if body.trim().is_empty() {
        anyhow::bail!("Received empty document from {}", origin);
    }
    serde_json::from_str(body).with_context(|| format!("Failed to parse JSON from {origin}"))
}

/// Drops rows that cannot be addressed because they carry no ticker.
pub fn keep_identified(companies: Vec<Company>) -> Vec<Company> {
    let total = companies.len();
    let kept: Vec<Company> = companies
        .into_iter()
        .filter(|c| !c.ticker.trim().is_empty())
        .collect();
    if kept.len() < total {
        debug!(dropped = total - kept.len(), "Skipped companies without a ticker");
    }
    kept
}
