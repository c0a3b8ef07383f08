//! Data loading abstraction

use crate::core::company::Company;
use crate::core::detail::CompanyDetail;
use anyhow::Result;
use async_trait::async_trait;

/// Source of the company list and per-company detail documents.
///
/// Each call is a single attempt; callers decide how a failure degrades.
#[async_trait]
pub trait DataProvider: Send + Sync {
    async fn fetch_companies(&self) -> Result<Vec<Company>>;
    async fn fetch_detail(&self, ticker: &str) -> Result<CompanyDetail>;
}
