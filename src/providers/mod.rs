pub mod fixtures;
pub mod util;

use crate::core::DataProvider;
use crate::core::config::DataSource;
use anyhow::Result;
use std::sync::Arc;

pub use fixtures::{HttpFixtureProvider, LocalFixtureProvider};

/// Builds the provider for a resolved data source.
pub fn from_source(source: &DataSource) -> Result<Arc<dyn DataProvider>> {
    Ok(match source {
        DataSource::Http(base_url) => Arc::new(HttpFixtureProvider::new(base_url)?),
        DataSource::Local(path) => Arc::new(LocalFixtureProvider::new(path)),
    })
}
