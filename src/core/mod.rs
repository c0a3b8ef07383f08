//! Domain types and the pure list and series logic

pub mod company;
pub mod config;
pub mod detail;
pub mod log;
pub mod provider;
pub mod query;
pub mod series;

pub use company::{Company, DerivedSpread, Evaluation, MetricValue, ValuationPeriod};
pub use detail::CompanyDetail;
pub use provider::DataProvider;
pub use query::{MarketCapBand, QueryParams, QueryResult, SortDirection, SortField};
pub use series::{Alignment, LookbackPeriod, PricePoint, ValuationBand};
