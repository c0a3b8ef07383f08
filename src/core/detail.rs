//! The per-company detail document and the views derived from it.

use crate::core::company::{
    DerivedSpread, Evaluation, ValuationPeriod, intrinsic_range, lenient_f64, lenient_string,
};
use crate::core::series::{self, Alignment, LookbackPeriod, PricePoint, ValuationBand};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, de};
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct CompanyDetail {
    #[serde(
        default,
        alias = "Company",
        alias = "companyName",
        deserialize_with = "lenient_string"
    )]
    pub name: String,
    #[serde(default, alias = "Ticker", deserialize_with = "lenient_string")]
    pub ticker: String,
    #[serde(default, alias = "Sector", deserialize_with = "lenient_string")]
    pub sector: String,
    #[serde(default, alias = "Description", deserialize_with = "lenient_string")]
    pub description: String,
    /// Ascending by date.
    #[serde(
        default,
        alias = "HistoricalPrices",
        deserialize_with = "deserialize_prices"
    )]
    pub historical_prices: Vec<PricePoint>,
    /// Ascending by year.
    #[serde(default, alias = "Years", deserialize_with = "deserialize_years")]
    pub years: Vec<ValuationPeriod>,
}

#[derive(Deserialize)]
struct RawPrice {
    #[serde(default, alias = "Date")]
    date: Option<Value>,
    #[serde(default, alias = "Close", deserialize_with = "lenient_f64")]
    close: Option<f64>,
}

/// Accepts `YYYY-MM-DD` or an ISO timestamp; only the date part is kept.
fn parse_price_date(raw: &Value) -> Option<NaiveDate> {
    let text = raw.as_str()?;
    let date_part = text.split('T').next()?.trim();
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

fn deserialize_prices<'de, D>(deserializer: D) -> Result<Vec<PricePoint>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<RawPrice>>::deserialize(deserializer)?.unwrap_or_default();
    let total = raw.len();
    let mut prices: Vec<PricePoint> = raw
        .into_iter()
        .filter_map(|p| {
            let date = p.date.as_ref().and_then(parse_price_date)?;
            let price = p.close.filter(|c| c.is_finite())?;
            Some(PricePoint { date, price })
        })
        .collect();
    prices.sort_by_key(|p| p.date);
    if prices.len() < total {
        debug!(
            dropped = total - prices.len(),
            "Skipped price points with unusable date or close"
        );
    }
    Ok(prices)
}

fn deserialize_years<'de, D>(deserializer: D) -> Result<Vec<ValuationPeriod>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let mut years = match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .into_iter()
            .map(serde_json::from_value::<ValuationPeriod>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(de::Error::custom)?,
        Some(Value::Object(entries)) => {
            let mut years = Vec::with_capacity(entries.len());
            for (key, entry) in entries {
                let mut period: ValuationPeriod =
                    serde_json::from_value(entry).map_err(de::Error::custom)?;
                if period.year == 0 {
                    period.year = key
                        .trim()
                        .parse::<i32>()
                        .map_err(|_| de::Error::custom(format!("Invalid year key: {key}")))?;
                }
                years.push(period);
            }
            years
        }
        Some(other) => {
            return Err(de::Error::custom(format!(
                "Expected a list or map of years, got {other}"
            )));
        }
    };
    years.sort_by_key(|y| y.year);
    Ok(years)
}

/// Figures shown on the info cards of the analysis view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatestValuation {
    pub price: Option<f64>,
    /// Most recent year with both estimates present.
    pub year: Option<i32>,
    pub intrinsic_range: Option<(f64, f64)>,
    pub spread: Option<DerivedSpread>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricCell {
    pub display: String,
    pub evaluation: Option<Evaluation>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsRow {
    pub name: String,
    /// One cell per entry of [`MetricsGrid::years`].
    pub cells: Vec<MetricCell>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MetricsGrid {
    pub years: Vec<i32>,
    pub rows: Vec<MetricsRow>,
}

impl CompanyDetail {
    /// Each year becomes a band over that calendar year. Missing estimates
    /// are kept as NaN so the band never matches.
    pub fn valuation_bands(&self) -> Vec<ValuationBand> {
        self.years
            .iter()
            .filter_map(|y| {
                Some(ValuationBand {
                    start_date: NaiveDate::from_ymd_opt(y.year, 1, 1)?,
                    end_date: NaiveDate::from_ymd_opt(y.year, 12, 31)?,
                    first: y.dcf_value.unwrap_or(f64::NAN),
                    second: y.exit_multiple_value.unwrap_or(f64::NAN),
                })
            })
            .collect()
    }

    pub fn align(&self, period: LookbackPeriod, today: NaiveDate) -> Alignment {
        series::align(&self.historical_prices, &self.valuation_bands(), period, today)
    }

    pub fn latest_price(&self) -> Option<f64> {
        self.historical_prices.last().map(|p| p.price)
    }

    pub fn latest_valuation(&self) -> LatestValuation {
        let price = self.latest_price();
        let latest = self
            .years
            .iter()
            .rev()
            .find(|y| intrinsic_range(y.dcf_value, y.exit_multiple_value).is_some());
        match latest {
            Some(period) => LatestValuation {
                price,
                year: Some(period.year),
                intrinsic_range: intrinsic_range(period.dcf_value, period.exit_multiple_value),
                spread: DerivedSpread::compute(
                    price,
                    period.dcf_value,
                    period.exit_multiple_value,
                ),
            },
            None => LatestValuation {
                price,
                year: None,
                intrinsic_range: None,
                spread: None,
            },
        }
    }

    /// Market cap reported for the last year.
    pub fn market_cap(&self) -> Option<f64> {
        self.years.last().and_then(|y| y.market_cap)
    }

    /// Comparative score of the last year that has any metrics.
    pub fn comparative_score(&self) -> Option<f64> {
        self.years
            .iter()
            .rev()
            .find(|y| !y.performance_metrics.is_empty())
            .map(|y| y.performance_metrics.comparative_score())
    }

    /// Metric names come from the first year in their original order; later
    /// years missing a metric get an empty cell.
    pub fn metrics_grid(&self) -> MetricsGrid {
        let Some(first) = self.years.first() else {
            return MetricsGrid::default();
        };
        let rows = first
            .performance_metrics
            .names()
            .map(|name| MetricsRow {
                name: name.to_string(),
                cells: self
                    .years
                    .iter()
                    .map(|y| match y.performance_metrics.get(name) {
                        Some(metric) => MetricCell {
                            display: metric.display_value(name),
                            evaluation: metric.evaluation,
                        },
                        None => MetricCell {
                            display: String::new(),
                            evaluation: None,
                        },
                    })
                    .collect(),
            })
            .collect();
        MetricsGrid {
            years: self.years.iter().map(|y| y.year).collect(),
            rows,
        }
    }
}
