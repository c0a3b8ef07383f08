//! Company rows, valuation periods and the spread derived from them.
//!
//! Fixture JSON comes in more than one naming convention and numeric fields
//! are frequently empty strings or `null`, so every numeric field decodes
//! leniently into an `Option<f64>` instead of failing the whole document.

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::str::FromStr;

/// Metrics whose raw value is a ratio and is shown as a percentage.
pub const PERCENT_METRICS: [&str; 5] = ["FCF yield", "ROIC", "ReinvRate", "OMS", "EVA/InvCap"];

/// Extracts a number from a raw JSON value. NaN is treated as absent.
pub(crate) fn number_from_value(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| !n.is_nan())
}

pub(crate) fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_from_value))
}

pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}

fn lenient_year<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(number_from_value)
        .map(|y| y as i32)
        .unwrap_or_default())
}

/// Industry-relative strength of a single metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Evaluation {
    Weak,
    Moderate,
    Strong,
}

impl FromStr for Evaluation {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "weak" => Ok(Evaluation::Weak),
            "moderate" => Ok(Evaluation::Moderate),
            "strong" => Ok(Evaluation::Strong),
            _ => Err(anyhow::anyhow!("Invalid evaluation: {}", s)),
        }
    }
}

fn lenient_evaluation<'de, D>(deserializer: D) -> Result<Option<Evaluation>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => s.parse().ok(),
        _ => None,
    })
}

/// Raw metric value; fixtures mix numbers, numeric strings and free text.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum MetricValue {
    Number(f64),
    Text(String),
    #[default]
    Missing,
}

impl<'de> Deserialize<'de> for MetricValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            None | Some(Value::Null) => MetricValue::Missing,
            Some(Value::String(s)) if s.trim().is_empty() => MetricValue::Missing,
            Some(v) => match number_from_value(&v) {
                Some(n) => MetricValue::Number(n),
                None => match v {
                    Value::String(s) => MetricValue::Text(s),
                    other => MetricValue::Text(other.to_string()),
                },
            },
        })
    }
}

impl Serialize for MetricValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            MetricValue::Number(n) => serializer.serialize_f64(*n),
            MetricValue::Text(s) => serializer.serialize_str(s),
            MetricValue::Missing => serializer.serialize_none(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PerformanceMetric {
    #[serde(default, alias = "Value")]
    pub value: MetricValue,
    #[serde(default, alias = "Evaluation", deserialize_with = "lenient_evaluation")]
    pub evaluation: Option<Evaluation>,
}

impl PerformanceMetric {
    /// Formats the value for display. Percent metrics are scaled by 100.
    pub fn display_value(&self, metric_name: &str) -> String {
        match &self.value {
            MetricValue::Number(n) if PERCENT_METRICS.contains(&metric_name) => {
                format!("{:.2}%", n * 100.0)
            }
            MetricValue::Number(n) => format!("{n:.2}"),
            MetricValue::Text(s) => s.clone(),
            MetricValue::Missing => String::new(),
        }
    }
}

/// Named metrics in the order they appear in the fixture.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MetricSet(Vec<(String, PerformanceMetric)>);

impl MetricSet {
    pub fn new(metrics: Vec<(String, PerformanceMetric)>) -> Self {
        MetricSet(metrics)
    }

    pub fn get(&self, name: &str) -> Option<&PerformanceMetric> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, m)| m)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(n, _)| n.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Ratio of metrics rated strong to metrics rated weak.
    ///
    /// Infinite when only strong ratings exist and zero when there are
    /// neither strong nor weak ratings.
    pub fn comparative_score(&self) -> f64 {
        let count = |wanted: Evaluation| {
            self.0
                .iter()
                .filter(|(_, m)| m.evaluation == Some(wanted))
                .count()
        };
        let strong = count(Evaluation::Strong);
        let weak = count(Evaluation::Weak);
        if weak > 0 {
            strong as f64 / weak as f64
        } else if strong > 0 {
            f64::INFINITY
        } else {
            0.0
        }
    }
}

/// A metric entry is either `{Value, Evaluation}` or a bare value. Anything
/// that is not a map of metrics decodes as an empty set.
fn metric_from_value(value: Value) -> PerformanceMetric {
    match value {
        Value::Object(_) => serde_json::from_value(value).unwrap_or_default(),
        other => PerformanceMetric {
            value: MetricValue::deserialize(other).unwrap_or_default(),
            evaluation: None,
        },
    }
}

impl<'de> Deserialize<'de> for MetricSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::Object(entries)) => MetricSet(
                entries
                    .into_iter()
                    .map(|(name, metric)| (name, metric_from_value(metric)))
                    .collect(),
            ),
            _ => MetricSet::default(),
        })
    }
}

impl Serialize for MetricSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, metric) in &self.0 {
            map.serialize_entry(name, metric)?;
        }
        map.end()
    }
}

/// Range, average and difference of the two intrinsic value estimates
/// against a market price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedSpread {
    pub range_min: f64,
    pub range_max: f64,
    pub average_value: f64,
    /// `average_value / price - 1`; positive means the price is below the
    /// estimated intrinsic value.
    pub difference: f64,
}

impl DerivedSpread {
    /// Returns `None` when the price is absent or zero, or either estimate
    /// is absent or not finite.
    pub fn compute(price: Option<f64>, dcf: Option<f64>, exit: Option<f64>) -> Option<Self> {
        let price = price.filter(|p| p.is_finite() && *p != 0.0)?;
        let (range_min, range_max) = intrinsic_range(dcf, exit)?;
        let average_value = (range_min + range_max) / 2.0;
        Some(DerivedSpread {
            range_min,
            range_max,
            average_value,
            difference: average_value / price - 1.0,
        })
    }

    pub fn difference_percent(&self) -> f64 {
        self.difference * 100.0
    }
}

/// Orders the two estimates as `(min, max)`.
pub fn intrinsic_range(dcf: Option<f64>, exit: Option<f64>) -> Option<(f64, f64)> {
    let dcf = dcf.filter(|v| v.is_finite())?;
    let exit = exit.filter(|v| v.is_finite())?;
    Some((dcf.min(exit), dcf.max(exit)))
}

/// One row of the company list.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Company {
    /// Rows without a ticker decode to an empty string and are dropped by
    /// the providers.
    #[serde(default, alias = "Ticker", deserialize_with = "lenient_string")]
    pub ticker: String,
    #[serde(
        default,
        alias = "Company",
        alias = "companyName",
        deserialize_with = "lenient_string"
    )]
    pub name: String,
    #[serde(
        default,
        alias = "Sector",
        alias = "industry",
        deserialize_with = "lenient_string"
    )]
    pub sector: String,
    #[serde(
        default,
        alias = "MarketCap",
        alias = "marketCap",
        deserialize_with = "lenient_f64"
    )]
    pub market_cap: Option<f64>,
    #[serde(
        default,
        alias = "CurrentPrice",
        alias = "currentPrice",
        deserialize_with = "lenient_f64"
    )]
    pub current_price: Option<f64>,
    #[serde(
        default,
        alias = "DCFValue",
        alias = "dcfValue",
        deserialize_with = "lenient_f64"
    )]
    pub dcf_value: Option<f64>,
    #[serde(
        default,
        alias = "ExitMultipleValue",
        alias = "exitMultipleValue",
        deserialize_with = "lenient_f64"
    )]
    pub exit_multiple_value: Option<f64>,
    #[serde(
        default,
        alias = "Comparatives",
        alias = "comparativeScore",
        deserialize_with = "lenient_f64"
    )]
    pub comparative_score: Option<f64>,
    #[serde(
        default,
        alias = "LatestPerformanceMetrics",
        alias = "LatestCombinedPerformanceMetrics"
    )]
    pub latest_metrics: MetricSet,
}

impl Company {
    pub fn spread(&self) -> Option<DerivedSpread> {
        DerivedSpread::compute(self.current_price, self.dcf_value, self.exit_multiple_value)
    }

    pub fn difference(&self) -> Option<f64> {
        self.spread().map(|s| s.difference)
    }

    /// The published score, or one derived from the latest metrics when the
    /// row carries none.
    pub fn comparatives(&self) -> Option<f64> {
        self.comparative_score.or_else(|| {
            (!self.latest_metrics.is_empty()).then(|| self.latest_metrics.comparative_score())
        })
    }

    pub fn intrinsic_average(&self) -> Option<f64> {
        intrinsic_range(self.dcf_value, self.exit_multiple_value).map(|(lo, hi)| (lo + hi) / 2.0)
    }

    /// Market cap in billions; absent values count as zero.
    pub fn market_cap_billions(&self) -> f64 {
        self.market_cap.unwrap_or(0.0) / 1e9
    }
}

/// One year of valuation estimates and metrics for a company.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValuationPeriod {
    #[serde(default, alias = "Year", deserialize_with = "lenient_year")]
    pub year: i32,
    #[serde(
        default,
        alias = "DCFValue",
        alias = "dcfValue",
        deserialize_with = "lenient_f64"
    )]
    pub dcf_value: Option<f64>,
    #[serde(
        default,
        alias = "ExitMultipleValue",
        alias = "exitMultipleValue",
        deserialize_with = "lenient_f64"
    )]
    pub exit_multiple_value: Option<f64>,
    #[serde(
        default,
        alias = "MarketCap",
        alias = "marketCap",
        deserialize_with = "lenient_f64"
    )]
    pub market_cap: Option<f64>,
    #[serde(default, alias = "PerformanceMetrics")]
    pub performance_metrics: MetricSet,
}
