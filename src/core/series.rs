//! Aligns a daily price series with date-ranged valuation bands and derives
//! the summary figures shown next to the price chart.

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;
use tracing::debug;

/// Padding applied below the lowest and above the highest charted value.
const Y_AXIS_PADDING: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum LookbackPeriod {
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "3M")]
    ThreeMonths,
    #[serde(rename = "6M")]
    SixMonths,
    #[serde(rename = "YTD")]
    YearToDate,
    #[serde(rename = "1Y")]
    OneYear,
    #[serde(rename = "2Y")]
    TwoYears,
    #[serde(rename = "3Y")]
    ThreeYears,
    #[serde(rename = "4Y")]
    FourYears,
    #[serde(rename = "5Y")]
    FiveYears,
    #[serde(rename = "All", alias = "ALL", alias = "all")]
    All,
}

impl Display for LookbackPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                LookbackPeriod::OneMonth => "1M",
                LookbackPeriod::ThreeMonths => "3M",
                LookbackPeriod::SixMonths => "6M",
                LookbackPeriod::YearToDate => "YTD",
                LookbackPeriod::OneYear => "1Y",
                LookbackPeriod::TwoYears => "2Y",
                LookbackPeriod::ThreeYears => "3Y",
                LookbackPeriod::FourYears => "4Y",
                LookbackPeriod::FiveYears => "5Y",
                LookbackPeriod::All => "All",
            }
        )
    }
}

impl FromStr for LookbackPeriod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "1M" => Ok(LookbackPeriod::OneMonth),
            "3M" => Ok(LookbackPeriod::ThreeMonths),
            "6M" => Ok(LookbackPeriod::SixMonths),
            "YTD" => Ok(LookbackPeriod::YearToDate),
            "1Y" => Ok(LookbackPeriod::OneYear),
            "2Y" => Ok(LookbackPeriod::TwoYears),
            "3Y" => Ok(LookbackPeriod::ThreeYears),
            "4Y" => Ok(LookbackPeriod::FourYears),
            "5Y" => Ok(LookbackPeriod::FiveYears),
            "ALL" => Ok(LookbackPeriod::All),
            _ => Err(anyhow::anyhow!("Invalid lookback period: {}", s)),
        }
    }
}

impl LookbackPeriod {
    /// Windows of the stock price change table, in display order.
    pub const TRAILING: [LookbackPeriod; 9] = [
        LookbackPeriod::OneMonth,
        LookbackPeriod::ThreeMonths,
        LookbackPeriod::SixMonths,
        LookbackPeriod::YearToDate,
        LookbackPeriod::OneYear,
        LookbackPeriod::TwoYears,
        LookbackPeriod::ThreeYears,
        LookbackPeriod::FourYears,
        LookbackPeriod::FiveYears,
    ];

    /// First date covered by the period, or `None` for [`LookbackPeriod::All`].
    pub fn start_date(&self, today: NaiveDate) -> Option<NaiveDate> {
        let months_back = |n: u32| today.checked_sub_months(Months::new(n));
        match self {
            LookbackPeriod::OneMonth => months_back(1),
            LookbackPeriod::ThreeMonths => months_back(3),
            LookbackPeriod::SixMonths => months_back(6),
            LookbackPeriod::YearToDate => NaiveDate::from_ymd_opt(today.year(), 1, 1),
            LookbackPeriod::OneYear => months_back(12),
            LookbackPeriod::TwoYears => months_back(24),
            LookbackPeriod::ThreeYears => months_back(36),
            LookbackPeriod::FourYears => months_back(48),
            LookbackPeriod::FiveYears => months_back(60),
            LookbackPeriod::All => None,
        }
    }
}

/// A pair of intrinsic value estimates valid over an inclusive date range.
///
/// The two values are stored in source order; which one is the low end of
/// the band is decided when the band is used.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValuationBand {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub first: f64,
    pub second: f64,
}

impl ValuationBand {
    /// `(low, high)`, or `None` when either value is not finite.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        if self.first.is_finite() && self.second.is_finite() {
            Some((self.first.min(self.second), self.first.max(self.second)))
        } else {
            None
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    fn intersects(&self, start: Option<NaiveDate>, end: NaiveDate) -> bool {
        self.start_date <= end && start.is_none_or(|s| self.end_date >= s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlignedPoint {
    pub date: NaiveDate,
    pub price: f64,
    pub low: Option<f64>,
    pub high: Option<f64>,
}

impl AlignedPoint {
    /// Percent gap between the price and the middle of its band.
    pub fn band_difference_percent(&self) -> Option<f64> {
        let mid = (self.low? + self.high?) / 2.0;
        if mid == 0.0 {
            return None;
        }
        Some((self.price - mid) / mid * 100.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceChange {
    pub price_diff: f64,
    pub percent_diff: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedSeries {
    pub period: LookbackPeriod,
    pub period_start: Option<NaiveDate>,
    pub points: Vec<AlignedPoint>,
    pub y_axis_min: f64,
    pub y_axis_max: f64,
    pub period_return_percent: Option<f64>,
    pub trailing_changes: BTreeMap<LookbackPeriod, Option<PriceChange>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Alignment {
    /// No price falls inside the selected period.
    NoData,
    Aligned(AlignedSeries),
}

/// Merges `prices` with `bands` for the selected lookback period.
///
/// Each retained price carries the first band whose range contains its
/// date; bands with non-finite values never match.
pub fn align(
    prices: &[PricePoint],
    bands: &[ValuationBand],
    period: LookbackPeriod,
    today: NaiveDate,
) -> Alignment {
    let period_start = period.start_date(today);

    let in_period: Vec<&PricePoint> = prices
        .iter()
        .filter(|p| period_start.is_none_or(|start| p.date >= start))
        .collect();
    if in_period.is_empty() {
        debug!(%period, total = prices.len(), "No prices inside lookback period");
        return Alignment::NoData;
    }

    let active_bands: Vec<(&ValuationBand, (f64, f64))> = bands
        .iter()
        .filter(|b| b.intersects(period_start, today))
        .filter_map(|b| b.bounds().map(|bounds| (b, bounds)))
        .collect();
    debug!(
        %period,
        points = in_period.len(),
        bands = active_bands.len(),
        "Aligning prices with valuation bands"
    );

    let points: Vec<AlignedPoint> = in_period
        .iter()
        .map(|p| {
            let band = active_bands
                .iter()
                .find(|(band, _)| band.contains(p.date))
                .map(|(_, bounds)| *bounds);
            AlignedPoint {
                date: p.date,
                price: p.price,
                low: band.map(|(low, _)| low),
                high: band.map(|(_, high)| high),
            }
        })
        .collect();

    let (min, max) = points
        .iter()
        .flat_map(|p| [Some(p.price), p.low, p.high])
        .flatten()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });

    Alignment::Aligned(AlignedSeries {
        period,
        period_start,
        y_axis_min: min * (1.0 - Y_AXIS_PADDING),
        y_axis_max: max * (1.0 + Y_AXIS_PADDING),
        period_return_percent: period_return(&points),
        trailing_changes: trailing_changes(prices, today),
        points,
    })
}

fn period_return(points: &[AlignedPoint]) -> Option<f64> {
    if points.len() < 2 {
        return None;
    }
    let first = points.first()?.price;
    let last = points.last()?.price;
    if first == 0.0 {
        return None;
    }
    Some((last - first) / first * 100.0)
}

/// Change from the price nearest each trailing window's start to the last
/// price of the series. Ties in distance keep the earlier point.
pub fn trailing_changes(
    prices: &[PricePoint],
    today: NaiveDate,
) -> BTreeMap<LookbackPeriod, Option<PriceChange>> {
    let last = prices.last().map(|p| p.price);

    LookbackPeriod::TRAILING
        .iter()
        .map(|&window| {
            let change = window
                .start_date(today)
                .and_then(|start| nearest_price(prices, start))
                .zip(last)
                .filter(|(start_price, _)| *start_price != 0.0)
                .map(|(start_price, last)| PriceChange {
                    price_diff: last - start_price,
                    percent_diff: (last - start_price) / start_price * 100.0,
                });
            (window, change)
        })
        .collect()
}

fn nearest_price(prices: &[PricePoint], target: NaiveDate) -> Option<f64> {
    let mut best: Option<(i64, f64)> = None;
    for p in prices {
        let distance = (p.date - target).num_days().abs();
        if best.is_none_or(|(d, _)| distance < d) {
            best = Some((distance, p.price));
        }
    }
    best.map(|(_, price)| price)
}
