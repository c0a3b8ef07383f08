//! Filter, sort and paginate the company list.

use crate::core::company::Company;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt::Display;
use std::str::FromStr;
use tracing::debug;

pub const PAGE_SIZE: usize = 15;

/// Sector filter value that matches every company.
pub const ALL_SECTORS: &str = "All sectors";

const LEADING_PAGE_LINKS: usize = 5;
const TRAILING_PAGE_LINKS: usize = 2;

/// Market capitalisation bands, in billions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketCapBand {
    /// Below 2
    Micro,
    /// From 2 up to but excluding 10
    Small,
    /// From 10 to 200 inclusive
    Mid,
    /// Above 200
    Large,
}

impl MarketCapBand {
    pub fn contains(&self, billions: f64) -> bool {
        match self {
            MarketCapBand::Micro => billions < 2.0,
            MarketCapBand::Small => (2.0..10.0).contains(&billions),
            MarketCapBand::Mid => (10.0..=200.0).contains(&billions),
            MarketCapBand::Large => billions > 200.0,
        }
    }
}

impl FromStr for MarketCapBand {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "micro" => Ok(MarketCapBand::Micro),
            "small" => Ok(MarketCapBand::Small),
            "mid" => Ok(MarketCapBand::Mid),
            "large" => Ok(MarketCapBand::Large),
            _ => Err(anyhow::anyhow!("Invalid market cap band: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortField {
    Name,
    Ticker,
    Sector,
    MarketCap,
    CurrentPrice,
    DcfValue,
    ExitMultipleValue,
    Comparatives,
    Difference,
    IntrinsicAverage,
}

impl Display for SortField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                SortField::Name => "name",
                SortField::Ticker => "ticker",
                SortField::Sector => "sector",
                SortField::MarketCap => "market-cap",
                SortField::CurrentPrice => "price",
                SortField::DcfValue => "dcf",
                SortField::ExitMultipleValue => "exit-multiple",
                SortField::Comparatives => "comparatives",
                SortField::Difference => "difference",
                SortField::IntrinsicAverage => "intrinsic",
            }
        )
    }
}

impl FromStr for SortField {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "name" | "company" => Ok(SortField::Name),
            "ticker" => Ok(SortField::Ticker),
            "sector" => Ok(SortField::Sector),
            "market-cap" | "marketcap" => Ok(SortField::MarketCap),
            "price" | "current-price" => Ok(SortField::CurrentPrice),
            "dcf" => Ok(SortField::DcfValue),
            "exit-multiple" | "exit" => Ok(SortField::ExitMultipleValue),
            "comparatives" => Ok(SortField::Comparatives),
            "difference" => Ok(SortField::Difference),
            "intrinsic" | "intrinsic-average" => Ok(SortField::IntrinsicAverage),
            _ => Err(anyhow::anyhow!("Invalid sort field: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub field: SortField,
    pub direction: SortDirection,
}

/// Everything the list view needs to reproduce a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryParams {
    #[serde(default)]
    pub search_term: String,
    /// `None`, an empty string and [`ALL_SECTORS`] all match every sector.
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub market_cap: Option<MarketCapBand>,
    #[serde(default)]
    pub sort: Option<Sort>,
    /// 1-based.
    #[serde(default = "first_page")]
    pub page: usize,
}

fn first_page() -> usize {
    1
}

impl Default for QueryParams {
    fn default() -> Self {
        QueryParams {
            search_term: String::new(),
            sector: None,
            market_cap: None,
            sort: None,
            page: first_page(),
        }
    }
}

impl QueryParams {
    /// Selecting the current sort field flips its direction; any other
    /// field starts ascending. Always returns to the first page.
    pub fn toggle_sort(&mut self, field: SortField) {
        let direction = match self.sort {
            Some(current) if current.field == field => match current.direction {
                SortDirection::Ascending => SortDirection::Descending,
                SortDirection::Descending => SortDirection::Ascending,
            },
            _ => SortDirection::Ascending,
        };
        self.sort = Some(Sort { field, direction });
        self.page = 1;
    }

    pub fn set_search_term(&mut self, term: &str) {
        self.search_term = term.to_string();
        self.page = 1;
    }

    pub fn set_sector(&mut self, sector: Option<String>) {
        self.sector = sector;
        self.page = 1;
    }

    pub fn set_market_cap(&mut self, band: Option<MarketCapBand>) {
        self.market_cap = band;
        self.page = 1;
    }

    /// Resets search, sector and market cap filters; sorting is kept.
    pub fn clear_filters(&mut self) {
        self.search_term.clear();
        self.sector = None;
        self.market_cap = None;
        self.page = 1;
    }

    fn matches(&self, company: &Company) -> bool {
        let sector_ok = match self.sector.as_deref() {
            None | Some("") | Some(ALL_SECTORS) => true,
            Some(sector) => company.sector == sector,
        };
        let cap_ok = self
            .market_cap
            .is_none_or(|band| band.contains(company.market_cap_billions()));
        let term = self.search_term.to_lowercase();
        let search_ok = company.name.to_lowercase().contains(&term)
            || company.ticker.to_lowercase().contains(&term);
        sector_ok && cap_ok && search_ok
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult<'a> {
    pub page_items: Vec<&'a Company>,
    pub total_matched: usize,
    pub page_count: usize,
}

/// Runs the filter, sort and paginate stages over `companies`.
///
/// The sort is stable, so ties keep their filtered order and identical
/// inputs always produce the same page. A page past the end is empty.
pub fn query<'a>(companies: &'a [Company], params: &QueryParams) -> QueryResult<'a> {
    let mut matched: Vec<&Company> = companies.iter().filter(|c| params.matches(c)).collect();
    let total_matched = matched.len();

    if let Some(sort) = params.sort {
        matched.sort_by(|a, b| {
            let ordering = compare(a, b, sort.field);
            match sort.direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });
    }

    let page_count = total_matched.div_ceil(PAGE_SIZE);
    let start = params.page.saturating_sub(1).saturating_mul(PAGE_SIZE);
    let page_items: Vec<&Company> = matched.into_iter().skip(start).take(PAGE_SIZE).collect();

    debug!(
        total = companies.len(),
        total_matched,
        page = params.page,
        page_count,
        "Company query evaluated"
    );

    QueryResult {
        page_items,
        total_matched,
        page_count,
    }
}

fn compare(a: &Company, b: &Company, field: SortField) -> Ordering {
    let text = |s: &str| s.to_lowercase();
    let number = |v: Option<f64>| v.filter(|n| !n.is_nan()).unwrap_or(0.0);
    match field {
        SortField::Name => text(&a.name).cmp(&text(&b.name)),
        SortField::Ticker => text(&a.ticker).cmp(&text(&b.ticker)),
        SortField::Sector => text(&a.sector).cmp(&text(&b.sector)),
        SortField::MarketCap => number(a.market_cap).total_cmp(&number(b.market_cap)),
        SortField::CurrentPrice => number(a.current_price).total_cmp(&number(b.current_price)),
        SortField::DcfValue => number(a.dcf_value).total_cmp(&number(b.dcf_value)),
        SortField::ExitMultipleValue => {
            number(a.exit_multiple_value).total_cmp(&number(b.exit_multiple_value))
        }
        SortField::Comparatives => {
            number(a.comparatives()).total_cmp(&number(b.comparatives()))
        }
        SortField::IntrinsicAverage => {
            number(a.intrinsic_average()).total_cmp(&number(b.intrinsic_average()))
        }
        SortField::Difference => {
            let difference = |c: &Company| c.difference().unwrap_or(f64::NEG_INFINITY);
            difference(a).total_cmp(&difference(b))
        }
    }
}

/// Unique non-empty sectors, sorted, behind the [`ALL_SECTORS`] option.
pub fn sector_options(companies: &[Company]) -> Vec<String> {
    let sectors: BTreeSet<&str> = companies
        .iter()
        .map(|c| c.sector.as_str())
        .filter(|s| !s.is_empty())
        .collect();
    std::iter::once(ALL_SECTORS.to_string())
        .chain(sectors.into_iter().map(str::to_string))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLink {
    Page(usize),
    Ellipsis,
}

/// Page links shown under the table: the first five pages, the current page
/// when it sits between them and the last two, and the last two pages.
pub fn page_links(current: usize, page_count: usize) -> Vec<PageLink> {
    let mut links: Vec<PageLink> = (1..=page_count.min(LEADING_PAGE_LINKS))
        .map(PageLink::Page)
        .collect();

    if page_count > LEADING_PAGE_LINKS + TRAILING_PAGE_LINKS {
        let trailing_start = page_count - TRAILING_PAGE_LINKS + 1;
        if current > LEADING_PAGE_LINKS && current < trailing_start {
            links.push(PageLink::Ellipsis);
            links.push(PageLink::Page(current));
        }
        links.push(PageLink::Ellipsis);
        links.extend((trailing_start..=page_count).map(PageLink::Page));
    } else {
        links.extend((LEADING_PAGE_LINKS + 1..=page_count).map(PageLink::Page));
    }
    links
}

#[cfg(test)]
mod tests {
    use super::*;

    fn company(ticker: &str, name: &str, sector: &str, market_cap: f64) -> Company {
        Company {
            ticker: ticker.to_string(),
            name: name.to_string(),
            sector: sector.to_string(),
            market_cap: Some(market_cap),
            ..Default::default()
        }
    }

    fn valued(ticker: &str, price: Option<f64>, dcf: Option<f64>, exit: Option<f64>) -> Company {
        Company {
            ticker: ticker.to_string(),
            name: ticker.to_string(),
            current_price: price,
            dcf_value: dcf,
            exit_multiple_value: exit,
            ..Default::default()
        }
    }

    fn numbered(count: usize) -> Vec<Company> {
        (0..count)
            .map(|i| company(&format!("T{i:02}"), &format!("Company {i:02}"), "Tech", 5e9))
            .collect()
    }

    fn tickers(result: &QueryResult) -> Vec<String> {
        result.page_items.iter().map(|c| c.ticker.clone()).collect()
    }

    fn sorted_by(field: SortField, direction: SortDirection) -> QueryParams {
        QueryParams {
            sort: Some(Sort { field, direction }),
            ..Default::default()
        }
    }

    #[test]
    fn test_market_cap_band_boundaries() {
        assert!(MarketCapBand::Micro.contains(1.99));
        assert!(!MarketCapBand::Micro.contains(2.0));
        assert!(MarketCapBand::Small.contains(2.0));
        assert!(!MarketCapBand::Small.contains(10.0));
        assert!(MarketCapBand::Mid.contains(10.0));
        assert!(MarketCapBand::Mid.contains(200.0));
        assert!(!MarketCapBand::Large.contains(200.0));
        assert!(MarketCapBand::Large.contains(200.01));
    }

    #[test]
    fn test_market_cap_filter_uses_billions() {
        let companies = vec![
            company("A", "Alpha", "Tech", 2e9),
            company("B", "Beta", "Tech", 10e9),
            company("C", "Gamma", "Tech", 200e9),
            company("D", "Delta", "Tech", 1.5e9),
        ];
        let run = |band| {
            let params = QueryParams {
                market_cap: Some(band),
                ..Default::default()
            };
            tickers(&query(&companies, &params))
        };
        assert_eq!(run(MarketCapBand::Micro), vec!["D"]);
        assert_eq!(run(MarketCapBand::Small), vec!["A"]);
        assert_eq!(run(MarketCapBand::Mid), vec!["B", "C"]);
        assert!(run(MarketCapBand::Large).is_empty());
    }

    #[test]
    fn test_missing_market_cap_counts_as_micro() {
        let companies = vec![Company {
            ticker: "X".to_string(),
            ..Default::default()
        }];
        let params = QueryParams {
            market_cap: Some(MarketCapBand::Micro),
            ..Default::default()
        };
        assert_eq!(query(&companies, &params).total_matched, 1);
    }

    #[test]
    fn test_search_matches_name_or_ticker_case_insensitive() {
        let companies = vec![
            company("AAPL", "Apple Inc", "Tech", 3e12),
            company("MSFT", "Microsoft", "Tech", 3e12),
            company("XOM", "Exxon Mobil", "Energy", 4e11),
        ];
        let mut params = QueryParams::default();
        params.set_search_term("apple");
        assert_eq!(tickers(&query(&companies, &params)), vec!["AAPL"]);
        params.set_search_term("xo");
        assert_eq!(tickers(&query(&companies, &params)), vec!["XOM"]);
        params.set_search_term("");
        assert_eq!(query(&companies, &params).total_matched, 3);
    }

    #[test]
    fn test_sector_filter_and_sentinel() {
        let companies = vec![
            company("A", "Alpha", "Tech", 1e9),
            company("B", "Beta", "Energy", 1e9),
        ];
        let mut params = QueryParams::default();
        params.set_sector(Some("Energy".to_string()));
        assert_eq!(tickers(&query(&companies, &params)), vec!["B"]);
        params.set_sector(Some(ALL_SECTORS.to_string()));
        assert_eq!(query(&companies, &params).total_matched, 2);
        params.set_sector(Some("energy".to_string()));
        assert_eq!(query(&companies, &params).total_matched, 0);
    }

    #[test]
    fn test_filtered_items_satisfy_every_predicate() {
        let companies: Vec<Company> = (0..60)
            .map(|i| {
                let sector = ["Tech", "Energy", "Health"][i % 3];
                company(&format!("T{i}"), &format!("Name {i}"), sector, (i as f64) * 5e9)
            })
            .collect();
        let params = QueryParams {
            search_term: "name 1".to_string(),
            sector: Some("Energy".to_string()),
            market_cap: Some(MarketCapBand::Mid),
            ..Default::default()
        };
        let result = query(&companies, &params);
        assert!(result.total_matched > 0);
        assert!(result.page_items.len() <= PAGE_SIZE);
        assert!(result.page_items.len() <= result.total_matched);
        for c in &result.page_items {
            assert!(c.name.to_lowercase().contains("name 1"));
            assert_eq!(c.sector, "Energy");
            assert!(MarketCapBand::Mid.contains(c.market_cap_billions()));
        }
    }

    #[test]
    fn test_pagination_boundaries() {
        let companies = numbered(31);
        let mut params = QueryParams::default();

        let result = query(&companies, &params);
        assert_eq!(result.total_matched, 31);
        assert_eq!(result.page_count, 3);
        assert_eq!(result.page_items.len(), 15);

        params.page = 3;
        let result = query(&companies, &params);
        assert_eq!(tickers(&result), vec!["T30"]);

        params.page = 4;
        let result = query(&companies, &params);
        assert!(result.page_items.is_empty());
        assert_eq!(result.total_matched, 31);
    }

    #[test]
    fn test_empty_collection() {
        let result = query(&[], &QueryParams::default());
        assert!(result.page_items.is_empty());
        assert_eq!(result.total_matched, 0);
        assert_eq!(result.page_count, 0);
    }

    #[test]
    fn test_string_sort_is_case_insensitive_and_stable() {
        let companies = vec![
            company("B", "beta", "Tech", 1e9),
            company("A2", "Alpha", "Tech", 1e9),
            company("A1", "alpha", "Tech", 1e9),
        ];
        let result = query(&companies, &sorted_by(SortField::Name, SortDirection::Ascending));
        assert_eq!(tickers(&result), vec!["A2", "A1", "B"]);

        let result = query(&companies, &sorted_by(SortField::Name, SortDirection::Descending));
        assert_eq!(tickers(&result), vec!["B", "A2", "A1"]);
    }

    #[test]
    fn test_numeric_sort_coerces_missing_to_zero() {
        let companies = vec![
            valued("P10", Some(10.0), None, None),
            valued("NONE", None, None, None),
            valued("NEG", Some(-5.0), None, None),
            valued("NAN", Some(f64::NAN), None, None),
        ];
        let result = query(&companies, &sorted_by(SortField::CurrentPrice, SortDirection::Ascending));
        assert_eq!(tickers(&result), vec!["NEG", "NONE", "NAN", "P10"]);
        assert_eq!(result.total_matched, 4);
    }

    #[test]
    fn test_difference_sort_puts_missing_lowest() {
        let companies = vec![
            valued("EVEN", Some(100.0), Some(110.0), Some(90.0)),
            valued("MISSING", Some(100.0), None, Some(90.0)),
            valued("DOWN50", Some(100.0), Some(50.0), Some(50.0)),
            valued("ZEROPRICE", Some(0.0), Some(10.0), Some(10.0)),
        ];
        let result = query(&companies, &sorted_by(SortField::Difference, SortDirection::Ascending));
        assert_eq!(tickers(&result), vec!["MISSING", "ZEROPRICE", "DOWN50", "EVEN"]);

        let result = query(&companies, &sorted_by(SortField::Difference, SortDirection::Descending));
        assert_eq!(tickers(&result), vec!["EVEN", "DOWN50", "MISSING", "ZEROPRICE"]);
    }

    #[test]
    fn test_intrinsic_average_sort() {
        let companies = vec![
            valued("HIGH", None, Some(300.0), Some(100.0)),
            valued("LOW", None, Some(10.0), Some(20.0)),
            valued("NONE", None, None, None),
        ];
        let result = query(
            &companies,
            &sorted_by(SortField::IntrinsicAverage, SortDirection::Ascending),
        );
        assert_eq!(tickers(&result), vec!["NONE", "LOW", "HIGH"]);
    }

    #[test]
    fn test_comparatives_sort_falls_back_to_metrics() {
        let companies: Vec<Company> = serde_json::from_str(
            r#"[
                {"Ticker": "PUB", "Comparatives": 2.0},
                {"Ticker": "DERIVED", "LatestPerformanceMetrics": {
                    "ROIC": {"Value": 1, "Evaluation": "Strong"},
                    "D/E": {"Value": 1, "Evaluation": "Weak"}
                }},
                {"Ticker": "NONE"}
            ]"#,
        )
        .unwrap();
        let result = query(&companies, &sorted_by(SortField::Comparatives, SortDirection::Ascending));
        assert_eq!(tickers(&result), vec!["NONE", "DERIVED", "PUB"]);
    }

    #[test]
    fn test_no_sort_keeps_insertion_order() {
        let companies = vec![
            company("Z", "Zeta", "Tech", 1e9),
            company("A", "Alpha", "Tech", 1e9),
        ];
        let result = query(&companies, &QueryParams::default());
        assert_eq!(tickers(&result), vec!["Z", "A"]);
    }

    #[test]
    fn test_query_is_deterministic() {
        let companies: Vec<Company> = (0..40)
            .map(|i| valued(&format!("T{i}"), Some(10.0), Some((i % 4) as f64), Some(1.0)))
            .collect();
        let params = QueryParams {
            page: 2,
            ..sorted_by(SortField::Difference, SortDirection::Descending)
        };
        let first = tickers(&query(&companies, &params));
        let second = tickers(&query(&companies, &params));
        assert_eq!(first, second);
        assert_eq!(first.len(), 15);
    }

    #[test]
    fn test_toggle_sort() {
        let mut params = QueryParams {
            page: 3,
            ..Default::default()
        };
        params.toggle_sort(SortField::MarketCap);
        assert_eq!(
            params.sort,
            Some(Sort {
                field: SortField::MarketCap,
                direction: SortDirection::Ascending
            })
        );
        assert_eq!(params.page, 1);

        params.toggle_sort(SortField::MarketCap);
        assert_eq!(params.sort.unwrap().direction, SortDirection::Descending);

        params.toggle_sort(SortField::Ticker);
        assert_eq!(params.sort.unwrap().field, SortField::Ticker);
        assert_eq!(params.sort.unwrap().direction, SortDirection::Ascending);
    }

    #[test]
    fn test_clear_filters_keeps_sort() {
        let mut params = sorted_by(SortField::Ticker, SortDirection::Descending);
        params.set_search_term("abc");
        params.set_market_cap(Some(MarketCapBand::Large));
        params.page = 5;
        params.clear_filters();
        assert!(params.search_term.is_empty());
        assert!(params.market_cap.is_none());
        assert_eq!(params.page, 1);
        assert!(params.sort.is_some());
    }

    #[test]
    fn test_query_params_serde() {
        let json = r#"{"search_term": "ap", "market_cap": "Mid", "sort": {"field": "Difference", "direction": "Descending"}}"#;
        let params: QueryParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.page, 1);
        assert_eq!(params.market_cap, Some(MarketCapBand::Mid));
        assert_eq!(params.sort.unwrap().field, SortField::Difference);
    }

    #[test]
    fn test_sector_options() {
        let companies = vec![
            company("A", "Alpha", "Tech", 1e9),
            company("B", "Beta", "", 1e9),
            company("C", "Gamma", "Energy", 1e9),
            company("D", "Delta", "Tech", 1e9),
        ];
        assert_eq!(sector_options(&companies), vec![ALL_SECTORS, "Energy", "Tech"]);
    }

    #[test]
    fn test_page_links() {
        use PageLink::{Ellipsis, Page};

        assert_eq!(page_links(1, 3), vec![Page(1), Page(2), Page(3)]);
        assert_eq!(page_links(1, 7).len(), 7);
        assert_eq!(
            page_links(1, 10),
            vec![Page(1), Page(2), Page(3), Page(4), Page(5), Ellipsis, Page(9), Page(10)]
        );
        assert_eq!(
            page_links(7, 10),
            vec![
                Page(1),
                Page(2),
                Page(3),
                Page(4),
                Page(5),
                Ellipsis,
                Page(7),
                Ellipsis,
                Page(9),
                Page(10)
            ]
        );
        assert!(page_links(1, 0).is_empty());
    }

    #[test]
    fn test_sort_field_parse() {
        assert_eq!("market_cap".parse::<SortField>().unwrap(), SortField::MarketCap);
        assert_eq!("Difference".parse::<SortField>().unwrap(), SortField::Difference);
        assert!("volume".parse::<SortField>().is_err());
        assert_eq!("mid".parse::<MarketCapBand>().unwrap(), MarketCapBand::Mid);
    }
}
