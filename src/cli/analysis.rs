use super::ui;
use crate::core::detail::{LatestValuation, MetricsGrid};
use crate::core::series::{self, AlignedPoint, AlignedSeries, PriceChange};
use crate::core::{Alignment, CompanyDetail, DataProvider, LookbackPeriod};
use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use comfy_table::{Cell, Table};
use std::collections::BTreeMap;
use tracing::{debug, error};

pub async fn run(
    provider: &dyn DataProvider,
    ticker: &str,
    period: LookbackPeriod,
    today: NaiveDate,
) -> Result<()> {
    let pb = ui::new_spinner(&format!("Loading {ticker}"));
    let result = provider.fetch_detail(ticker).await;
    pb.finish_and_clear();

    let detail = match result {
        Ok(detail) => detail,
        Err(e) => {
            error!(error = %e, ticker, "Failed to load company detail");
            println!(
                "{}",
                ui::style_text(&format!("No data available for {ticker}"), ui::StyleType::Error)
            );
            return Ok(());
        }
    };
    debug!(
        prices = detail.historical_prices.len(),
        years = detail.years.len(),
        "Loaded company detail"
    );

    print_header(&detail, ticker);
    println!("{}", info_table(&detail.latest_valuation()));

    ui::print_separator();
    let alignment = detail.align(period, today);
    match &alignment {
        Alignment::NoData => println!(
            "{}",
            ui::style_text(
                &format!("No price data for the {period} period"),
                ui::StyleType::Subtle
            )
        ),
        Alignment::Aligned(series) => print_series(series),
    }

    println!("\n{}", ui::style_text("Stock Price Change", ui::StyleType::Title));
    println!("{}", changes_table(&price_changes(&alignment, &detail, today)));

    ui::print_separator();
    println!("\n{}", ui::style_text("Valuation Metrics", ui::StyleType::Title));
    let grid = detail.metrics_grid();
    if grid.rows.is_empty() {
        println!("{}", ui::style_text("No metrics available.", ui::StyleType::Subtle));
    } else {
        println!("{}", metrics_table(&grid));
    }
    Ok(())
}

fn print_header(detail: &CompanyDetail, ticker: &str) {
    let name = if detail.name.is_empty() {
        ticker.to_uppercase()
    } else {
        ui::title_case(&detail.name)
    };
    println!(
        "\n{} ({})",
        ui::style_text(&name, ui::StyleType::Title),
        ticker.to_uppercase()
    );
    if !detail.sector.is_empty() {
        println!("{} {}", ui::style_text("Sector:", ui::StyleType::Label), detail.sector);
    }
    if let Some(cap) = detail.market_cap() {
        println!(
            "{} {}",
            ui::style_text("Market Cap:", ui::StyleType::Label),
            ui::format_market_cap(cap)
        );
    }
    if let Some(score) = detail.comparative_score() {
        println!(
            "{} {}",
            ui::style_text("Comparatives:", ui::StyleType::Label),
            ui::format_comparatives(Some(score))
        );
    }
    if !detail.description.is_empty() {
        println!("{}", ui::style_text(&detail.description, ui::StyleType::Subtle));
    }
}

fn info_table(latest: &LatestValuation) -> Table {
    let mut table = ui::new_styled_table();
    let range_header = match latest.year {
        Some(year) => format!("Intrinsic Value ({year})"),
        None => "Intrinsic Value".to_string(),
    };
    table.set_header(vec![
        ui::header_cell("Difference"),
        ui::header_cell("Stock Price"),
        ui::header_cell(&range_header),
    ]);
    table.add_row(vec![
        ui::difference_cell(latest.spread.map(|s| s.difference)),
        ui::format_optional_cell(latest.price, ui::format_price),
        ui::format_optional_cell(latest.intrinsic_range, |(low, high)| {
            format!("{} - {}", ui::format_price(low), ui::format_price(high))
        }),
    ]);
    table
}

fn print_series(series: &AlignedSeries) {
    let label = |text: &str| ui::style_text(text, ui::StyleType::Label);
    println!("\n{}", ui::style_text("Stock Price vs Intrinsic Value", ui::StyleType::Title));
    match series.period_start {
        Some(start) => println!("{} {} (from {start})", label("Period:"), series.period),
        None => println!("{} {}", label("Period:"), series.period),
    }
    println!(
        "{} {} - {}",
        label("Chart range:"),
        ui::format_price(series.y_axis_min),
        ui::format_price(series.y_axis_max)
    );
    println!(
        "{} {}",
        label("Period return:"),
        series
            .period_return_percent
            .map_or_else(|| ui::NO_DATA.to_string(), |r| format!("{r:.2}%"))
    );
    println!("{}", points_table(&series.points));
}

/// Trailing windows do not depend on the lookback period, so an empty
/// period still reports them from the full price history.
fn price_changes(
    alignment: &Alignment,
    detail: &CompanyDetail,
    today: NaiveDate,
) -> BTreeMap<LookbackPeriod, Option<PriceChange>> {
    match alignment {
        Alignment::Aligned(series) => series.trailing_changes.clone(),
        Alignment::NoData => series::trailing_changes(&detail.historical_prices, today),
    }
}

/// First aligned point of each calendar month.
fn monthly_sample(points: &[AlignedPoint]) -> Vec<&AlignedPoint> {
    let mut seen = None;
    points
        .iter()
        .filter(|p| {
            let month = (p.date.year(), p.date.month());
            if seen == Some(month) {
                false
            } else {
                seen = Some(month);
                true
            }
        })
        .collect()
}

fn points_table(points: &[AlignedPoint]) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Date"),
        ui::header_cell("Price"),
        ui::header_cell("Low"),
        ui::header_cell("High"),
        ui::header_cell("vs Band"),
    ]);
    for point in monthly_sample(points) {
        table.add_row(vec![
            Cell::new(point.date.to_string()),
            ui::number_cell(ui::format_price(point.price)),
            ui::format_optional_cell(point.low, ui::format_price),
            ui::format_optional_cell(point.high, ui::format_price),
            point
                .band_difference_percent()
                .map_or_else(ui::na_cell, ui::change_cell),
        ]);
    }
    table
}

fn changes_table(changes: &BTreeMap<LookbackPeriod, Option<PriceChange>>) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Period"),
        ui::header_cell("Price Change"),
        ui::header_cell("% Change"),
    ]);
    for (window, change) in changes {
        let (price_cell, percent_cell) = match change {
            Some(change) => (
                ui::number_cell(format!("{:+.2}", change.price_diff)),
                ui::change_cell(change.percent_diff),
            ),
            None => (ui::na_cell(), ui::na_cell()),
        };
        table.add_row(vec![Cell::new(window.to_string()), price_cell, percent_cell]);
    }
    table
}

fn metrics_table(grid: &MetricsGrid) -> Table {
    let mut table = ui::new_styled_table();
    let mut header = vec![ui::header_cell("Metric")];
    header.extend(grid.years.iter().map(|y| ui::header_cell(&y.to_string())));
    table.set_header(header);

    for row in &grid.rows {
        let mut cells = vec![Cell::new(&row.name)];
        cells.extend(
            row.cells
                .iter()
                .map(|c| ui::evaluation_cell(&c.display, c.evaluation)),
        );
        table.add_row(cells);
    }
    table
}
