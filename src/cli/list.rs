use super::ui;
use crate::core::query::{self, PageLink, QueryParams, QueryResult};
use crate::core::{Company, DataProvider};
use anyhow::Result;
use comfy_table::{Cell, Table};
use tracing::error;

/// Loads the company list once. A failed load is logged and treated as an
/// empty collection.
pub(crate) async fn load_companies(provider: &dyn DataProvider) -> Vec<Company> {
    let pb = ui::new_spinner("Loading companies");
    let result = provider.fetch_companies().await;
    pb.finish_and_clear();

    match result {
        Ok(companies) => companies,
        Err(e) => {
            error!(error = %e, "Failed to load company list");
            eprintln!(
                "{}",
                ui::style_text(&format!("Could not load companies: {e}"), ui::StyleType::Error)
            );
            Vec::new()
        }
    }
}

pub async fn run(provider: &dyn DataProvider, params: &QueryParams) -> Result<()> {
    let companies = load_companies(provider).await;
    let result = query::query(&companies, params);

    println!(
        "\n{}",
        ui::style_text(
            &format!("Companies List ({})", result.total_matched),
            ui::StyleType::Title
        )
    );

    if result.page_items.is_empty() {
        println!("{}", ui::style_text("No results found.", ui::StyleType::Subtle));
    } else {
        println!("{}", companies_table(&result));
    }

    if result.page_count > 1 {
        println!("{}", pagination_line(params.page, result.page_count));
    }
    Ok(())
}

fn companies_table(result: &QueryResult) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Company"),
        ui::header_cell("Ticker"),
        ui::header_cell("Sector"),
        ui::header_cell("Market Cap"),
        ui::header_cell("Stock Price"),
        ui::header_cell("Comparatives"),
        ui::header_cell("Difference"),
    ]);

    for company in &result.page_items {
        table.add_row(vec![
            Cell::new(ui::title_case(&company.name)),
            Cell::new(&company.ticker),
            Cell::new(&company.sector),
            ui::format_optional_cell(company.market_cap, ui::format_market_cap),
            ui::format_optional_cell(company.current_price, ui::format_price),
            ui::number_cell(ui::format_comparatives(company.comparatives())),
            ui::difference_cell(company.difference()),
        ]);
    }
    table
}

fn pagination_line(current: usize, page_count: usize) -> String {
    let links: Vec<String> = query::page_links(current, page_count)
        .into_iter()
        .map(|link| match link {
            PageLink::Page(page) if page == current => {
                ui::style_text(&format!("[{page}]"), ui::StyleType::Label)
            }
            PageLink::Page(page) => page.to_string(),
            PageLink::Ellipsis => "…".to_string(),
        })
        .collect();
    format!("Page {current} of {page_count}: {}", links.join(" "))
}
