use crate::core::Evaluation;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Shown wherever a value cannot be computed.
pub const NO_DATA: &str = "—";

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    Label,
    Error,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::Label => style(text).bold(),
        StyleType::Error => style(text).red(),
        StyleType::Subtle => style(text).dim(),
    };
    styled.to_string()
}

/// Creates a new `comfy_table::Table` with standard styling.
pub fn new_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Creates a styled header cell for a table.
pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

pub fn number_cell(text: String) -> Cell {
    Cell::new(text).set_alignment(CellAlignment::Right)
}

/// Formats an `Option<T>` into a `Cell`. `None` is displayed as [`NO_DATA`].
pub fn format_optional_cell<T>(value: Option<T>, format_fn: impl Fn(T) -> String) -> Cell {
    value.map_or_else(na_cell, |v| number_cell(format_fn(v)))
}

pub fn na_cell() -> Cell {
    Cell::new(NO_DATA)
        .fg(Color::DarkGrey)
        .set_alignment(CellAlignment::Right)
}

fn sign_color(value: f64) -> Color {
    if value >= 0.0 {
        Color::Green
    } else {
        Color::Red
    }
}

/// Creates a cell for displaying percentage change with color coding.
pub fn change_cell(change: f64) -> Cell {
    number_cell(format!("{change:.2}%")).fg(sign_color(change))
}

/// Difference between intrinsic value and price; positive is undervalued.
pub fn difference_cell(difference: Option<f64>) -> Cell {
    match difference {
        Some(d) => number_cell(format_difference(Some(d))).fg(sign_color(d)),
        None => na_cell(),
    }
}

pub fn evaluation_cell(text: &str, evaluation: Option<Evaluation>) -> Cell {
    let cell = number_cell(text.to_string());
    match evaluation {
        Some(Evaluation::Strong) => cell.fg(Color::Green),
        Some(Evaluation::Weak) => cell.fg(Color::Red),
        _ => cell,
    }
}

pub fn format_price(price: f64) -> String {
    format!("${price:.2}")
}

/// `$X.XXB` from one billion up, `$X.XXM` below.
pub fn format_market_cap(market_cap: f64) -> String {
    if market_cap >= 1e9 {
        format!("${:.2}B", market_cap / 1e9)
    } else {
        format!("${:.2}M", market_cap / 1e6)
    }
}

pub fn format_difference(difference: Option<f64>) -> String {
    difference.map_or_else(|| NO_DATA.to_string(), |d| format!("{:.2}%", d * 100.0))
}

pub fn format_comparatives(score: Option<f64>) -> String {
    match score {
        Some(s) if s.is_infinite() => "∞".to_string(),
        Some(s) if s.is_finite() => format!("{}%", (s * 100.0).floor()),
        _ => NO_DATA.to_string(),
    }
}

/// Capitalises the first letter of every word and lowercases the rest.
pub fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Creates a spinner shown while data is loading.
pub fn new_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} [{elapsed_precise}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Prints a separator line matching the terminal width.
pub fn print_separator() {
    let term_width = console::Term::stdout()
        .size_checked()
        .map(|(_, w)| w as usize)
        .unwrap_or(80);
    println!("\n{}", "─".repeat(term_width));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("APPLE INC"), "Apple Inc");
        assert_eq!(title_case("  exxon   mobil corp "), "Exxon Mobil Corp");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_format_market_cap() {
        assert_eq!(format_market_cap(3.1e12), "$3100.00B");
        assert_eq!(format_market_cap(1e9), "$1.00B");
        assert_eq!(format_market_cap(950e6), "$950.00M");
    }

    #[test]
    fn test_format_difference() {
        assert_eq!(format_difference(Some(0.0)), "0.00%");
        assert_eq!(format_difference(Some(-0.5)), "-50.00%");
        assert_eq!(format_difference(Some(0.1234)), "12.34%");
        assert_eq!(format_difference(None), NO_DATA);
    }

    #[test]
    fn test_difference_cell_content() {
        assert_eq!(difference_cell(Some(0.1234)).content(), "12.34%");
        assert_eq!(difference_cell(Some(-0.5)).content(), "-50.00%");
        assert_eq!(difference_cell(None).content(), NO_DATA);
    }

    #[test]
    fn test_format_comparatives() {
        assert_eq!(format_comparatives(Some(1.259)), "125%");
        assert_eq!(format_comparatives(Some(0.0)), "0%");
        assert_eq!(format_comparatives(Some(f64::INFINITY)), "∞");
        assert_eq!(format_comparatives(None), NO_DATA);
    }
}
