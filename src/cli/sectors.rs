use super::list::load_companies;
use super::ui;
use crate::core::DataProvider;
use crate::core::query::sector_options;
use anyhow::Result;

pub async fn run(provider: &dyn DataProvider) -> Result<()> {
    let companies = load_companies(provider).await;
    let options = sector_options(&companies);

    println!("\n{}", ui::style_text("Sectors", ui::StyleType::Title));
    for (i, sector) in options.iter().enumerate() {
        if i == 0 {
            println!("{}", ui::style_text(sector, ui::StyleType::Subtle));
        } else {
            println!("{sector}");
        }
    }
    Ok(())
}
