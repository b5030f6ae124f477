use super::ui;
use crate::core::{PriceRecord, PriceSource};
use anyhow::{Context, Result};
use comfy_table::Cell;

pub async fn show_prices(source: &dyn PriceSource) -> Result<()> {
    let spinner = ui::new_spinner("Fetching commodity prices...");
    let result = source.fetch_prices().await;
    spinner.finish_and_clear();

    let prices = result.context("Failed to fetch commodity prices")?;
    if prices.is_empty() {
        println!(
            "{}",
            ui::style_text("The record store returned no prices", ui::StyleType::Subtle)
        );
        return Ok(());
    }
    println!("{}", prices_table(&prices));
    Ok(())
}

pub fn prices_table(prices: &[PriceRecord]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Commodity"),
        ui::header_cell("Price"),
        ui::header_cell("Currency"),
        ui::header_cell("Updated"),
    ]);

    for record in prices {
        table.add_row(vec![
            Cell::new(&record.commodity),
            ui::number_cell(record.price),
            Cell::new(&record.currency),
            Cell::new(record.timestamp.format("%Y-%m-%d %H:%M UTC")),
        ]);
    }
    table.to_string()
}
