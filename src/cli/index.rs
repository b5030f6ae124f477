use super::ui;
use crate::core::{IndexAggregator, IndexValue, Interval, PriceSource};
use anyhow::{Context, Result};
use comfy_table::Cell;

pub async fn show_index(
    source: &dyn PriceSource,
    aggregator: &IndexAggregator,
    interval: Interval,
) -> Result<()> {
    let spinner = ui::new_spinner("Fetching commodity prices...");
    let result = source.fetch_prices().await;
    spinner.finish_and_clear();

    let prices = result.context("Failed to fetch commodity prices")?;
    let index = aggregator.compute(&prices, interval)?;
    println!("{}", index_summary(&index));
    Ok(())
}

/// Change between the first and last series points, in percent.
fn series_change(index: &IndexValue) -> Option<f64> {
    let first = index.series.first()?;
    let last = index.series.last()?;
    if index.series.len() < 2 || first.value == 0.0 {
        return None;
    }
    Some((last.value - first.value) / first.value * 100.0)
}

pub fn index_summary(index: &IndexValue) -> String {
    let mut output = format!(
        "UCS Index {}\n{}\n\n",
        ui::style_text(&format!("({})", index.interval), ui::StyleType::Title),
        ui::style_text(
            &format!(
                "{} to {}",
                index.window_start().format("%Y-%m-%d %H:%M"),
                index.as_of.format("%Y-%m-%d %H:%M UTC")
            ),
            ui::StyleType::Subtle
        )
    );

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Commodity"),
        ui::header_cell("Price"),
        ui::header_cell("Currency"),
        ui::header_cell("As of"),
    ]);
    for component in &index.components {
        table.add_row(vec![
            Cell::new(&component.commodity),
            ui::number_cell(component.price),
            Cell::new(&component.currency),
            Cell::new(component.timestamp.format("%Y-%m-%d %H:%M")),
        ]);
    }
    output.push_str(&table.to_string());

    output.push_str(&format!(
        "\n\n{} {}",
        ui::style_text("Index Value:", ui::StyleType::TotalLabel),
        ui::style_text(&format!("{:.2}", index.value), ui::StyleType::TotalValue)
    ));

    match series_change(index) {
        Some(change) => {
            let mut change_table = ui::new_styled_table();
            change_table.set_header(vec![
                ui::header_cell("Points"),
                ui::header_cell("Change"),
            ]);
            change_table.add_row(vec![
                Cell::new(index.series.len()),
                ui::change_cell(change),
            ]);
            output.push_str(&format!("\n\n{change_table}"));
        }
        None => output.push_str(&format!(
            "\n{}",
            ui::style_text("Not enough points for a change figure", ui::StyleType::Subtle)
        )),
    }

    output
}
