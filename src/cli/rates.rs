use super::ui;
use crate::core::currency::{BASE_CURRENCY, Currency, RateProvider, RateStatus, RateTable};
use anyhow::Result;
use comfy_table::Cell;

/// Fetches the rate table behind a spinner.
pub async fn load_rates(provider: &(dyn RateProvider + Send + Sync)) -> RateTable {
    let pb = ui::new_spinner("Fetching exchange rates...");
    let rates = provider.get_rates().await;
    pb.finish_and_clear();
    rates
}

/// One-line description of where the rates came from, if worth showing.
pub fn status_note(rates: &RateTable) -> Option<String> {
    match (rates.status, rates.date) {
        (RateStatus::Unavailable, _) => {
            Some("Exchange rates unavailable; converting 1:1".to_string())
        }
        (RateStatus::Live, Some(date)) => Some(format!("Rates as of {date}")),
        (RateStatus::Cached, Some(date)) => Some(format!("Rates as of {date} (cached)")),
        (RateStatus::Live, None) => None,
        (RateStatus::Cached, None) => Some("Cached rates".to_string()),
    }
}

pub fn display_as_table(rates: &RateTable) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Currency"),
        ui::header_cell(&format!("Rate (per 1 {BASE_CURRENCY})")),
    ]);

    for currency in Currency::ALL {
        table.add_row(vec![
            Cell::new(currency.code()),
            ui::format_optional_cell(rates.get(currency.code()), ui::format_rate),
        ]);
    }

    let mut output = format!(
        "{}\n\n",
        ui::style_text("Exchange Rates", ui::StyleType::Title)
    );
    output.push_str(&table.to_string());
    if let Some(note) = status_note(rates) {
        let style_type = if rates.status == RateStatus::Unavailable {
            ui::StyleType::Warning
        } else {
            ui::StyleType::Subtle
        };
        output.push_str(&format!("\n{}", ui::style_text(&note, style_type)));
    }
    output
}

pub async fn run(provider: &(dyn RateProvider + Send + Sync)) -> Result<()> {
    let rates = load_rates(provider).await;
    println!("{}", display_as_table(&rates));
    Ok(())
}
