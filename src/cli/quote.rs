use super::{rates, ui};
use crate::core::config::InputDefaults;
use crate::core::currency::{BASE_CURRENCY, Currency, RateProvider, RateTable};
use crate::core::pricing::{self, InputError, PricingInput, PricingResult, PricingTarget};
use anyhow::{Context, Result};
use tracing::debug;

/// Values supplied on the command line; anything missing comes from the
/// configured defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuoteArgs {
    pub cost: Option<f64>,
    pub margin: Option<f64>,
    pub price: Option<f64>,
    pub tax_rate: Option<f64>,
    pub currency: Option<Currency>,
}

impl QuoteArgs {
    /// Resolves the arguments into a validated input. A sale price selects
    /// the margin calculation, otherwise the selling price is solved for.
    pub fn into_input(self, defaults: &InputDefaults) -> Result<PricingInput, InputError> {
        let target = match (self.price, self.margin) {
            (Some(price), _) => PricingTarget::SalePrice(price),
            (None, margin) => PricingTarget::Margin(margin.unwrap_or(defaults.margin)),
        };

        PricingInput::new(
            self.cost.unwrap_or(defaults.cost),
            self.tax_rate.unwrap_or(defaults.tax_rate),
            self.currency.unwrap_or(defaults.currency),
            target,
        )
    }
}

/// Tax detail lines, e.g. `Price with 13.0% Tax: $161.43`.
pub fn tax_lines(input: &PricingInput, result: &PricingResult) -> [String; 2] {
    [
        format!(
            "Price with {}% Tax: {}",
            ui::format_tax_rate(input.tax_rate_percent()),
            ui::format_cad(result.price_with_tax)
        ),
        format!("Tax Amount: {}", ui::format_cad(result.tax_amount)),
    ]
}

/// Conversion heading and converted price.
pub fn fx_lines(input: &PricingInput, result: &PricingResult) -> [String; 2] {
    let code = input.currency().code();
    [
        format!(
            "FX Conversion (1 {BASE_CURRENCY} = {} {code})",
            ui::format_rate(result.effective_rate)
        ),
        format!(
            "Price in {code}: {}",
            ui::format_foreign(result.converted_price, code)
        ),
    ]
}

fn conversion_note(
    input: &PricingInput,
    result: &PricingResult,
    rates: &RateTable,
) -> Option<String> {
    if result.rate_is_fallback && !rates.is_empty() {
        return Some(format!(
            "No {} rate available; converting 1:1",
            input.currency()
        ));
    }
    rates::status_note(rates)
}

/// Renders the full breakdown: headline metrics, tax details and currency
/// conversion.
pub fn render_breakdown(
    input: &PricingInput,
    result: &PricingResult,
    rates: &RateTable,
) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell(&format!("Selling Price ({BASE_CURRENCY})")),
        ui::header_cell("Margin"),
        ui::header_cell("Profit"),
    ]);
    table.add_row(vec![
        ui::metric_cell(ui::format_cad(result.selling_price)),
        ui::metric_cell(ui::format_percent(result.margin_percent)),
        ui::signed_cell(result.profit, ui::format_cad(result.profit)),
    ]);
    table.add_row(vec![
        comfy_table::Cell::new(""),
        comfy_table::Cell::new(""),
        ui::signed_cell(
            result.markup_percent,
            format!("{} Markup", ui::format_percent(result.markup_percent)),
        ),
    ]);

    let mut output = format!(
        "{}\n\n",
        ui::style_text(&input.target().mode().to_string(), ui::StyleType::Title)
    );
    output.push_str(&table.to_string());

    let [with_tax, tax_amount] = tax_lines(input, result);
    output.push_str(&format!(
        "\n\n{}\n  {}\n  {}",
        ui::style_text("Tax Details", ui::StyleType::Label),
        with_tax,
        tax_amount
    ));

    let [heading, converted] = fx_lines(input, result);
    output.push_str(&format!(
        "\n\n{}\n  {}",
        ui::style_text(&heading, ui::StyleType::Label),
        ui::style_text(&converted, ui::StyleType::Value)
    ));

    if let Some(note) = conversion_note(input, result, rates) {
        let style_type = if result.rate_is_fallback {
            ui::StyleType::Warning
        } else {
            ui::StyleType::Subtle
        };
        output.push_str(&format!("\n  {}", ui::style_text(&note, style_type)));
    }

    output
}

pub async fn run(
    provider: &(dyn RateProvider + Send + Sync),
    args: QuoteArgs,
    defaults: &InputDefaults,
) -> Result<()> {
    let input = args
        .into_input(defaults)
        .context("Invalid pricing input")?;
    debug!(?input, "Computing quote");

    let rates = rates::load_rates(provider).await;
    let result = pricing::compute(&input, &rates);
    println!("{}", render_breakdown(&input, &result, &rates));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::currency::RateStatus;
    use chrono::NaiveDate;
    use std::collections::HashMap;

    fn usd_rates() -> RateTable {
        RateTable::new(
            HashMap::from([("USD".to_string(), 0.73)]),
            NaiveDate::from_ymd_opt(2026, 10, 16),
        )
    }

    #[test]
    fn test_quote_args_use_defaults() {
        let input = QuoteArgs::default()
            .into_input(&InputDefaults::default())
            .unwrap();
        assert_eq!(input.cost(), 100.0);
        assert_eq!(input.tax_rate_percent(), 13.0);
        assert_eq!(input.currency(), Currency::Usd);
        assert_eq!(input.target(), PricingTarget::Margin(30.0));
    }

    #[test]
    fn test_quote_args_price_selects_margin_mode() {
        let args = QuoteArgs {
            cost: Some(80.0),
            price: Some(120.0),
            currency: Some(Currency::Eur),
            ..Default::default()
        };
        let input = args.into_input(&InputDefaults::default()).unwrap();
        assert_eq!(input.target(), PricingTarget::SalePrice(120.0));
        assert_eq!(input.currency(), Currency::Eur);
    }

    #[test]
    fn test_quote_args_reject_invalid_margin() {
        let args = QuoteArgs {
            margin: Some(100.0),
            ..Default::default()
        };
        assert_eq!(
            args.into_input(&InputDefaults::default()),
            Err(InputError::MarginOutOfRange(100.0))
        );
    }

    #[test]
    fn test_breakdown_lines_for_default_quote() {
        let input = QuoteArgs::default()
            .into_input(&InputDefaults::default())
            .unwrap();
        let result = pricing::compute(&input, &usd_rates());

        assert_eq!(
            tax_lines(&input, &result),
            [
                "Price with 13.0% Tax: $161.43".to_string(),
                "Tax Amount: $18.57".to_string()
            ]
        );
        assert_eq!(
            fx_lines(&input, &result),
            [
                "FX Conversion (1 CAD = 0.7300 USD)".to_string(),
                "Price in USD: 104.29 USD".to_string()
            ]
        );
    }

    #[test]
    fn test_render_breakdown_contains_all_sections() {
        let input = QuoteArgs::default()
            .into_input(&InputDefaults::default())
            .unwrap();
        let rates = usd_rates();
        let output = render_breakdown(&input, &pricing::compute(&input, &rates), &rates);

        for expected in [
            "Find Selling Price",
            "Selling Price (CAD)",
            "$142.86",
            "30.0%",
            "$42.86",
            "42.9% Markup",
            "Price with 13.0% Tax: $161.43",
            "Tax Amount: $18.57",
            "Price in USD: 104.29 USD",
            "Rates as of 2026-10-16",
        ] {
            assert!(output.contains(expected), "missing {expected:?} in\n{output}");
        }
    }

    #[test]
    fn test_render_breakdown_notes_fallback_rate() {
        let input = QuoteArgs {
            currency: Some(Currency::Gbp),
            ..Default::default()
        }
        .into_input(&InputDefaults::default())
        .unwrap();

        let rates = usd_rates();
        let output = render_breakdown(&input, &pricing::compute(&input, &rates), &rates);
        assert!(output.contains("FX Conversion (1 CAD = 1.0000 GBP)"));
        assert!(output.contains("No GBP rate available; converting 1:1"));

        let empty = RateTable::empty();
        assert_eq!(empty.status, RateStatus::Unavailable);
        let output = render_breakdown(&input, &pricing::compute(&input, &empty), &empty);
        assert!(output.contains("Price in GBP: 142.86 GBP"));
        assert!(output.contains("Exchange rates unavailable; converting 1:1"));
    }
}
