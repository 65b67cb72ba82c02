//! Prompt-driven session: collects inputs, prints a breakdown, repeats.
//!
//! Each prompt shows its default in brackets; an empty answer accepts it.
//! Invalid answers print the reason and ask again. End of input ends the
//! session at any prompt.

use super::{quote, rates, ui};
use crate::core::config::InputDefaults;
use crate::core::currency::{Currency, RateProvider};
use crate::core::pricing::{
    self, CalculationMode, InputError, PricingInput, PricingTarget, validate_cost,
    validate_margin, validate_sale_price, validate_tax_rate,
};
use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use tracing::debug;

struct Prompter<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    /// Reads one trimmed line, or `None` at end of input.
    fn read_answer(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.writer, "{prompt}").context("Failed to write prompt")?;
        self.writer.flush().context("Failed to flush prompt")?;

        let mut line = String::new();
        let read = self
            .reader
            .read_line(&mut line)
            .context("Failed to read input")?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Prompts until `parse` accepts the answer. An empty answer reaches
    /// `parse` as `None`.
    fn ask_with<T>(
        &mut self,
        label: &str,
        shown_default: &str,
        parse: impl Fn(Option<&str>) -> std::result::Result<T, String>,
    ) -> Result<Option<T>> {
        let prompt = format!(
            "{} [{}]: ",
            label,
            ui::style_text(shown_default, ui::StyleType::Subtle)
        );
        loop {
            let Some(answer) = self.read_answer(&prompt)? else {
                return Ok(None);
            };
            let answer = (!answer.is_empty()).then_some(answer.as_str());
            match parse(answer) {
                Ok(value) => return Ok(Some(value)),
                Err(reason) => {
                    writeln!(
                        self.writer,
                        "{}",
                        ui::style_text(&reason, ui::StyleType::Warning)
                    )?;
                }
            }
        }
    }

    fn ask<T>(
        &mut self,
        label: &str,
        default: &str,
        parse: impl Fn(&str) -> std::result::Result<T, String>,
    ) -> Result<Option<T>> {
        self.ask_with(label, default, |answer| parse(answer.unwrap_or(default)))
    }

    /// An empty answer yields `default` unchanged; the bracketed text is
    /// only its rendering.
    fn ask_number(
        &mut self,
        label: &str,
        default: f64,
        shown_default: &str,
        validate: fn(f64) -> std::result::Result<f64, InputError>,
    ) -> Result<Option<f64>> {
        self.ask_with(label, shown_default, |answer| {
            let value = match answer {
                Some(answer) => parse_number(answer)?,
                None => default,
            };
            validate(value).map_err(|e| e.to_string())
        })
    }

    /// Collects one complete input, or `None` if the input ended midway.
    fn collect(&mut self, defaults: &InputDefaults) -> Result<Option<PricingInput>> {
        let Some(mode) = self.ask(
            "Calculation goal: [1] Find Selling Price, [2] Find Margin %",
            "1",
            |answer| answer.parse::<CalculationMode>().map_err(|e| e.to_string()),
        )?
        else {
            return Ok(None);
        };

        let Some(cost) = self.ask_number(
            "Cost (CAD, Excl. Tax)",
            defaults.cost,
            &defaults.cost.to_string(),
            validate_cost,
        )?
        else {
            return Ok(None);
        };

        let target = match mode {
            CalculationMode::FindSellingPrice => self
                .ask_number(
                    "Target Margin (%)",
                    defaults.margin,
                    &defaults.margin.to_string(),
                    validate_margin,
                )?
                .map(PricingTarget::Margin),
            CalculationMode::FindMarginPercent => self
                .ask_number(
                    "Sale Price (CAD, Excl. Tax)",
                    defaults.sale_price,
                    &defaults.sale_price.to_string(),
                    validate_sale_price,
                )?
                .map(PricingTarget::SalePrice),
        };
        let Some(target) = target else {
            return Ok(None);
        };

        let Some(tax_rate) = self.ask_number(
            "Tax / HST (%)",
            defaults.tax_rate,
            &ui::format_tax_rate(defaults.tax_rate),
            validate_tax_rate,
        )?
        else {
            return Ok(None);
        };

        let Some(currency) = self.ask(
            "Convert Result To (USD, EUR, GBP, JPY, AUD, MXN)",
            defaults.currency.code(),
            |answer| answer.parse::<Currency>().map_err(|e| e.to_string()),
        )?
        else {
            return Ok(None);
        };

        Ok(Some(PricingInput::new(cost, tax_rate, currency, target)?))
    }

    fn wants_another(&mut self) -> Result<bool> {
        let answer = self.ask("Another calculation? (y/n)", "y", |answer| {
            match answer.to_lowercase().as_str() {
                "y" | "yes" => Ok(true),
                "n" | "no" | "q" | "quit" => Ok(false),
                _ => Err("Please answer y or n".to_string()),
            }
        })?;
        Ok(answer.unwrap_or(false))
    }
}

/// Parses a number, tolerating a leading `$`, a trailing `%` and thousands
/// separators.
fn parse_number(answer: &str) -> std::result::Result<f64, String> {
    let cleaned: String = answer
        .trim()
        .trim_start_matches('$')
        .trim_end_matches('%')
        .chars()
        .filter(|c| *c != ',')
        .collect();
    cleaned
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("Please enter a number, got {answer:?}"))
}

/// Runs a session against arbitrary input and output streams.
pub async fn session<R: BufRead, W: Write>(
    reader: R,
    writer: W,
    provider: &(dyn RateProvider + Send + Sync),
    defaults: &InputDefaults,
) -> Result<()> {
    let mut prompter = Prompter { reader, writer };
    writeln!(
        prompter.writer,
        "{}\n{}\n",
        ui::style_text("CAD Margin Pro", ui::StyleType::Title),
        ui::style_text(
            "Margin, markup, tax and currency breakdown",
            ui::StyleType::Subtle
        )
    )?;

    let mut calculations = 0usize;
    loop {
        let Some(input) = prompter.collect(defaults)? else {
            break;
        };

        let rates = rates::load_rates(provider).await;
        let result = pricing::compute(&input, &rates);
        calculations += 1;
        debug!(?input, ?result, calculations, "Calculated breakdown");

        writeln!(
            prompter.writer,
            "\n{}\n",
            quote::render_breakdown(&input, &result, &rates)
        )?;

        if !prompter.wants_another()? {
            break;
        }
        writeln!(prompter.writer)?;
    }

    debug!(calculations, "Interactive session finished");
    Ok(())
}

pub async fn run(
    provider: &(dyn RateProvider + Send + Sync),
    defaults: &InputDefaults,
) -> Result<()> {
    let reader = std::io::BufReader::new(std::io::stdin());
    session(reader, std::io::stdout(), provider, defaults).await
}
