//! Pricing calculations: selling price, margin, markup, tax and conversion.
//!
//! Margin is profit as a share of the selling price, markup is profit as a
//! share of cost. Costs and sale prices are CAD and exclude tax.

use crate::core::currency::{Currency, RateTable};
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

pub const MIN_AMOUNT: f64 = 0.01;
pub const MIN_MARGIN_PERCENT: f64 = 1.0;
pub const MAX_MARGIN_PERCENT: f64 = 99.0;

/// Rejection reasons for values collected from the user.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("{field} must be a number")]
    NotANumber { field: &'static str },

    #[error("Cost must be at least 0.01 CAD, got {0}")]
    CostTooLow(f64),

    #[error("Margin must be between 1.0% and 99.0%, got {0}%")]
    MarginOutOfRange(f64),

    #[error("Sale price must be at least 0.01 CAD, got {0}")]
    SalePriceTooLow(f64),
}

/// The two calculation goals a user can choose between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalculationMode {
    FindSellingPrice,
    FindMarginPercent,
}

impl Display for CalculationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                CalculationMode::FindSellingPrice => "Find Selling Price",
                CalculationMode::FindMarginPercent => "Find Margin %",
            }
        )
    }
}

impl FromStr for CalculationMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1" | "sell" | "selling-price" => Ok(CalculationMode::FindSellingPrice),
            "2" | "margin" => Ok(CalculationMode::FindMarginPercent),
            _ => Err(anyhow::anyhow!("Invalid calculation mode: {}", s.trim())),
        }
    }
}

/// What the selling price is derived from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PricingTarget {
    /// Target margin in percent; the selling price is solved for.
    Margin(f64),
    /// Known selling price in CAD; the margin is solved for.
    SalePrice(f64),
}

impl PricingTarget {
    pub fn mode(&self) -> CalculationMode {
        match self {
            PricingTarget::Margin(_) => CalculationMode::FindSellingPrice,
            PricingTarget::SalePrice(_) => CalculationMode::FindMarginPercent,
        }
    }
}

/// Validated inputs for a single calculation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingInput {
    cost: f64,
    tax_rate_percent: f64,
    currency: Currency,
    target: PricingTarget,
}

impl PricingInput {
    pub fn new(
        cost: f64,
        tax_rate_percent: f64,
        currency: Currency,
        target: PricingTarget,
    ) -> Result<Self, InputError> {
        let cost = validate_cost(cost)?;
        let tax_rate_percent = validate_tax_rate(tax_rate_percent)?;
        let target = match target {
            PricingTarget::Margin(margin) => PricingTarget::Margin(validate_margin(margin)?),
            PricingTarget::SalePrice(price) => {
                PricingTarget::SalePrice(validate_sale_price(price)?)
            }
        };

        Ok(Self {
            cost,
            tax_rate_percent,
            currency,
            target,
        })
    }

    pub fn cost(&self) -> f64 {
        self.cost
    }

    pub fn tax_rate_percent(&self) -> f64 {
        self.tax_rate_percent
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn target(&self) -> PricingTarget {
        self.target
    }
}

pub fn validate_cost(cost: f64) -> Result<f64, InputError> {
    if !cost.is_finite() {
        return Err(InputError::NotANumber { field: "Cost" });
    }
    if cost < MIN_AMOUNT {
        return Err(InputError::CostTooLow(cost));
    }
    Ok(cost)
}

pub fn validate_margin(margin: f64) -> Result<f64, InputError> {
    if !margin.is_finite() {
        return Err(InputError::NotANumber { field: "Margin" });
    }
    if !(MIN_MARGIN_PERCENT..=MAX_MARGIN_PERCENT).contains(&margin) {
        return Err(InputError::MarginOutOfRange(margin));
    }
    Ok(margin)
}

pub fn validate_sale_price(price: f64) -> Result<f64, InputError> {
    if !price.is_finite() {
        return Err(InputError::NotANumber { field: "Sale price" });
    }
    if price < MIN_AMOUNT {
        return Err(InputError::SalePriceTooLow(price));
    }
    Ok(price)
}

pub fn validate_tax_rate(tax_rate: f64) -> Result<f64, InputError> {
    if !tax_rate.is_finite() {
        return Err(InputError::NotANumber { field: "Tax rate" });
    }
    Ok(tax_rate)
}

/// Full breakdown derived from a [`PricingInput`] and the rate table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingResult {
    pub selling_price: f64,
    pub margin_percent: f64,
    pub profit: f64,
    pub markup_percent: f64,
    pub price_with_tax: f64,
    pub tax_amount: f64,
    pub converted_price: f64,
    pub effective_rate: f64,
    /// Set when the table had no rate for the target currency.
    pub rate_is_fallback: bool,
}

/// Computes the pricing breakdown. Pure; `input` is already validated.
pub fn compute(input: &PricingInput, rates: &RateTable) -> PricingResult {
    let cost = input.cost;

    let (selling_price, margin_percent) = match input.target {
        PricingTarget::Margin(margin) => (cost / (1.0 - margin / 100.0), margin),
        PricingTarget::SalePrice(price) => (price, ((price - cost) / price) * 100.0),
    };

    let profit = selling_price - cost;
    let markup_percent = (profit / cost) * 100.0;
    let price_with_tax = selling_price * (1.0 + input.tax_rate_percent / 100.0);
    let tax_amount = price_with_tax - selling_price;

    let found_rate = rates.get(input.currency.code());
    let effective_rate = rates.rate_for(input.currency);

    PricingResult {
        selling_price,
        margin_percent,
        profit,
        markup_percent,
        price_with_tax,
        tax_amount,
        converted_price: selling_price * effective_rate,
        effective_rate,
        rate_is_fallback: found_rate.is_none(),
    }
}
