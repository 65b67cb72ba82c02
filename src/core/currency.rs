//! Currency conversion abstractions

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

/// Currency that costs and sale prices are always denominated in.
pub const BASE_CURRENCY: &str = "CAD";

/// Rate used when the table has no entry for the requested currency.
pub const FALLBACK_RATE: f64 = 1.0;

/// Currencies a selling price can be converted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
    Gbp,
    Jpy,
    Aud,
    Mxn,
}

impl Currency {
    pub const ALL: [Currency; 6] = [
        Currency::Usd,
        Currency::Eur,
        Currency::Gbp,
        Currency::Jpy,
        Currency::Aud,
        Currency::Mxn,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Jpy => "JPY",
            Currency::Aud => "AUD",
            Currency::Mxn => "MXN",
        }
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Currency {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_uppercase();
        Currency::ALL
            .into_iter()
            .find(|c| c.code() == code)
            .ok_or_else(|| {
                anyhow!(
                    "Unsupported currency: {} (expected one of USD, EUR, GBP, JPY, AUD, MXN)",
                    s.trim()
                )
            })
    }
}

/// Where the rates in a [`RateTable`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateStatus {
    /// Fetched from the upstream service for this request.
    Live,
    /// Served from the in-process cache.
    Cached,
    /// Nothing could be fetched; every lookup falls back to 1:1.
    Unavailable,
}

/// Exchange rates quoted as units of a currency per 1 CAD.
#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    rates: HashMap<String, f64>,
    pub date: Option<NaiveDate>,
    pub status: RateStatus,
}

impl RateTable {
    /// Builds a table from raw upstream rates. Non-finite or non-positive
    /// entries are dropped.
    pub fn new(rates: HashMap<String, f64>, date: Option<NaiveDate>) -> Self {
        let rates: HashMap<String, f64> = rates
            .into_iter()
            .filter(|(code, rate)| {
                let valid = rate.is_finite() && *rate > 0.0;
                if !valid {
                    tracing::debug!(%code, rate, "Dropping invalid exchange rate");
                }
                valid
            })
            .collect();
        let status = if rates.is_empty() {
            RateStatus::Unavailable
        } else {
            RateStatus::Live
        };
        Self {
            rates,
            date,
            status,
        }
    }

    pub fn empty() -> Self {
        Self {
            rates: HashMap::new(),
            date: None,
            status: RateStatus::Unavailable,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn get(&self, code: &str) -> Option<f64> {
        self.rates.get(code).copied()
    }

    /// Rate for `currency`, or [`FALLBACK_RATE`] when the table has none.
    pub fn rate_for(&self, currency: Currency) -> f64 {
        self.get(currency.code()).unwrap_or(FALLBACK_RATE)
    }

    pub fn with_status(mut self, status: RateStatus) -> Self {
        self.status = if self.is_empty() {
            RateStatus::Unavailable
        } else {
            status
        };
        self
    }
}

impl Default for RateTable {
    fn default() -> Self {
        Self::empty()
    }
}

/// Source of CAD-based exchange rates.
///
/// Implementations never fail: any fetch or parse problem yields an empty
/// [`RateTable`] so that a calculation can always be displayed.
#[async_trait]
pub trait RateProvider: Send + Sync {
    async fn get_rates(&self) -> RateTable;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_from_str() {
        assert_eq!("USD".parse::<Currency>().unwrap(), Currency::Usd);
        assert_eq!(" gbp ".parse::<Currency>().unwrap(), Currency::Gbp);
        assert_eq!("mxn".parse::<Currency>().unwrap(), Currency::Mxn);

        let err = "CHF".parse::<Currency>().unwrap_err();
        assert!(err.to_string().contains("Unsupported currency: CHF"));
    }

    #[test]
    fn test_currency_display_matches_code() {
        for currency in Currency::ALL {
            assert_eq!(currency.to_string(), currency.code());
        }
    }

    #[test]
    fn test_rate_for_falls_back_to_one() {
        let table = RateTable::new(HashMap::from([("USD".to_string(), 0.73)]), None);
        assert_eq!(table.rate_for(Currency::Usd), 0.73);
        assert_eq!(table.rate_for(Currency::Eur), FALLBACK_RATE);

        let empty = RateTable::empty();
        assert_eq!(empty.rate_for(Currency::Jpy), FALLBACK_RATE);
        assert_eq!(empty.status, RateStatus::Unavailable);
    }

    #[test]
    fn test_invalid_rates_are_dropped() {
        let table = RateTable::new(
            HashMap::from([
                ("USD".to_string(), 0.73),
                ("EUR".to_string(), 0.0),
                ("GBP".to_string(), -1.0),
                ("JPY".to_string(), f64::NAN),
            ]),
            None,
        );
        assert_eq!(table.len(), 1);
        assert_eq!(table.rate_for(Currency::Gbp), FALLBACK_RATE);
        assert_eq!(table.status, RateStatus::Live);
    }

    #[test]
    fn test_with_status_keeps_empty_table_unavailable() {
        let table = RateTable::empty().with_status(RateStatus::Cached);
        assert_eq!(table.status, RateStatus::Unavailable);

        let table = RateTable::new(HashMap::from([("USD".to_string(), 0.73)]), None)
            .with_status(RateStatus::Cached);
        assert_eq!(table.status, RateStatus::Cached);
    }
}
