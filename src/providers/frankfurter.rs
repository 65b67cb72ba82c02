use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::core::cache::Cache;
use crate::core::config::FrankfurterProviderConfig;
use crate::core::currency::{BASE_CURRENCY, RateProvider, RateStatus, RateTable};

const USER_AGENT: &str = concat!("cadmargin/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// Latest CAD-based rates from the Frankfurter API, cached for a fixed TTL.
pub struct FrankfurterProvider {
    base_url: String,
    timeout: Duration,
    ttl: Duration,
    cache: Arc<Cache<String, RateTable>>,
}

impl FrankfurterProvider {
    pub fn new(base_url: &str, cache: Arc<Cache<String, RateTable>>) -> Self {
        FrankfurterProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
            ttl: DEFAULT_TTL,
            cache,
        }
    }

    pub fn from_config(
        config: &FrankfurterProviderConfig,
        cache: Arc<Cache<String, RateTable>>,
    ) -> Self {
        Self::new(&config.base_url, cache)
            .with_timeout(Duration::from_secs(config.timeout_secs))
            .with_ttl(Duration::from_secs(config.cache_ttl_secs))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    async fn fetch_rates(&self) -> Result<RateTable> {
        let url = format!("{}/v1/latest?base={}", self.base_url, BASE_CURRENCY);
        debug!("Requesting exchange rates from {}", url);

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(self.timeout)
            .build()?;

        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for URL: {}", e, url))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for base currency: {}",
                response.status(),
                BASE_CURRENCY
            ));
        }

        let text = response.text().await?;
        let data: FrankfurterResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", BASE_CURRENCY, e))?;

        let date = data.date.as_deref().and_then(|d| {
            NaiveDate::parse_from_str(d, "%Y-%m-%d")
                .inspect_err(|e| debug!("Ignoring unparsable rate date {d}: {e}"))
                .ok()
        });

        Ok(RateTable::new(data.rates, date))
    }
}

#[derive(Debug, Deserialize)]
struct FrankfurterResponse {
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    rates: HashMap<String, f64>,
}

#[async_trait]
impl RateProvider for FrankfurterProvider {
    #[instrument(name = "FrankfurterRatesFetch", skip(self), fields(base = BASE_CURRENCY))]
    async fn get_rates(&self) -> RateTable {
        let key = BASE_CURRENCY.to_string();
        if let Some(cached) = self.cache.get(&key).await {
            return cached.with_status(RateStatus::Cached);
        }

        let table = match self.fetch_rates().await {
            Ok(table) => {
                debug!(count = table.len(), "Fetched exchange rates");
                table
            }
            Err(e) => {
                warn!(error = %e, "Exchange rates unavailable, conversions fall back to 1:1");
                RateTable::empty()
            }
        };

        // Failures are cached too; the next attempt waits for the TTL.
        self.cache.put(key, table.clone(), Some(self.ttl)).await;
        table
    }
}
