pub mod cli;
pub mod core;
pub mod providers;

use crate::cli::quote::QuoteArgs;
use crate::core::cache::Cache;
use crate::core::config::AppConfig;
use crate::core::currency::RateTable;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

/// Commands that need configuration and a rate provider.
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    Interactive,
    Quote(QuoteArgs),
    Rates,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("cadmargin starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    // One cache for the whole process, so a session fetches at most once per TTL
    let rate_cache = Arc::new(Cache::<String, RateTable>::new());
    let rate_provider =
        providers::FrankfurterProvider::from_config(&config.providers.frankfurter, rate_cache);

    match command {
        AppCommand::Interactive => cli::interactive::run(&rate_provider, &config.defaults).await,
        AppCommand::Quote(args) => cli::quote::run(&rate_provider, args, &config.defaults).await,
        AppCommand::Rates => cli::rates::run(&rate_provider).await,
    }
}
