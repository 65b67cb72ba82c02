use crate::core::currency::Currency;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

pub const DEFAULT_FRANKFURTER_URL: &str = "https://api.frankfurter.dev";

/// Values pre-filled in prompts and used for omitted `quote` arguments.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct InputDefaults {
    pub cost: f64,
    pub margin: f64,
    pub sale_price: f64,
    pub tax_rate: f64,
    pub currency: Currency,
}

impl Default for InputDefaults {
    fn default() -> Self {
        InputDefaults {
            cost: 100.0,
            margin: 30.0,
            sale_price: 142.86,
            tax_rate: 13.0,
            currency: Currency::Usd,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct FrankfurterProviderConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub cache_ttl_secs: u64,
}

impl Default for FrankfurterProviderConfig {
    fn default() -> Self {
        FrankfurterProviderConfig {
            base_url: DEFAULT_FRANKFURTER_URL.to_string(),
            timeout_secs: 10,
            cache_ttl_secs: 60 * 60,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub frankfurter: FrankfurterProviderConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub defaults: InputDefaults,
    #[serde(default)]
    pub providers: ProvidersConfig,
}

impl AppConfig {
    /// Loads the config from the default location, falling back to built-in
    /// defaults when no file exists there.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config file at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("ca", "cadmargin", "cadmargin")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        // An empty document deserializes to unit, not a map.
        if config_str.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
defaults:
  cost: 250.0
  margin: 45.5
  tax_rate: 5.0
  currency: EUR
providers:
  frankfurter:
    base_url: "http://example.com/fx"
    cache_ttl_secs: 60
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.defaults.cost, 250.0);
        assert_eq!(config.defaults.margin, 45.5);
        assert_eq!(config.defaults.tax_rate, 5.0);
        assert_eq!(config.defaults.currency, Currency::Eur);
        // Not in the document
        assert_eq!(config.defaults.sale_price, 142.86);

        assert_eq!(config.providers.frankfurter.base_url, "http://example.com/fx");
        assert_eq!(config.providers.frankfurter.cache_ttl_secs, 60);
        assert_eq!(config.providers.frankfurter.timeout_secs, 10);
    }

    #[test]
    fn test_config_defaults_when_sections_missing() {
        let config: AppConfig = serde_yaml::from_str("defaults: {}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.defaults.currency, Currency::Usd);
        assert_eq!(
            config.providers.frankfurter.base_url,
            "https://api.frankfurter.dev"
        );
        assert_eq!(config.providers.frankfurter.cache_ttl_secs, 3600);
    }

    #[test]
    fn test_config_rejects_unknown_currency() {
        let result: std::result::Result<AppConfig, _> =
            serde_yaml::from_str("defaults:\n  currency: CHF\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_path() -> Result<()> {
        let dir = tempfile::TempDir::new()?;
        let path = dir.path().join("config.yaml");

        fs::write(&path, "defaults:\n  tax_rate: 15.0\n")?;
        let config = AppConfig::load_from_path(&path)?;
        assert_eq!(config.defaults.tax_rate, 15.0);

        fs::write(&path, "")?;
        assert_eq!(AppConfig::load_from_path(&path)?, AppConfig::default());

        let missing = AppConfig::load_from_path(dir.path().join("missing.yaml"));
        assert!(
            missing
                .unwrap_err()
                .to_string()
                .contains("Failed to read config file")
        );
        Ok(())
    }
}
