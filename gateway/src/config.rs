//! Gateway configuration.

use std::time::Duration;

use xrate_common::Currency;
use xrate_fx::{ExchangeCalculatorConfig, HttpRateSourceConfig};

/// Main gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL of the upstream rates API.
    pub rates_base_url: String,
    /// Days before a cached rate table is refreshed.
    pub refresh_ttl_days: u32,
    /// Currencies accepted in requests and fetched from the upstream.
    pub currencies: Vec<Currency>,
    /// Upstream request timeout.
    pub request_timeout: Duration,
    /// Log level.
    pub log_level: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        let source = HttpRateSourceConfig::default();
        Self {
            rates_base_url: source.base_url,
            refresh_ttl_days: ExchangeCalculatorConfig::default().refresh_ttl_days,
            currencies: source.currencies,
            request_timeout: source.request_timeout,
            log_level: "info".to_string(),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration from any variable lookup, over the defaults.
    ///
    /// Values that fail to parse leave the default in place; `validate`
    /// catches values that parse but make no sense.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = var("XRATE_RATES_BASE_URL") {
            config.rates_base_url = url;
        }

        if let Some(days) = var("XRATE_REFRESH_TTL_DAYS") {
            if let Ok(days) = days.trim().parse() {
                config.refresh_ttl_days = days;
            }
        }

        if let Some(codes) = var("XRATE_CURRENCIES") {
            config.currencies = codes
                .split(',')
                .map(str::trim)
                .filter(|code| !code.is_empty())
                .map(Currency::new)
                .collect();
        }

        if let Some(secs) = var("XRATE_REQUEST_TIMEOUT_SECS") {
            if let Ok(secs) = secs.trim().parse() {
                config.request_timeout = Duration::from_secs(secs);
            }
        }

        if let Some(level) = var("LOG_LEVEL") {
            config.log_level = level;
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.rates_base_url.is_empty() {
            return Err("Rates base URL cannot be empty".to_string());
        }

        if !self.rates_base_url.starts_with("http://") && !self.rates_base_url.starts_with("https://") {
            return Err(format!(
                "Rates base URL must be http or https: {}",
                self.rates_base_url
            ));
        }

        if self.refresh_ttl_days == 0 {
            return Err("Refresh TTL must be at least one day".to_string());
        }

        if self.currencies.is_empty() {
            return Err("At least one currency must be configured".to_string());
        }

        for (i, currency) in self.currencies.iter().enumerate() {
            if self.currencies[..i].contains(currency) {
                return Err(format!("Currency {} is configured twice", currency));
            }
        }

        if self.request_timeout.is_zero() {
            return Err("Request timeout cannot be 0".to_string());
        }

        Ok(())
    }

    /// Rate source settings derived from this configuration.
    pub fn source_config(&self) -> HttpRateSourceConfig {
        HttpRateSourceConfig {
            base_url: self.rates_base_url.clone(),
            currencies: self.currencies.clone(),
            request_timeout: self.request_timeout,
        }
    }

    /// Calculator settings derived from this configuration.
    pub fn calculator_config(&self) -> ExchangeCalculatorConfig {
        ExchangeCalculatorConfig {
            refresh_ttl_days: self.refresh_ttl_days,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_map(vars: &[(&str, &str)]) -> GatewayConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        GatewayConfig::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = GatewayConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.refresh_ttl_days, 60);
        assert_eq!(
            config.currencies,
            vec![Currency::eur(), Currency::gbp(), Currency::usd()]
        );
    }

    #[test]
    fn test_env_overrides() {
        let config = from_map(&[
            ("XRATE_RATES_BASE_URL", "http://localhost:8000/rates"),
            ("XRATE_REFRESH_TTL_DAYS", "7"),
            ("XRATE_CURRENCIES", "usd, chf,,eur"),
            ("XRATE_REQUEST_TIMEOUT_SECS", "5"),
            ("LOG_LEVEL", "debug"),
        ]);

        assert_eq!(config.rates_base_url, "http://localhost:8000/rates");
        assert_eq!(config.refresh_ttl_days, 7);
        assert_eq!(
            config.currencies,
            vec![Currency::usd(), Currency::new("CHF"), Currency::eur()]
        );
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.log_level, "debug");
        assert!(config.validate().is_ok());

        assert_eq!(config.source_config().currencies.len(), 3);
        assert_eq!(config.calculator_config().refresh_ttl_days, 7);
    }

    #[test]
    fn test_unparseable_values_keep_defaults() {
        let config = from_map(&[("XRATE_REFRESH_TTL_DAYS", "soon")]);
        assert_eq!(config.refresh_ttl_days, 60);
    }

    #[test]
    fn test_invalid_config() {
        let mut config = GatewayConfig::default();
        config.refresh_ttl_days = 0;
        assert!(config.validate().is_err());

        let mut config = GatewayConfig::default();
        config.rates_base_url = "ftp://rates.example".to_string();
        assert!(config.validate().is_err());

        let mut config = GatewayConfig::default();
        config.currencies.clear();
        assert!(config.validate().is_err());

        let config = from_map(&[("XRATE_CURRENCIES", "eur,EUR")]);
        assert!(config.validate().is_err());

        let mut config = GatewayConfig::default();
        config.request_timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }
}
