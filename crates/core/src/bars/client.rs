//! Router construction from configuration.

use std::sync::Arc;

use barvault_market_data::{AlpacaProvider, BarProvider, FailoverRouter, YahooChartProvider};

use crate::config::EngineConfig;
use crate::errors::{Error, Result};

/// Build the failover router described by a validated config: one adapter
/// per configured id, in preference order.
pub fn build_router(config: &EngineConfig) -> Result<FailoverRouter> {
    let mut providers: Vec<Arc<dyn BarProvider>> = Vec::with_capacity(config.providers.len());

    for id in &config.providers {
        match id.as_str() {
            "ALPACA" => {
                let (key, secret) = match (&config.alpaca_api_key, &config.alpaca_api_secret) {
                    (Some(key), Some(secret)) => (key.clone(), secret.clone()),
                    _ => {
                        return Err(Error::InvalidConfigValue(
                            "ALPACA provider configured but credentials are missing".to_string(),
                        ))
                    }
                };
                providers.push(Arc::new(AlpacaProvider::new(key, secret)));
            }
            "YAHOO" => providers.push(Arc::new(YahooChartProvider::new())),
            other => {
                return Err(Error::InvalidConfigValue(format!(
                    "unknown provider id: {}",
                    other
                )))
            }
        }
    }

    Ok(FailoverRouter::new(
        providers,
        config.health.clone(),
        config.retry.clone(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builds_router_in_preference_order() {
        let config = EngineConfig {
            providers: vec!["YAHOO".to_string()],
            ..EngineConfig::default()
        };
        let router = build_router(&config).unwrap();
        assert!(router.health().is_available("YAHOO"));
    }

    #[test]
    fn test_alpaca_without_credentials_is_rejected() {
        let config = EngineConfig::default();
        assert!(matches!(
            build_router(&config),
            Err(Error::InvalidConfigValue(_))
        ));
    }

    #[test]
    fn test_unknown_provider_id_is_rejected() {
        let config = EngineConfig {
            providers: vec!["STOOQ".to_string()],
            ..EngineConfig::default()
        };
        assert!(build_router(&config).is_err());
    }
}
