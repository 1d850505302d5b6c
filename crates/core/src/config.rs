//! Engine configuration.
//!
//! One explicit struct with named fields and documented defaults, validated
//! at startup, instead of scattered environment lookups. An environment
//! surface is still offered via [`EngineConfig::from_env`] for deployments
//! that configure through the process environment.

use std::env;
use std::time::Duration as StdDuration;

use chrono::Duration;

use barvault_market_data::{Granularity, HealthPolicy, RetryPolicy};

use crate::errors::{Error, Result};

/// Largest allowed worker pool; vendor rate limits make more workers
/// counterproductive.
pub const MAX_WORKER_POOL_SIZE: usize = 8;

/// All operationally tunable parameters of the engine.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Adapter ids in failover preference order (primary first).
    /// Known ids: `ALPACA`, `YAHOO`.
    pub providers: Vec<String>,
    /// Bounded worker pool size for batch operations (1..=8, default 4).
    pub worker_pool_size: usize,
    /// Retry budget and backoff schedule per adapter call.
    pub retry: RetryPolicy,
    /// Adapter availability policy (failure threshold, cooldown).
    pub health: HealthPolicy,
    /// Context window for `acquire_latest` on daily bars, in days
    /// (default 7: covers weekends and holiday gaps).
    pub latest_lookback_daily_days: i64,
    /// Context window for `acquire_latest` on intraday bars, in hours
    /// (default 24).
    pub latest_lookback_intraday_hours: i64,
    /// Alpaca credential pair; required when `providers` contains `ALPACA`.
    pub alpaca_api_key: Option<String>,
    /// See `alpaca_api_key`.
    pub alpaca_api_secret: Option<String>,
    /// Path of the SQLite cache database.
    pub db_path: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            providers: vec!["ALPACA".to_string(), "YAHOO".to_string()],
            worker_pool_size: 4,
            retry: RetryPolicy::default(),
            health: HealthPolicy::default(),
            latest_lookback_daily_days: 7,
            latest_lookback_intraday_hours: 24,
            alpaca_api_key: None,
            alpaca_api_secret: None,
            db_path: "barvault.db".to_string(),
        }
    }
}

impl EngineConfig {
    /// Check every field once, at startup.
    pub fn validate(&self) -> Result<()> {
        if self.providers.is_empty() {
            return Err(Error::InvalidConfigValue(
                "providers must not be empty".to_string(),
            ));
        }
        let mut seen: Vec<&str> = Vec::new();
        for id in &self.providers {
            if seen.contains(&id.as_str()) {
                return Err(Error::InvalidConfigValue(format!(
                    "duplicate provider id: {}",
                    id
                )));
            }
            seen.push(id);
        }
        if self.worker_pool_size == 0 || self.worker_pool_size > MAX_WORKER_POOL_SIZE {
            return Err(Error::InvalidConfigValue(format!(
                "worker_pool_size must be in 1..={}, got {}",
                MAX_WORKER_POOL_SIZE, self.worker_pool_size
            )));
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::InvalidConfigValue(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.retry.base_delay > self.retry.max_delay {
            return Err(Error::InvalidConfigValue(
                "retry.base_delay must not exceed retry.max_delay".to_string(),
            ));
        }
        if self.health.failure_threshold == 0 {
            return Err(Error::InvalidConfigValue(
                "health.failure_threshold must be at least 1".to_string(),
            ));
        }
        if self.latest_lookback_daily_days <= 0 || self.latest_lookback_intraday_hours <= 0 {
            return Err(Error::InvalidConfigValue(
                "latest lookback windows must be positive".to_string(),
            ));
        }
        if self.providers.iter().any(|p| p == "ALPACA")
            && (self.alpaca_api_key.is_none() || self.alpaca_api_secret.is_none())
        {
            return Err(Error::InvalidConfigValue(
                "ALPACA provider configured but credentials are missing".to_string(),
            ));
        }
        if self.db_path.trim().is_empty() {
            return Err(Error::InvalidConfigValue(
                "db_path must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Build a validated config from the process environment.
    ///
    /// Recognized variables (all optional, defaults apply):
    /// `BARVAULT_PROVIDERS` (comma-separated ids), `BARVAULT_WORKERS`,
    /// `BARVAULT_MAX_RETRIES`, `BARVAULT_DB_PATH`,
    /// `BARVAULT_RATE_LIMIT_COOLDOWN_SECS`, `ALPACA_API_KEY`,
    /// `ALPACA_SECRET_KEY`.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(providers) = env::var("BARVAULT_PROVIDERS") {
            config.providers = providers
                .split(',')
                .map(|p| p.trim().to_uppercase())
                .filter(|p| !p.is_empty())
                .collect();
        }
        if let Ok(workers) = env::var("BARVAULT_WORKERS") {
            config.worker_pool_size = workers.parse().map_err(|_| {
                Error::InvalidConfigValue(format!("BARVAULT_WORKERS: not a number: {}", workers))
            })?;
        }
        if let Ok(retries) = env::var("BARVAULT_MAX_RETRIES") {
            config.retry.max_attempts = retries.parse().map_err(|_| {
                Error::InvalidConfigValue(format!(
                    "BARVAULT_MAX_RETRIES: not a number: {}",
                    retries
                ))
            })?;
        }
        if let Ok(cooldown) = env::var("BARVAULT_RATE_LIMIT_COOLDOWN_SECS") {
            let secs: u64 = cooldown.parse().map_err(|_| {
                Error::InvalidConfigValue(format!(
                    "BARVAULT_RATE_LIMIT_COOLDOWN_SECS: not a number: {}",
                    cooldown
                ))
            })?;
            config.health.rate_limit_cooldown = StdDuration::from_secs(secs);
        }
        if let Ok(path) = env::var("BARVAULT_DB_PATH") {
            config.db_path = path;
        }
        config.alpaca_api_key = env::var("ALPACA_API_KEY").ok();
        config.alpaca_api_secret = env::var("ALPACA_SECRET_KEY").ok();

        config.validate()?;
        Ok(config)
    }

    /// Context window for `acquire_latest` at the given granularity.
    pub fn latest_lookback(&self, granularity: Granularity) -> Duration {
        if granularity.is_intraday() {
            Duration::hours(self.latest_lookback_intraday_hours)
        } else {
            Duration::days(self.latest_lookback_daily_days)
        }
    }
}
