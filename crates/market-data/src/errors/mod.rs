//! Error types and retry classification for the market data crate.
//!
//! This module provides:
//! - [`MarketDataError`]: The main error enum for all vendor operations
//! - [`RetryClass`]: Classification for determining retry behavior
//! - [`FailureKind`]: The health-relevant kind of a failure

mod retry;

pub use retry::{FailureKind, RetryClass};

use thiserror::Error;

/// One adapter's last error, carried for diagnostics when the whole
/// failover chain is exhausted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderAttempt {
    /// The adapter that was tried (or skipped).
    pub provider: String,
    /// Rendered form of the adapter's last error.
    pub error: String,
}

fn render_attempts(attempts: &[ProviderAttempt]) -> String {
    if attempts.is_empty() {
        return "no adapters configured".to_string();
    }
    attempts
        .iter()
        .map(|a| format!("{}: {}", a.provider, a.error))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors that can occur while fetching bars from a vendor.
///
/// Each variant is classified via [`retry_class`](Self::retry_class) (how the
/// retry executor and router react) and [`failure_kind`](Self::failure_kind)
/// (how the health tracker reacts).
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The vendor rejected our credentials (HTTP 401/403).
    /// Terminal for this adapter until process restart.
    #[error("Unauthenticated: {provider}")]
    Unauthenticated {
        /// The adapter whose credentials were rejected
        provider: String,
    },

    /// The vendor rate limited the request (HTTP 429).
    /// Never retried in place; the adapter goes on cooldown and the
    /// router fails over.
    #[error("Rate limited: {provider}")]
    RateLimited {
        /// The adapter that was rate limited
        provider: String,
    },

    /// The vendor is down or erroring server-side (5xx).
    /// Retried with backoff, then failover.
    #[error("Provider unavailable: {provider} - {message}")]
    Unavailable {
        /// The adapter that is unavailable
        provider: String,
        /// Detail from the vendor response
        message: String,
    },

    /// A one-off fault: timeout, connection reset, malformed response.
    /// Retried with backoff, then failover.
    #[error("Transient failure: {provider} - {message}")]
    Transient {
        /// The adapter that hit the fault
        provider: String,
        /// Detail of the fault
        message: String,
    },

    /// The request was valid but the vendor has nothing for the range.
    /// Not a failure for routing purposes: surfaces as an empty bar set
    /// and must not mark the adapter unavailable.
    #[error("No data for range")]
    NoData,

    /// Every configured adapter was skipped or failed.
    /// Carries the last error from each attempted adapter.
    #[error("All providers exhausted: {}", render_attempts(.attempts))]
    AllProvidersExhausted {
        /// Per-adapter last errors, in routing order
        attempts: Vec<ProviderAttempt>,
    },

    /// A transport-level error outside any explicit status mapping.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl MarketDataError {
    /// Returns the retry classification for this error.
    ///
    /// - [`RetryClass::Retryable`]: retry the same adapter with backoff
    /// - [`RetryClass::Failover`]: move to the next adapter immediately
    /// - [`RetryClass::NoData`]: valid empty result, not a failure
    /// - [`RetryClass::Fatal`]: terminal for the whole call
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::Unauthenticated { .. } | Self::RateLimited { .. } => RetryClass::Failover,
            Self::Unavailable { .. } | Self::Transient { .. } | Self::Network(_) => {
                RetryClass::Retryable
            }
            Self::NoData => RetryClass::NoData,
            Self::AllProvidersExhausted { .. } => RetryClass::Fatal,
        }
    }

    /// Returns the health-tracker classification, if this error counts as
    /// an adapter failure at all.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Unauthenticated { .. } => Some(FailureKind::Unauthenticated),
            Self::RateLimited { .. } => Some(FailureKind::RateLimited),
            Self::Unavailable { .. } => Some(FailureKind::Unavailable),
            Self::Transient { .. } | Self::Network(_) => Some(FailureKind::Transient),
            Self::NoData | Self::AllProvidersExhausted { .. } => None,
        }
    }
}
