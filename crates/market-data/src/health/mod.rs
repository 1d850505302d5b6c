//! Per-adapter availability tracking.
//!
//! One [`ProviderHealth`] record exists per configured adapter, created at
//! startup and never destroyed. All fields are atomics so the hot path
//! (`is_available` before every routing attempt, counter updates after
//! every attempt) never takes a lock.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, AtomicU64, AtomicU8, Ordering};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use log::warn;
use serde::Serialize;

use crate::errors::FailureKind;

/// Availability policy knobs.
#[derive(Clone, Debug)]
pub struct HealthPolicy {
    /// Consecutive `Unavailable`/`Transient` failures before an adapter is
    /// marked unavailable. One-off blips below this threshold are tolerated.
    pub failure_threshold: u32,
    /// How long an adapter stays unavailable after a rate limit or after
    /// tripping the failure threshold. The vendor's own reset semantics are
    /// not assumed; this is a fixed local policy.
    pub rate_limit_cooldown: Duration,
}

impl Default for HealthPolicy {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            rate_limit_cooldown: Duration::from_secs(60),
        }
    }
}

// Encoding for the last-error slot; 0 means "no error recorded yet".
const ERR_NONE: u8 = 0;
const ERR_UNAUTHENTICATED: u8 = 1;
const ERR_RATE_LIMITED: u8 = 2;
const ERR_UNAVAILABLE: u8 = 3;
const ERR_TRANSIENT: u8 = 4;

fn encode_kind(kind: FailureKind) -> u8 {
    match kind {
        FailureKind::Unauthenticated => ERR_UNAUTHENTICATED,
        FailureKind::RateLimited => ERR_RATE_LIMITED,
        FailureKind::Unavailable => ERR_UNAVAILABLE,
        FailureKind::Transient => ERR_TRANSIENT,
    }
}

fn decode_kind(raw: u8) -> Option<FailureKind> {
    match raw {
        ERR_UNAUTHENTICATED => Some(FailureKind::Unauthenticated),
        ERR_RATE_LIMITED => Some(FailureKind::RateLimited),
        ERR_UNAVAILABLE => Some(FailureKind::Unavailable),
        ERR_TRANSIENT => Some(FailureKind::Transient),
        _ => None,
    }
}

/// Rolling health state for one adapter.
#[derive(Debug, Default)]
struct ProviderHealth {
    unavailable: AtomicBool,
    permanently_down: AtomicBool,
    consecutive_failures: AtomicU32,
    total_requests: AtomicU64,
    total_successes: AtomicU64,
    /// Epoch millis of the last recorded attempt; 0 = never.
    last_request_ms: AtomicI64,
    /// Epoch millis at which the adapter was marked unavailable.
    unavailable_since_ms: AtomicI64,
    last_error: AtomicU8,
}

/// Point-in-time view of one adapter's health, for the diagnostic surface.
#[derive(Clone, Debug, Serialize)]
pub struct ProviderHealthReport {
    pub provider: String,
    pub available: bool,
    pub total_requests: u64,
    pub total_successes: u64,
    /// Successes over requests; 1.0 when nothing was attempted yet.
    pub success_rate: f64,
    pub last_request: Option<DateTime<Utc>>,
    pub last_error: Option<&'static str>,
}

/// Tracks availability for a fixed set of adapters.
///
/// The record set is fixed at construction, so lookups are reads into an
/// immutable map and all mutation happens through atomics.
pub struct HealthTracker {
    policy: HealthPolicy,
    records: HashMap<String, ProviderHealth>,
}

impl HealthTracker {
    /// Create a tracker with one record per adapter id, all available.
    pub fn new<I, S>(policy: HealthPolicy, provider_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let records = provider_ids
            .into_iter()
            .map(|id| (id.into(), ProviderHealth::default()))
            .collect();
        Self { policy, records }
    }

    fn record(&self, provider: &str) -> Option<&ProviderHealth> {
        let record = self.records.get(provider);
        if record.is_none() {
            warn!("Health tracker has no record for provider {}", provider);
        }
        record
    }

    /// Record a successful attempt: counters reset, adapter available again
    /// (unless it was permanently disabled by a credential failure).
    pub fn record_success(&self, provider: &str) {
        let Some(rec) = self.record(provider) else {
            return;
        };
        rec.total_requests.fetch_add(1, Ordering::Relaxed);
        rec.total_successes.fetch_add(1, Ordering::Relaxed);
        rec.last_request_ms
            .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
        rec.consecutive_failures.store(0, Ordering::Relaxed);
        if !rec.permanently_down.load(Ordering::Relaxed) {
            rec.unavailable.store(false, Ordering::Relaxed);
        }
    }

    /// Record a failed attempt of the given kind.
    pub fn record_failure(&self, provider: &str, kind: FailureKind) {
        let Some(rec) = self.record(provider) else {
            return;
        };
        let now_ms = Utc::now().timestamp_millis();
        rec.total_requests.fetch_add(1, Ordering::Relaxed);
        rec.last_request_ms.store(now_ms, Ordering::Relaxed);
        rec.last_error.store(encode_kind(kind), Ordering::Relaxed);

        match kind {
            FailureKind::Unauthenticated => {
                rec.permanently_down.store(true, Ordering::Relaxed);
                rec.unavailable.store(true, Ordering::Relaxed);
                warn!(
                    "Provider {} disabled until restart: credentials rejected",
                    provider
                );
            }
            FailureKind::RateLimited => {
                rec.consecutive_failures.fetch_add(1, Ordering::Relaxed);
                rec.unavailable_since_ms.store(now_ms, Ordering::Relaxed);
                rec.unavailable.store(true, Ordering::Relaxed);
                warn!(
                    "Provider {} rate limited, cooling down for {:?}",
                    provider, self.policy.rate_limit_cooldown
                );
            }
            FailureKind::Unavailable | FailureKind::Transient => {
                let failures = rec.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
                if failures >= self.policy.failure_threshold {
                    rec.unavailable_since_ms.store(now_ms, Ordering::Relaxed);
                    rec.unavailable.store(true, Ordering::Relaxed);
                    warn!(
                        "Provider {} unavailable after {} consecutive failures",
                        provider, failures
                    );
                }
            }
        }
    }

    /// Whether the router should try this adapter right now.
    ///
    /// Read-only: an expired cooldown makes the adapter eligible again
    /// without mutating the record (the next success fully resets it).
    pub fn is_available(&self, provider: &str) -> bool {
        let Some(rec) = self.record(provider) else {
            // Unknown adapters carry no evidence of bad health.
            return true;
        };
        if rec.permanently_down.load(Ordering::Relaxed) {
            return false;
        }
        if !rec.unavailable.load(Ordering::Relaxed) {
            return true;
        }
        let since_ms = rec.unavailable_since_ms.load(Ordering::Relaxed);
        let elapsed = Utc::now().timestamp_millis().saturating_sub(since_ms);
        elapsed >= self.policy.rate_limit_cooldown.as_millis() as i64
    }

    /// Point-in-time reports for every tracked adapter, in no fixed order.
    pub fn snapshot(&self) -> Vec<ProviderHealthReport> {
        self.records
            .iter()
            .map(|(id, rec)| {
                let requests = rec.total_requests.load(Ordering::Relaxed);
                let successes = rec.total_successes.load(Ordering::Relaxed);
                let last_ms = rec.last_request_ms.load(Ordering::Relaxed);
                ProviderHealthReport {
                    provider: id.clone(),
                    available: self.is_available(id),
                    total_requests: requests,
                    total_successes: successes,
                    success_rate: if requests == 0 {
                        1.0
                    } else {
                        successes as f64 / requests as f64
                    },
                    last_request: if last_ms == 0 {
                        None
                    } else {
                        Utc.timestamp_millis_opt(last_ms).single()
                    },
                    last_error: decode_kind(rec.last_error.load(Ordering::Relaxed))
                        .map(|k| k.as_str()),
                }
            })
            .collect()
    }
}
