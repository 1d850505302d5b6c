/// Classification for retry policy.
///
/// Used to determine how the retry executor and failover router respond to
/// an adapter error.
///
/// # Behavior Summary
///
/// | Class | Retry In Place? | Try Next Adapter? |
/// |-------|-----------------|-------------------|
/// | `Retryable` | Yes, with backoff | Yes, once retries are exhausted |
/// | `Failover` | No | Yes, immediately |
/// | `NoData` | No | No - valid empty result |
/// | `Fatal` | No | No - terminal for the whole call |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Retry the same adapter with exponential backoff, then fail over.
    ///
    /// Used for transient faults and vendor-side unavailability (5xx,
    /// timeouts, connection resets), which often clear within seconds.
    Retryable,

    /// Move to the next adapter without spending the retry budget.
    ///
    /// Rate limits and credential failures are guaranteed to fail again on
    /// an immediate retry, so the router moves on instead.
    Failover,

    /// The vendor had nothing for a valid request. Not a failure: the
    /// caller gets an empty bar set and the adapter stays healthy.
    NoData,

    /// Terminal for the whole acquisition call.
    Fatal,
}

/// The health-relevant kind of an adapter failure.
///
/// This is the classification the health tracker acts on; every adapter
/// error maps to exactly one kind (or none, for non-failures like `NoData`).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FailureKind {
    /// Credential rejected. Does not self-heal; the adapter is out until
    /// process restart.
    Unauthenticated,
    /// Vendor rate limit hit. The adapter goes on cooldown immediately.
    RateLimited,
    /// Vendor-side outage (5xx and similar).
    Unavailable,
    /// One-off fault (timeout, connection reset, malformed response).
    Transient,
}

impl FailureKind {
    /// Stable string form, used in health reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Unauthenticated => "unauthenticated",
            FailureKind::RateLimited => "rate_limited",
            FailureKind::Unavailable => "unavailable",
            FailureKind::Transient => "transient",
        }
    }
}
