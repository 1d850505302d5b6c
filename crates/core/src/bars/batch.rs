//! Batch scheduling over the acquisition facade.
//!
//! Fans a watchlist out across a bounded worker pool. One symbol's failure
//! never aborts its siblings; every symbol ends up with an explicit
//! outcome, and incremental progress is emitted so long batches stay
//! observable.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use log::{info, warn};
use tokio::sync::{mpsc, Semaphore};

use barvault_market_data::Granularity;

use crate::watchlist::Watchlist;

use super::service::AcquisitionService;
use super::store::BarStore;

/// The per-symbol operation a batch performs.
#[derive(Clone, Copy, Debug)]
pub enum BatchOperation {
    /// Acquire the single freshest bar per symbol.
    Latest { granularity: Granularity },
    /// Acquire a fixed range per symbol.
    Range {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        granularity: Granularity,
    },
}

/// Terminal outcome for one symbol in a batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SymbolOutcome {
    /// The acquisition succeeded with this many newly upserted records.
    Fetched { records: usize },
    /// The acquisition failed terminally; sibling symbols were unaffected.
    Failed { error: String },
    /// The batch was cancelled before this symbol was started.
    Cancelled,
}

/// Incremental progress event for an in-flight batch.
#[derive(Clone, Debug)]
pub struct BatchProgress {
    pub symbol: String,
    /// Symbols finished so far, including this one.
    pub completed: usize,
    pub total: usize,
    /// Whether this symbol's outcome was a success.
    pub ok: bool,
}

/// Cooperative cancellation signal for a batch.
///
/// Raising the flag stops new symbols from being scheduled; in-flight
/// acquisitions run to completion so the persistence invariant holds.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Final result of a batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: HashMap<String, SymbolOutcome>,
    pub total: usize,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes
            .values()
            .filter(|o| matches!(o, SymbolOutcome::Fetched { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .values()
            .filter(|o| matches!(o, SymbolOutcome::Failed { .. }))
            .count()
    }

    pub fn cancelled(&self) -> usize {
        self.outcomes
            .values()
            .filter(|o| matches!(o, SymbolOutcome::Cancelled))
            .count()
    }

    /// Successes over total; an empty batch counts as fully successful.
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.succeeded() as f64 / self.total as f64
    }
}

impl<S: BarStore> AcquisitionService<S> {
    /// Run `operation` for every watchlist symbol across the bounded
    /// worker pool.
    ///
    /// An empty watchlist is a no-op success. Progress events are sent
    /// best-effort: a full channel drops events and a dropped receiver
    /// never fails or stalls the batch.
    pub async fn acquire_batch(
        &self,
        watchlist: &Watchlist,
        operation: BatchOperation,
        progress: Option<mpsc::Sender<BatchProgress>>,
        cancel: &CancelFlag,
    ) -> BatchReport {
        let total = watchlist.len();
        if total == 0 {
            info!("Batch requested with empty watchlist; nothing to do");
            return BatchReport::default();
        }

        let semaphore = Arc::new(Semaphore::new(self.config().worker_pool_size));
        let completed = Arc::new(AtomicUsize::new(0));

        let tasks = watchlist.iter().map(|symbol| {
            let semaphore = semaphore.clone();
            let completed = completed.clone();
            let progress = progress.clone();
            let cancel = cancel.clone();
            let symbol = symbol.clone();
            async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        // Semaphore is never closed while tasks are live.
                        return (symbol, SymbolOutcome::Failed {
                            error: "scheduler stopped".to_string(),
                        });
                    }
                };

                let outcome = if cancel.is_cancelled() {
                    SymbolOutcome::Cancelled
                } else {
                    let result = match operation {
                        BatchOperation::Latest { granularity } => self
                            .acquire_latest(&symbol, granularity)
                            .await
                            .map(|latest| usize::from(latest.bar.is_some())),
                        BatchOperation::Range {
                            start,
                            end,
                            granularity,
                        } => self
                            .acquire_range(&symbol, start, end, granularity)
                            .await
                            .map(|acquisition| acquisition.bars.len()),
                    };
                    match result {
                        Ok(records) => SymbolOutcome::Fetched { records },
                        Err(err) => {
                            warn!("Batch symbol {} failed: {}", symbol, err);
                            SymbolOutcome::Failed {
                                error: err.to_string(),
                            }
                        }
                    }
                };

                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                if let Some(tx) = &progress {
                    let event = BatchProgress {
                        symbol: symbol.clone(),
                        completed: done,
                        total,
                        ok: matches!(outcome, SymbolOutcome::Fetched { .. }),
                    };
                    // A slow or stalled receiver must never hold up workers;
                    // drop the event when the channel is full.
                    let _ = tx.try_send(event);
                }
                (symbol, outcome)
            }
        });

        let outcomes: HashMap<String, SymbolOutcome> = join_all(tasks).await.into_iter().collect();
        let report = BatchReport { outcomes, total };
        info!(
            "Batch finished: {}/{} succeeded, {} failed, {} cancelled",
            report.succeeded(),
            report.total,
            report.failed(),
            report.cancelled()
        );
        report
    }
}
