//! Bounded concurrent fan-out over remote lookups
//!
//! Runs one lookup per input with at most `concurrency` lookups in flight.
//! Inputs are processed in batches of `concurrency`; a shared [`BatchPacer`]
//! enforces a delay after each batch. Lookup failures are isolated: an input
//! whose lookup errors or finds nothing lands in `not_found` and the rest of
//! the batch continues.
//!
//! The semaphore and pacer are shared through `Arc`, so several fan-outs
//! running concurrently inside one request (tracks and artists, say) still
//! respect one global ceiling.

use crate::config::FanOutConfig;
use crate::error::AnalyzerResult;
use crate::services::rate_limiter::BatchPacer;
use futures::future::join_all;
use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// Outcome of a fan-out, both lists in input order
#[derive(Debug)]
pub struct FanOutOutcome<I, T> {
    pub resolved: Vec<(I, T)>,
    pub not_found: Vec<I>,
}

impl<I, T> FanOutOutcome<I, T> {
    pub fn values(self) -> Vec<T> {
        self.resolved.into_iter().map(|(_, value)| value).collect()
    }
}

/// Bounded, paced fan-out executor
#[derive(Debug, Clone)]
pub struct BoundedFanOut {
    permits: Arc<Semaphore>,
    batch_size: usize,
    pacer: Arc<BatchPacer>,
}

impl BoundedFanOut {
    pub fn new(config: &FanOutConfig) -> Self {
        Self::with_pacer(
            config.concurrency,
            Arc::new(BatchPacer::new(config.pacing)),
        )
    }

    pub fn with_pacer(concurrency: usize, pacer: Arc<BatchPacer>) -> Self {
        let concurrency = concurrency.max(1);
        Self {
            permits: Arc::new(Semaphore::new(concurrency)),
            batch_size: concurrency,
            pacer,
        }
    }

    /// Run `lookup` over every input
    ///
    /// # Arguments
    /// * `inputs` - Items to look up
    /// * `lookup` - Async lookup; `Ok(None)` means "not found"
    ///
    /// # Returns
    /// Resolved values and not-found inputs, each in input order
    pub async fn run<I, T, F, Fut>(&self, inputs: Vec<I>, lookup: F) -> FanOutOutcome<I, T>
    where
        I: Clone + Debug,
        F: Fn(I) -> Fut,
        Fut: Future<Output = AnalyzerResult<Option<T>>>,
    {
        let total = inputs.len();
        let mut resolved = Vec::with_capacity(total);
        let mut not_found = Vec::new();
        let mut pending = inputs.into_iter().enumerate().peekable();

        while pending.peek().is_some() {
            let batch: Vec<(usize, I)> = pending.by_ref().take(self.batch_size).collect();

            self.pacer.wait_for_slot().await;

            let lookups = batch.into_iter().map(|(index, input)| {
                let call = lookup(input.clone());
                let permits = &self.permits;
                async move {
                    // Permit is released when dropped at the end of this block,
                    // on success and failure alike
                    let _permit = permits.acquire().await.ok();
                    (index, input, call.await)
                }
            });

            let results = join_all(lookups).await;
            self.pacer.batch_complete().await;

            for (index, input, result) in results {
                match result {
                    Ok(Some(value)) => resolved.push((index, input, value)),
                    Ok(None) => {
                        debug!(input = ?input, "Lookup found nothing");
                        not_found.push((index, input));
                    }
                    Err(e) => {
                        warn!(
                            input = ?input,
                            error = %e,
                            "Lookup failed (per-entity error isolation)"
                        );
                        not_found.push((index, input));
                    }
                }
            }
        }

        resolved.sort_by_key(|(index, _, _)| *index);
        not_found.sort_by_key(|(index, _)| *index);

        debug!(
            total,
            resolved = resolved.len(),
            not_found = not_found.len(),
            "Fan-out complete"
        );

        FanOutOutcome {
            resolved: resolved
                .into_iter()
                .map(|(_, input, value)| (input, value))
                .collect(),
            not_found: not_found.into_iter().map(|(_, input)| input).collect(),
        }
    }
}
