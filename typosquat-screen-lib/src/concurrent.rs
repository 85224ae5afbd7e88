//! Concurrent fan-out/fan-in of lookup tasks.
//!
//! One task per (domain, lookup client) pair. Every task sends exactly one
//! outcome into a channel that has room for all of them, and the channel is
//! closed by a single closer task once every lookup task has been joined.

use crate::classifier;
use crate::error::ScreenError;
use crate::protocols::LookupClient;
use crate::types::{LookupKind, LookupOutcome};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

/// Dispatches lookup tasks and collects their outcomes.
#[derive(Debug, Clone)]
pub(crate) struct ConcurrentProcessor {
    /// Optional gate on in-flight lookups
    limiter: Option<Arc<Semaphore>>,
    /// Per-lookup time budget
    timeout: Duration,
}

impl ConcurrentProcessor {
    pub(crate) fn new(max_concurrency: Option<usize>, timeout: Duration) -> Self {
        Self {
            limiter: max_concurrency.map(|limit| Arc::new(Semaphore::new(limit.max(1)))),
            timeout,
        }
    }

    /// Spawn one task per (domain, client) pair and return the outcome stream.
    ///
    /// Must be called from within a tokio runtime. The receiver yields
    /// exactly `domains.len() * clients.len()` outcomes, in completion order,
    /// and then reports the channel closed.
    pub(crate) fn dispatch(
        &self,
        domains: Vec<String>,
        clients: &[Arc<dyn LookupClient>],
    ) -> mpsc::Receiver<LookupOutcome> {
        let expected = domains.len() * clients.len();
        let (tx, rx) = mpsc::channel(expected.max(1));
        let mut tasks = JoinSet::new();

        for domain in &domains {
            for client in clients {
                let client = Arc::clone(client);
                let domain = domain.clone();
                let tx = tx.clone();
                let limiter = self.limiter.clone();
                let timeout = self.timeout;

                tasks.spawn(async move {
                    let _permit = match limiter {
                        Some(semaphore) => semaphore.acquire_owned().await.ok(),
                        None => None,
                    };

                    let kind = client.kind();
                    let outcome = AssertUnwindSafe(run_lookup(client.as_ref(), &domain, timeout))
                        .catch_unwind()
                        .await
                        .unwrap_or_else(|_| {
                            classifier::failed(
                                &domain,
                                kind,
                                &ScreenError::internal("lookup task panicked"),
                            )
                        });

                    // Capacity covers every task, so this never waits on the consumer.
                    if tx.send(outcome).await.is_err() {
                        tracing::debug!(domain = %domain, %kind, "outcome dropped, receiver closed");
                    }
                });
            }
        }

        tracing::debug!(tasks = expected, domains = domains.len(), "dispatched lookups");

        tokio::spawn(async move {
            let mut joined = 0usize;
            while let Some(result) = tasks.join_next().await {
                joined += 1;
                if let Err(e) = result {
                    tracing::warn!("lookup task did not complete: {}", e);
                }
            }
            tracing::debug!(joined, "all lookups finished, closing results channel");
            drop(tx);
        });

        rx
    }
}

/// Run one lookup under the time budget and classify its response.
async fn run_lookup(client: &dyn LookupClient, domain: &str, timeout: Duration) -> LookupOutcome {
    let kind = client.kind();

    match tokio::time::timeout(timeout, client.lookup(domain)).await {
        Ok(Ok(response)) => classifier::evaluate(domain, kind, &response),
        Ok(Err(e)) => {
            tracing::debug!(domain, %kind, "lookup failed: {}", e);
            classifier::failed(domain, kind, &e)
        }
        Err(_) => {
            let e = ScreenError::timeout(lookup_operation(kind, domain), timeout);
            tracing::debug!(domain, %kind, "lookup timed out");
            classifier::failed(domain, kind, &e)
        }
    }
}

fn lookup_operation(kind: LookupKind, domain: &str) -> String {
    format!("{} lookup for {}", kind, domain)
}
