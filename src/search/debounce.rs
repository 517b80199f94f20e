//! Debounced, generation-tagged candidate search
//!
//! Every call to [`SearchCoordinator::request`] bumps a generation counter and
//! spawns a task that waits out the debounce interval. If another request
//! arrived meanwhile, the task gives up without calling the provider. Results
//! come back over an mpsc channel tagged with their generation; the host only
//! applies an update whose generation is still the latest one issued. Late
//! responses are ignored, never aborted.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use super::{Candidate, EntitySearchProvider};

/// Result of one provider call, tagged with the request that produced it
#[derive(Debug, Clone)]
pub struct SearchUpdate {
    pub generation: u64,
    pub query: String,
    /// Provider errors are carried as text; they only ever render as "no results"
    pub outcome: Result<Vec<Candidate>, String>,
}

impl SearchUpdate {
    /// Candidates, with a failed search treated as an empty list
    pub fn into_candidates(self) -> Vec<Candidate> {
        self.outcome.unwrap_or_default()
    }
}

pub type SearchUpdates = mpsc::UnboundedReceiver<SearchUpdate>;

pub struct SearchCoordinator {
    provider: Arc<dyn EntitySearchProvider>,
    debounce: Duration,
    limit: usize,
    latest: Arc<AtomicU64>,
    tx: mpsc::UnboundedSender<SearchUpdate>,
}

impl SearchCoordinator {
    /// Create a coordinator and the receiver its results arrive on
    pub fn new(
        provider: Arc<dyn EntitySearchProvider>,
        debounce: Duration,
        limit: usize,
    ) -> (Self, SearchUpdates) {
        let (tx, rx) = mpsc::unbounded_channel();
        let coordinator = Self {
            provider,
            debounce,
            limit,
            latest: Arc::new(AtomicU64::new(0)),
            tx,
        };
        (coordinator, rx)
    }

    /// Issue a debounced search for `query`; returns its generation.
    ///
    /// Must be called from within a tokio runtime.
    pub fn request(&self, query: &str) -> u64 {
        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;

        let latest = Arc::clone(&self.latest);
        let provider = Arc::clone(&self.provider);
        let tx = self.tx.clone();
        let debounce = self.debounce;
        let limit = self.limit;
        let query = query.to_string();

        tokio::spawn(async move {
            if !debounce.is_zero() {
                tokio::time::sleep(debounce).await;
            }

            if latest.load(Ordering::SeqCst) != generation {
                tracing::trace!("Search for {:?} coalesced (gen {})", query, generation);
                return;
            }

            tracing::debug!("Searching {:?} (gen {}, limit {})", query, generation, limit);
            let outcome = provider
                .search(&query, limit)
                .await
                .map_err(|e| {
                    tracing::warn!("Candidate search for {:?} failed: {:#}", query, e);
                    format!("{:#}", e)
                });

            // Receiver gone means the host shut down
            let _ = tx.send(SearchUpdate {
                generation,
                query,
                outcome,
            });
        });

        generation
    }

    /// Invalidate whatever is in flight; its result will be stale on arrival
    pub fn cancel(&self) {
        self.latest.fetch_add(1, Ordering::SeqCst);
    }

    /// Generation of the most recently initiated request
    pub fn latest_generation(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    /// Whether `update` answers the most recently initiated request
    pub fn is_current(&self, update: &SearchUpdate) -> bool {
        update.generation == self.latest_generation()
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }
}
