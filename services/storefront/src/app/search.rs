//! services/storefront/src/app/search.rs
//!
//! Search-as-you-type over the public catalog. Each keystroke supersedes the
//! previous search: its debounce or in-flight request is cancelled, and a
//! response that is no longer the latest is discarded.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use storefront_core::domain::Product;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::feedback;
use crate::api::StorefrontApi;

pub const MIN_TERM_LENGTH: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// The term was too short; the dropdown is hidden.
    Cleared,
    Results(Vec<Product>),
    Failed(String),
    /// A newer search started before this one finished.
    Superseded,
}

/// What the dropdown currently shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResults {
    pub term: String,
    pub products: Vec<Product>,
    pub visible: bool,
}

/// The newest search: its sequence number and the token that cancels it.
/// Both change together under one lock.
#[derive(Default)]
struct Generation {
    sequence: u64,
    token: CancellationToken,
}

pub struct SearchBox {
    api: Arc<StorefrontApi>,
    debounce: Duration,
    current: Mutex<Generation>,
    results: RwLock<SearchResults>,
}

impl SearchBox {
    pub fn new(api: Arc<StorefrontApi>, debounce: Duration) -> Self {
        Self {
            api,
            debounce,
            current: Mutex::new(Generation::default()),
            results: RwLock::new(SearchResults::default()),
        }
    }

    pub async fn results(&self) -> SearchResults {
        self.results.read().await.clone()
    }

    fn generation(&self) -> MutexGuard<'_, Generation> {
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn is_latest(&self, sequence: u64) -> bool {
        self.generation().sequence == sequence
    }

    /// Cancels whatever search is running and starts a new generation.
    fn begin(&self) -> (u64, CancellationToken) {
        let mut current = self.generation();
        let token = CancellationToken::new();
        current.sequence += 1;
        std::mem::replace(&mut current.token, token.clone()).cancel();
        (current.sequence, token)
    }

    /// Applies `results` only if `sequence` is still the latest search.
    async fn publish(&self, sequence: u64, results: SearchResults) -> bool {
        let mut shown = self.results.write().await;
        if !self.is_latest(sequence) {
            return false;
        }
        *shown = results;
        true
    }

    pub async fn search(&self, term: &str) -> SearchOutcome {
        let (sequence, token) = self.begin();
        let term = term.trim().to_string();

        if term.chars().count() < MIN_TERM_LENGTH {
            self.publish(sequence, SearchResults::default()).await;
            return SearchOutcome::Cleared;
        }

        tokio::select! {
            _ = token.cancelled() => return SearchOutcome::Superseded,
            _ = tokio::time::sleep(self.debounce) => {}
        }

        let result = tokio::select! {
            _ = token.cancelled() => return SearchOutcome::Superseded,
            result = self.api.search_products(&term) => result,
        };

        match result {
            Ok(products) => {
                let shown = SearchResults {
                    term: term.clone(),
                    products: products.clone(),
                    visible: true,
                };
                if !self.publish(sequence, shown).await {
                    debug!(%term, "Discarding a stale search response");
                    return SearchOutcome::Superseded;
                }
                SearchOutcome::Results(products)
            }
            Err(e) => {
                warn!(%term, "Product search failed: {}", e);
                if !self.publish(sequence, SearchResults::default()).await {
                    return SearchOutcome::Superseded;
                }
                SearchOutcome::Failed(feedback::describe(&e, "Search is unavailable."))
            }
        }
    }

    /// Hides the dropdown and abandons any running search.
    pub async fn dismiss(&self) {
        self.begin();
        *self.results.write().await = SearchResults::default();
    }
}
