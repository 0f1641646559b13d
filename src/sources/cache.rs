//! Request-deduplicating page cache for catalog listings.
//!
//! Fresh pages are served from an in-memory LRU; concurrent requests for the
//! same page share one underlying fetch.
use std::collections::HashMap;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use lru::LruCache;
use tokio::time::Instant;
use tracing::debug;

use crate::feed::FetchError;
use crate::state::{CatalogItem, QueryKey};

/// Cache key: query plus page index.
pub type PageKey = (QueryKey, u32);

/// Shared in-flight fetch; errors are carried as strings so the output is `Clone`.
type InFlightPage = Shared<BoxFuture<'static, Result<Vec<CatalogItem>, String>>>;

/// Cached page with the instant it was stored.
struct CacheEntry {
    /// Items of the page.
    data: Vec<CatalogItem>,
    /// When the entry was inserted.
    timestamp: Instant,
}

/// LRU page cache with a time-to-live and in-flight request sharing.
pub struct PageCache {
    /// Completed pages.
    pages: Mutex<LruCache<PageKey, CacheEntry>>,
    /// Fetches currently running, by key.
    in_flight: Mutex<HashMap<PageKey, InFlightPage>>,
    /// Maximum age of a served entry.
    ttl: Duration,
}

/// Lock helper that recovers from poisoning.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl PageCache {
    /// What: Create a cache holding up to `capacity` pages for `ttl`.
    ///
    /// Inputs:
    /// - `capacity`: Maximum number of pages (0 is treated as 1)
    /// - `ttl`: Maximum age of a served page
    ///
    /// Output:
    /// - Empty cache.
    #[must_use]
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            pages: Mutex::new(LruCache::new(capacity)),
            in_flight: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// What: Return a fresh cached page or fetch it once.
    ///
    /// Inputs:
    /// - `key`: Query and page
    /// - `fetch`: Produces the fetch future; only called when no fresh entry or
    ///   in-flight request exists
    ///
    /// Output:
    /// - Page items, or the fetch error (failures are never cached).
    ///
    /// # Errors
    /// - Returns the error produced by `fetch`, shared by all concurrent callers.
    pub async fn get_or_fetch<Fut>(
        &self,
        key: PageKey,
        fetch: impl FnOnce() -> Fut,
    ) -> Result<Vec<CatalogItem>, FetchError>
    where
        Fut: Future<Output = Result<Vec<CatalogItem>, FetchError>> + Send + 'static,
    {
        if let Some(hit) = self.fresh(&key) {
            debug!(kind = key.0.kind.as_config_key(), page = key.1, "page cache hit");
            return Ok(hit);
        }

        let shared = {
            let mut in_flight = lock(&self.in_flight);
            if let Some(existing) = in_flight.get(&key) {
                debug!(page = key.1, "joining in-flight page request");
                existing.clone()
            } else {
                let fut = fetch()
                    .map(|r| r.map_err(|e| e.to_string()))
                    .boxed()
                    .shared();
                in_flight.insert(key, fut.clone());
                fut
            }
        };

        let result = shared.clone().await;
        {
            let mut in_flight = lock(&self.in_flight);
            if in_flight.get(&key).is_some_and(|f| f.ptr_eq(&shared)) {
                in_flight.remove(&key);
            }
        }
        match result {
            Ok(items) => {
                lock(&self.pages).put(
                    key,
                    CacheEntry {
                        data: items.clone(),
                        timestamp: Instant::now(),
                    },
                );
                Ok(items)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Cached page if present and younger than the TTL.
    fn fresh(&self, key: &PageKey) -> Option<Vec<CatalogItem>> {
        let mut pages = lock(&self.pages);
        let expired = match pages.get(key) {
            Some(entry) if entry.timestamp.elapsed() < self.ttl => return Some(entry.data.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            pages.pop(key);
        }
        None
    }

    /// Drop every cached page belonging to `query`.
    pub fn invalidate(&self, query: QueryKey) {
        let mut pages = lock(&self.pages);
        let stale: Vec<PageKey> = pages
            .iter()
            .filter(|(k, _)| k.0 == query)
            .map(|(k, _)| *k)
            .collect();
        for k in stale {
            pages.pop(&k);
        }
    }

    /// Number of cached pages.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.pages).len()
    }

    /// Whether the cache holds no pages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
