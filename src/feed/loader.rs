//! Single-flight incremental page loader.
//!
//! The loader appends successive pages to a shared [`FeedState`]. At most one
//! fetch is outstanding per loader; extra `load_more` calls while loading, or
//! after exhaustion, return [`LoadOutcome::Skipped`] without touching the
//! fetcher. Failures are recorded in `FeedState::error` and never propagated.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::state::{CatalogItem, FeedState, LoaderPhase};

/// Error returned by page-fetch collaborators.
pub type FetchError = Box<dyn std::error::Error + Send + Sync>;

/// Collaborator that retrieves one page of catalog items.
///
/// Implementations must return `Err` on failure (transport, timeout, bad
/// status) so the loader can tell a failed fetch from an empty page.
pub trait PageFetcher: Send + Sync + 'static {
    /// Fetch page `page` of the listing.
    fn fetch_page(
        &self,
        page: u32,
    ) -> impl Future<Output = Result<Vec<CatalogItem>, FetchError>> + Send;

    /// Forget any pages kept between fetches; called before the feed starts over.
    fn invalidate(&self) {}
}

/// Adapter turning an async closure into a [`PageFetcher`].
pub struct FnFetcher<F>(pub F);

impl<F, Fut> PageFetcher for FnFetcher<F>
where
    F: Fn(u32) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<CatalogItem>, FetchError>> + Send,
{
    fn fetch_page(
        &self,
        page: u32,
    ) -> impl Future<Output = Result<Vec<CatalogItem>, FetchError>> + Send {
        (self.0)(page)
    }
}

/// Pagination parameters of a loader.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Expected items per page; a shorter page marks the feed exhausted.
    pub page_size: usize,
    /// First page index requested after construction or reset.
    pub initial_page: u32,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            initial_page: 1,
        }
    }
}

/// Result of one `load_more` call, for logging and tests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Nothing was fetched: a fetch was in flight or the feed is exhausted.
    Skipped,
    /// A full page was appended; more may follow.
    Appended {
        /// Page that was fetched.
        page: u32,
        /// Items appended.
        count: usize,
    },
    /// A short or empty page was appended; the feed is now exhausted.
    Exhausted {
        /// Page that was fetched.
        page: u32,
        /// Items appended.
        count: usize,
    },
    /// The fetch failed; the same page will be retried next time.
    Failed {
        /// Page that was requested.
        page: u32,
        /// Failure message recorded in the state.
        error: String,
    },
    /// The response arrived after a reset and was discarded.
    Stale,
}

/// Mutable state behind the loader's lock.
struct Shared {
    /// Accumulated feed.
    state: FeedState,
    /// Bumped by every reset; responses tagged with an older value are ignored.
    generation: u64,
}

/// Releases the in-flight mark if a `load_more` future is dropped mid-fetch.
struct InFlight<'a> {
    /// Lock shared with the owning loader.
    shared: &'a Mutex<Shared>,
    /// Generation the fetch was issued under.
    generation: u64,
    /// Set once the fetch result has been observed.
    settled: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let mut shared = self.shared.lock().unwrap_or_else(PoisonError::into_inner);
        if shared.generation == self.generation {
            shared.state.is_loading = false;
            debug!(
                page = shared.state.page,
                "page fetch cancelled before settling"
            );
        }
    }
}

/// Page-fetch state machine for one query key.
///
/// Cloning yields another handle to the same state; every clone observes the
/// single-flight guarantee.
pub struct IncrementalLoader<F> {
    /// Injected page-fetch collaborator.
    fetcher: Arc<F>,
    /// Pagination parameters.
    config: LoaderConfig,
    /// State shared between clones.
    shared: Arc<Mutex<Shared>>,
}

impl<F> Clone for IncrementalLoader<F> {
    fn clone(&self) -> Self {
        Self {
            fetcher: Arc::clone(&self.fetcher),
            config: self.config,
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<F: PageFetcher> IncrementalLoader<F> {
    /// What: Create an idle loader positioned at `config.initial_page`.
    ///
    /// Inputs:
    /// - `fetcher`: Page-fetch collaborator
    /// - `config`: Page size and initial page
    ///
    /// Output:
    /// - Loader in the `Idle` phase with no items.
    #[must_use]
    pub fn new(fetcher: F, config: LoaderConfig) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            config,
            shared: Arc::new(Mutex::new(Shared {
                state: FeedState::new(config.initial_page),
                generation: 0,
            })),
        }
    }

    /// What: Fetch and append the next page if allowed.
    ///
    /// Inputs:
    /// - None
    ///
    /// Output:
    /// - [`LoadOutcome`] describing what happened; never an error.
    ///
    /// Details:
    /// - No-op while a fetch is in flight or after exhaustion.
    /// - On success appends items in arrival order and advances `page`; a page
    ///   shorter than `page_size` (or empty) exhausts the feed.
    /// - On failure records the message and leaves `page` and `has_more` as-is.
    /// - Results issued before a [`reset`](Self::reset) are discarded.
    pub async fn load_more(&self) -> LoadOutcome {
        let (page, generation) = {
            let mut shared = self.lock();
            if shared.state.is_loading || !shared.state.has_more {
                return LoadOutcome::Skipped;
            }
            shared.state.is_loading = true;
            (shared.state.page, shared.generation)
        };
        debug!(page, generation, "fetching page");

        let mut in_flight = InFlight {
            shared: &self.shared,
            generation,
            settled: false,
        };
        let result = self.fetcher.fetch_page(page).await;
        in_flight.settled = true;

        let mut shared = self.lock();
        if shared.generation != generation {
            debug!(
                page,
                issued = generation,
                current = shared.generation,
                "discarding page response issued before reset"
            );
            return LoadOutcome::Stale;
        }
        shared.state.is_loading = false;
        match result {
            Ok(items) => {
                let count = items.len();
                shared.state.items.extend(items);
                shared.state.page = page.saturating_add(1);
                shared.state.error = None;
                if count == 0 || count < self.config.page_size {
                    shared.state.has_more = false;
                    info!(page, count, total = shared.state.items.len(), "feed exhausted");
                    LoadOutcome::Exhausted { page, count }
                } else {
                    info!(page, count, total = shared.state.items.len(), "page appended");
                    LoadOutcome::Appended { page, count }
                }
            }
            Err(e) => {
                let error = e.to_string();
                warn!(page, error = %error, "page fetch failed");
                shared.state.error = Some(error.clone());
                LoadOutcome::Failed { page, error }
            }
        }
    }

    /// What: Start over from the initial page with fresh data.
    ///
    /// Details:
    /// - The fetcher drops whatever it kept for this listing before the state
    ///   is reset, so the next page is fetched rather than replayed.
    pub fn refresh(&self) {
        self.fetcher.invalidate();
        self.reset();
    }
}

impl<F> IncrementalLoader<F> {
    /// Acquire the state lock, recovering from poisoning.
    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// What: Return the loader to its initial state.
    ///
    /// Output:
    /// - None (clears items and error, restores `page`, sets `has_more`).
    ///
    /// Details:
    /// - Any fetch still in flight is orphaned: its response is discarded.
    pub fn reset(&self) {
        let mut shared = self.lock();
        shared.generation = shared.generation.wrapping_add(1);
        shared.state = FeedState::new(self.config.initial_page);
        info!(generation = shared.generation, "loader reset");
    }

    /// Current phase of the state machine.
    #[must_use]
    pub fn phase(&self) -> LoaderPhase {
        self.lock().state.phase()
    }

    /// Owned copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> FeedState {
        self.lock().state.clone()
    }

    /// Run `f` against the current state without cloning the item list.
    pub fn with_state<R>(&self, f: impl FnOnce(&FeedState) -> R) -> R {
        f(&self.lock().state)
    }

    /// Pagination parameters this loader was built with.
    #[must_use]
    pub const fn config(&self) -> LoaderConfig {
        self.config
    }
}
