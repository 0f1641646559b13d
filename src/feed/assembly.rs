//! Feed assembly: loader output, ranked, then windowed per render tick.

use tracing::{debug, info};

use crate::feed::loader::{IncrementalLoader, LoadOutcome, LoaderConfig, PageFetcher};
use crate::feed::notify::{Notice, NoticeLevel, SharedNotifier};
use crate::logic::{RankingMode, ViewportWindow, unique_by_identity};
use crate::state::{CatalogItem, LoaderPhase, QueryKey, ScrollMetrics};

/// Render-independent options of a feed view.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FeedOptions {
    /// Row geometry used for windowing.
    pub window: ViewportWindow,
    /// Feeds with at least this many items are windowed; smaller feeds render whole.
    pub virtualize_min_items: usize,
    /// Ordering policy.
    pub ranking: RankingMode,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            window: ViewportWindow::new(3.0, 2),
            virtualize_min_items: 50,
            ranking: RankingMode::Promotion,
        }
    }
}

/// Everything a renderer needs for one tick.
#[derive(Clone, Debug, PartialEq)]
pub struct FeedFrame {
    /// Ranked rows to draw, already windowed.
    pub items: Vec<CatalogItem>,
    /// Index of `items[0]` within the full ranked feed.
    pub first_index: usize,
    /// Length of the full ranked feed.
    pub total_items: usize,
    /// Height of the spacer standing in for the whole feed.
    pub total_height: f64,
    /// Translation of the drawn rows.
    pub offset_y: f64,
    /// Whether windowing was applied.
    pub virtualized: bool,
    /// A page fetch is outstanding.
    pub is_loading: bool,
    /// More pages may exist.
    pub has_more: bool,
    /// Message of the last failed fetch.
    pub error: Option<String>,
}

/// One feed per query key: a loader plus ranking and windowing options.
pub struct FeedView<F> {
    /// Query the loader is bound to.
    key: QueryKey,
    /// Page loader owning the accumulated items.
    loader: IncrementalLoader<F>,
    /// Ranking and windowing options.
    options: FeedOptions,
    /// Sink for user-facing failures.
    notifier: SharedNotifier,
}

impl<F> Clone for FeedView<F> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            loader: self.loader.clone(),
            options: self.options,
            notifier: self.notifier.clone(),
        }
    }
}

impl<F: PageFetcher> FeedView<F> {
    /// What: Build a feed view for `key`.
    ///
    /// Inputs:
    /// - `key`: Query the fetcher serves
    /// - `fetcher`: Page-fetch collaborator
    /// - `loader_config`: Page size and initial page
    /// - `options`: Ranking and windowing options
    /// - `notifier`: Sink for failures
    ///
    /// Output:
    /// - Idle view with an empty feed.
    #[must_use]
    pub fn new(
        key: QueryKey,
        fetcher: F,
        loader_config: LoaderConfig,
        options: FeedOptions,
        notifier: SharedNotifier,
    ) -> Self {
        Self {
            key,
            loader: IncrementalLoader::new(fetcher, loader_config),
            options,
            notifier,
        }
    }

    /// What: Load the next page, reporting failures to the notifier.
    ///
    /// Output:
    /// - Outcome of the underlying loader call.
    pub async fn load_more(&self) -> LoadOutcome {
        let outcome = self.loader.load_more().await;
        if let LoadOutcome::Failed { page, error } = &outcome {
            self.notifier.notify(Notice {
                level: NoticeLevel::Error,
                message: format!(
                    "Could not load {} (page {page}): {error}",
                    self.key.kind.endpoint()
                ),
            });
        }
        outcome
    }

    /// What: Drop accumulated pages and start over from the initial page.
    ///
    /// Details:
    /// - Pages the fetcher kept for this query are dropped first, so the
    ///   restarted feed is fetched fresh.
    pub fn reset(&self) {
        info!(kind = self.key.kind.as_config_key(), "feed reset");
        self.loader.refresh();
    }
}

impl<F> FeedView<F> {
    /// Query this view serves.
    #[must_use]
    pub const fn key(&self) -> QueryKey {
        self.key
    }

    /// Underlying loader.
    #[must_use]
    pub const fn loader(&self) -> &IncrementalLoader<F> {
        &self.loader
    }

    /// Current options.
    #[must_use]
    pub const fn options(&self) -> FeedOptions {
        self.options
    }

    /// Switch the ranking policy; takes effect on the next frame.
    pub fn set_ranking(&mut self, ranking: RankingMode) {
        self.options.ranking = ranking;
    }

    /// Current loader phase.
    #[must_use]
    pub fn phase(&self) -> LoaderPhase {
        self.loader.phase()
    }

    /// What: Scroll metrics of this feed for a given viewport.
    ///
    /// Inputs:
    /// - `scroll_offset`: Current scroll position
    /// - `viewport_height`: Visible container height
    ///
    /// Output:
    /// - `ScrollMetrics` whose document height is the feed's full extent.
    #[must_use]
    pub fn scroll_metrics(&self, scroll_offset: f64, viewport_height: f64) -> ScrollMetrics {
        let count = self.loader.with_state(|s| unique_by_identity(&s.items).len());
        ScrollMetrics {
            scroll_offset,
            viewport_height,
            document_height: self.options.window.total_height(count),
        }
    }

    /// What: Rank the accumulated items and select the rows to draw.
    ///
    /// Inputs:
    /// - `scroll_offset`: Current scroll position
    /// - `container_height`: Visible container height
    ///
    /// Output:
    /// - `FeedFrame` with the ranked slice, spacer height, offset and loader flags.
    ///
    /// Details:
    /// - Repeated identities are shown once, first arrival wins.
    /// - Ranking runs on every call over borrowed items; only drawn rows are cloned
    ///   and the loader's items are never reordered.
    /// - Feeds shorter than `virtualize_min_items` are returned whole.
    #[must_use]
    pub fn frame(&self, scroll_offset: f64, container_height: f64) -> FeedFrame {
        let options = self.options;
        self.loader.with_state(|s| {
            let mut ranked = unique_by_identity(&s.items);
            options.ranking.sort_refs(&mut ranked);
            let window = options.window;
            let total_items = ranked.len();
            let total_height = window.total_height(total_items);

            let (rows, offset_y, virtualized) = if total_items < options.virtualize_min_items {
                (0..total_items, 0.0, false)
            } else {
                let range = window.range(scroll_offset, container_height, total_items);
                debug!(
                    start = range.start_index(),
                    len = range.len(),
                    total = total_items,
                    "windowed feed frame"
                );
                (range.as_range(), window.offset_y(range), true)
            };
            let first_index = rows.start;
            let items = ranked
                .get(rows)
                .unwrap_or_default()
                .iter()
                .copied()
                .cloned()
                .collect();
            FeedFrame {
                items,
                first_index,
                total_items,
                total_height,
                offset_y,
                virtualized,
                is_loading: s.is_loading,
                has_more: s.has_more,
                error: s.error.clone(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::state::ItemKind;
    use crate::test_utils::{RecordingNotifier, ScriptedFetcher, items};

    fn view(fetcher: ScriptedFetcher, page_size: usize, notifier: RecordingNotifier) -> FeedView<ScriptedFetcher> {
        FeedView::new(
            QueryKey::kind(ItemKind::Bot),
            fetcher,
            LoaderConfig {
                page_size,
                initial_page: 1,
            },
            FeedOptions {
                window: ViewportWindow::new(10.0, 1),
                virtualize_min_items: 20,
                ranking: RankingMode::Promotion,
            },
            Arc::new(notifier),
        )
    }

    #[tokio::test]
    /// What: Small feeds render whole, newest first
    async fn frame_small_feed_not_virtualized() {
        let v = view(
            ScriptedFetcher::new().then_ok(items(0, 5)),
            10,
            RecordingNotifier::default(),
        );
        let _ = v.load_more().await;
        let f = v.frame(0.0, 30.0);
        assert!(!f.virtualized);
        assert_eq!(f.items.iter().map(|i| i.id).collect::<Vec<_>>(), vec![4, 3, 2, 1, 0]);
        assert!((f.total_height - 50.0).abs() < f64::EPSILON);
        assert!(!f.has_more);
    }

    #[tokio::test]
    /// What: Large feeds are windowed over the ranked order
    ///
    /// - Input: 40 items (ids 0..40, newer ids rank first), rows of 10, viewport 30, overscan 1
    /// - Output: Scroll 100 selects ranked rows 9..=14 with offset 90
    async fn frame_large_feed_windowed() {
        let v = view(
            ScriptedFetcher::new()
                .then_ok(items(0, 20))
                .then_ok(items(20, 20)),
            20,
            RecordingNotifier::default(),
        );
        let _ = v.load_more().await;
        let _ = v.load_more().await;
        let f = v.frame(100.0, 30.0);
        assert!(f.virtualized);
        assert_eq!(f.total_items, 40);
        assert_eq!(f.first_index, 9);
        assert_eq!(f.items.len(), 6);
        assert_eq!(f.items[0].id, 30);
        assert!((f.offset_y - 90.0).abs() < f64::EPSILON);
        assert!((f.total_height - 400.0).abs() < f64::EPSILON);
        assert!(f.has_more);
    }

    #[tokio::test]
    /// What: Items promoted in a later page rank above earlier pages
    async fn frame_reranks_after_each_page() {
        let mut promoted = items(100, 1);
        promoted[0].is_top = true;
        let v = view(
            ScriptedFetcher::new().then_ok(items(0, 2)).then_ok(promoted),
            2,
            RecordingNotifier::default(),
        );
        let _ = v.load_more().await;
        assert_eq!(v.frame(0.0, 100.0).items[0].id, 1);
        let _ = v.load_more().await;
        let f = v.frame(0.0, 100.0);
        assert_eq!(f.items[0].id, 100);
        let raw: Vec<i64> = v.loader().with_state(|s| s.items.iter().map(|i| i.id).collect());
        assert_eq!(raw, vec![0, 1, 100]);
    }

    #[tokio::test]
    /// What: Failures reach the injected notifier and the frame's error field
    async fn failure_is_notified_and_exposed() {
        let notes = RecordingNotifier::default();
        let v = view(ScriptedFetcher::new().then_err("timeout"), 5, notes.clone());
        let _ = v.load_more().await;
        let f = v.frame(0.0, 10.0);
        assert_eq!(f.error.as_deref(), Some("timeout"));
        assert!(f.items.is_empty());
        let seen = notes.notices();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].level, NoticeLevel::Error);
        assert!(seen[0].message.contains("bots"));
    }

    #[tokio::test]
    /// What: A record repeated across pages is shown once
    ///
    /// - Input: Page 1 holds ids 0 and 1; page 2 repeats id 1 next to id 2
    /// - Output: Frame shows 0, 1, 2 once each; the loader keeps all four records
    async fn frame_drops_identity_repeated_across_pages() {
        let mut second = items(1, 2);
        second[0].title = "shifted copy".into();
        let v = view(
            ScriptedFetcher::new().then_ok(items(0, 2)).then_ok(second),
            2,
            RecordingNotifier::default(),
        );
        let _ = v.load_more().await;
        let _ = v.load_more().await;
        let f = v.frame(0.0, 100.0);
        assert_eq!(f.total_items, 3);
        assert_eq!(f.items.iter().map(|i| i.id).collect::<Vec<_>>(), vec![2, 1, 0]);
        assert!(f.items.iter().all(|i| i.title.is_empty()));
        assert!((f.total_height - 30.0).abs() < f64::EPSILON);
        assert!((v.scroll_metrics(0.0, 10.0).document_height - 30.0).abs() < f64::EPSILON);
        assert_eq!(v.loader().with_state(|s| s.items.len()), 4);
    }

    #[tokio::test]
    /// What: Reset drops the fetcher's kept pages and refetches from page 1
    async fn reset_refetches_first_page() {
        let fetcher = ScriptedFetcher::new()
            .then_ok(items(0, 2))
            .then_ok(items(10, 2));
        let v = view(fetcher.clone(), 2, RecordingNotifier::default());
        let _ = v.load_more().await;
        v.reset();
        assert_eq!(fetcher.invalidations(), 1);
        assert!(v.frame(0.0, 100.0).items.is_empty());
        let _ = v.load_more().await;
        assert_eq!(fetcher.calls(), vec![1, 1]);
        assert_eq!(v.frame(0.0, 100.0).items[0].id, 11);
    }

    #[test]
    /// What: Empty feed produces an empty, non-windowed frame
    fn frame_empty_feed() {
        let v = view(ScriptedFetcher::new(), 5, RecordingNotifier::default());
        let f = v.frame(0.0, 10.0);
        assert!(f.items.is_empty());
        assert!(f.total_height.abs() < f64::EPSILON);
        assert!(f.has_more);
        assert!(!f.is_loading);
    }
}
