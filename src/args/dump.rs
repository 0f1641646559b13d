//! Command-line dump mode: fetch a few pages and print the ranked feed.

use std::sync::Arc;
use std::time::Duration;

use crate::config::Settings;
use crate::feed::{FeedView, LoadOutcome, PageFetcher, TracingNotifier};
use crate::logic::RankingMode;
use crate::sources::{CatalogClient, PageCache, build_http_client};
use crate::state::{CatalogItem, QueryKey};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// What: Load up to `pages` pages into `view` and return its ranked items.
///
/// Inputs:
/// - `view`: Feed to drive
/// - `pages`: Maximum number of pages to request
///
/// Output:
/// - Ranked items accumulated so far.
///
/// # Errors
/// - Returns `Err` with the fetch error when a page fails.
///
/// Details:
/// - Stops early once the feed is exhausted.
pub async fn collect_pages<F: PageFetcher>(
    view: &FeedView<F>,
    pages: u32,
) -> Result<Vec<CatalogItem>> {
    for _ in 0..pages {
        match view.load_more().await {
            LoadOutcome::Appended { .. } => {}
            LoadOutcome::Exhausted { .. } | LoadOutcome::Skipped => break,
            LoadOutcome::Failed { error, .. } => return Err(error.into()),
            LoadOutcome::Stale => {}
        }
    }
    let frame = view.frame(0.0, f64::INFINITY);
    Ok(frame.items)
}

/// What: Handle `--dump`: print the ranked feed for `key` as JSON on stdout.
///
/// Inputs:
/// - `settings`: Effective settings
/// - `key`: Listing to fetch
/// - `ranking`: Ordering policy
/// - `pages`: Number of pages to load
///
/// Output:
/// - `Ok(())` once the JSON array was written.
///
/// # Errors
/// - Returns `Err` when the HTTP client cannot be built, a page fails or
///   serialization fails.
pub async fn handle_dump(
    settings: &Settings,
    key: QueryKey,
    ranking: RankingMode,
    pages: u32,
) -> Result<()> {
    tracing::info!(
        kind = key.kind.as_config_key(),
        category = ?key.category_id,
        pages,
        "dump mode requested from CLI"
    );
    let http = build_http_client(Duration::from_secs(settings.request_timeout_secs))?;
    let cache = Arc::new(PageCache::new(
        settings.cache_capacity,
        Duration::from_secs(settings.cache_ttl_secs),
    ));
    let client = CatalogClient::new(http, &settings.api_base_url, key, settings.page_size, cache);
    let mut options = settings.feed_options(ranking);
    options.virtualize_min_items = usize::MAX;
    let view = FeedView::new(
        key,
        client,
        settings.loader_config(),
        options,
        Arc::new(TracingNotifier),
    );
    let items = collect_pages(&view, pages).await?;
    println!("{}", serde_json::to_string_pretty(&items)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{FeedOptions, LoaderConfig};
    use crate::state::ItemKind;
    use crate::test_utils::{RecordingNotifier, ScriptedFetcher, items};

    fn view(fetcher: ScriptedFetcher) -> FeedView<ScriptedFetcher> {
        FeedView::new(
            QueryKey::kind(ItemKind::Channel),
            fetcher,
            LoaderConfig {
                page_size: 2,
                initial_page: 1,
            },
            FeedOptions::default(),
            Arc::new(RecordingNotifier::default()),
        )
    }

    #[tokio::test]
    /// What: Collection stops at the page budget or at exhaustion, newest first
    async fn collect_pages_respects_budget_and_exhaustion() {
        let fetcher = ScriptedFetcher::new()
            .then_ok(items(1, 2))
            .then_ok(items(3, 2))
            .then_ok(items(5, 2));
        let v = view(fetcher.clone());
        let got = collect_pages(&v, 2).await.expect("collect");
        assert_eq!(got.iter().map(|i| i.id).collect::<Vec<_>>(), vec![4, 3, 2, 1]);
        assert_eq!(fetcher.calls(), vec![1, 2]);

        let fetcher = ScriptedFetcher::new().then_ok(items(1, 1));
        let v = view(fetcher.clone());
        assert_eq!(collect_pages(&v, 5).await.expect("collect").len(), 1);
        assert_eq!(fetcher.calls(), vec![1]);
    }

    #[tokio::test]
    /// What: A failed page surfaces as an error
    async fn collect_pages_propagates_failure() {
        let v = view(ScriptedFetcher::new().then_err("boom"));
        let err = collect_pages(&v, 3).await.expect_err("should fail");
        assert!(err.to_string().contains("boom"));
    }
}
