//! HTTP page fetcher for catalog listings.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

use super::Result;
use super::cache::PageCache;
use crate::feed::{FetchError, PageFetcher};
use crate::state::{CatalogItem, ItemKind, QueryKey};

/// What: Build the HTTP client shared by every catalog fetcher.
///
/// Inputs:
/// - `timeout`: Whole-request timeout
///
/// Output:
/// - Configured `reqwest::Client` with connection pooling.
///
/// # Errors
/// - Returns `Err` when the TLS backend cannot be initialised.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client> {
    use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    let client = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10).min(timeout))
        .timeout(timeout)
        .user_agent(format!("catalog-feed/{}", env!("CARGO_PKG_VERSION")))
        .default_headers(headers)
        .build()?;
    Ok(client)
}

/// What: Decode one listing page leniently.
///
/// Inputs:
/// - `body`: Parsed JSON response
/// - `kind`: Kind assumed for records that do not state one
///
/// Output:
/// - Every record of the page in response order; empty when the payload is
///   not an array (bare or under `items`/`data`) or any record is malformed.
///
/// Details:
/// - A malformed page yields zero items, which exhausts the feed rather than
///   failing it.
/// - Repeated records are kept so the loader sees the page's true length.
#[must_use]
pub fn decode_page(body: &Value, kind: ItemKind) -> Vec<CatalogItem> {
    let records = body
        .as_array()
        .or_else(|| body.get("items").and_then(Value::as_array))
        .or_else(|| body.get("data").and_then(Value::as_array));
    let Some(records) = records else {
        warn!(kind = kind.as_config_key(), "catalog page is not an array; treating as empty");
        return Vec::new();
    };
    let with_kind: Vec<Value> = records
        .iter()
        .cloned()
        .map(|mut rec| {
            if let Value::Object(map) = &mut rec {
                map.entry("kind")
                    .or_insert_with(|| Value::String(kind.as_config_key().to_string()));
            }
            rec
        })
        .collect();
    match serde_json::from_value::<Vec<CatalogItem>>(Value::Array(with_kind)) {
        Ok(items) => items,
        Err(e) => {
            warn!(kind = kind.as_config_key(), error = %e, "malformed catalog page; treating as empty");
            Vec::new()
        }
    }
}

/// Page fetcher backed by the catalog HTTP API.
#[derive(Clone)]
pub struct CatalogClient {
    /// Shared HTTP client.
    http: reqwest::Client,
    /// API root, without trailing slash.
    base_url: String,
    /// Listing this client serves.
    key: QueryKey,
    /// Items requested per page.
    page_size: usize,
    /// Page cache shared across clients.
    cache: Arc<PageCache>,
}

impl CatalogClient {
    /// What: Create a fetcher for one query key.
    ///
    /// Inputs:
    /// - `http`: Shared HTTP client
    /// - `base_url`: API root (trailing `/` is ignored)
    /// - `key`: Listing kind and optional category
    /// - `page_size`: Items per page
    /// - `cache`: Shared page cache
    ///
    /// Output:
    /// - `CatalogClient` ready to be handed to a loader.
    #[must_use]
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        key: QueryKey,
        page_size: usize,
        cache: Arc<PageCache>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            key,
            page_size,
            cache,
        }
    }

    /// What: URL of a listing page.
    ///
    /// Inputs:
    /// - `page`: Page index
    ///
    /// Output:
    /// - `{base}/{kind}?page=N&limit=M[&category=C]`
    #[must_use]
    pub fn page_url(&self, page: u32) -> String {
        let mut url = format!(
            "{}/{}?page={page}&limit={}",
            self.base_url,
            self.key.kind.endpoint(),
            self.page_size
        );
        if let Some(category) = self.key.category_id {
            url.push_str(&format!("&category={category}"));
        }
        url
    }
}

/// GET one page and decode it; non-success statuses are errors.
async fn fetch_listing(
    http: reqwest::Client,
    url: String,
    kind: ItemKind,
) -> std::result::Result<Vec<CatalogItem>, FetchError> {
    let resp = http.get(&url).send().await.map_err(|e| {
        warn!(url = %url, error = %e, "catalog request failed");
        e
    })?;
    let status = resp.status();
    if !status.is_success() {
        return Err(format!("HTTP {status} from {url}").into());
    }
    let text = resp.text().await?;
    let items = match serde_json::from_str::<Value>(&text) {
        Ok(body) => decode_page(&body, kind),
        Err(e) => {
            warn!(url = %url, error = %e, "catalog response is not JSON; treating as empty");
            Vec::new()
        }
    };
    info!(url = %url, count = items.len(), "fetched catalog page");
    Ok(items)
}

impl PageFetcher for CatalogClient {
    fn invalidate(&self) {
        self.cache.invalidate(self.key);
        debug!(kind = self.key.kind.as_config_key(), "cached pages dropped");
    }

    fn fetch_page(
        &self,
        page: u32,
    ) -> impl Future<Output = std::result::Result<Vec<CatalogItem>, FetchError>> + Send {
        let http = self.http.clone();
        let url = self.page_url(page);
        let key = self.key;
        let cache = Arc::clone(&self.cache);
        async move {
            cache
                .get_or_fetch((key, page), move || fetch_listing(http, url, key.kind))
                .await
        }
    }
}
