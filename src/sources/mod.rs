//! Network data retrieval: the catalog HTTP fetcher and its page cache.

pub mod cache;
pub mod catalog;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub use cache::{PageCache, PageKey};
pub use catalog::{CatalogClient, build_http_client, decode_page};
