//! Shared state and value types for catalog feeds.

pub mod types;

pub use types::{CatalogItem, FeedState, ItemKind, LoaderPhase, QueryKey, ScrollMetrics};
