//! Pure, synchronous feed logic: ranking, windowing and identity handling.

pub mod dedupe;
pub mod rank;
pub mod viewport;

pub use dedupe::unique_by_identity;
pub use rank::{RankingMode, compare_popularity, compare_promotion, rank, rank_by_popularity};
pub use viewport::{ViewportRange, ViewportWindow, compute_range};
