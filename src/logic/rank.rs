use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::state::CatalogItem;

/// Ordering policy applied to a feed before it is windowed.
///
/// The two policies never compose: the popular listing ignores promotion tiers
/// and every other listing ignores view counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RankingMode {
    /// Ultra-top, then top, then recency.
    #[default]
    Promotion,
    /// View count, then recency.
    Popularity,
}

impl RankingMode {
    /// What: Produce a new ranked copy of `items` under this policy.
    ///
    /// Inputs:
    /// - `items`: Accumulated feed in arrival order
    ///
    /// Output:
    /// - Ranked `Vec<CatalogItem>`; `items` is left untouched.
    #[must_use]
    pub fn apply(self, items: &[CatalogItem]) -> Vec<CatalogItem> {
        match self {
            Self::Promotion => rank(items),
            Self::Popularity => rank_by_popularity(items),
        }
    }

    /// Comparator of this policy.
    #[must_use]
    pub fn compare(self, a: &CatalogItem, b: &CatalogItem) -> Ordering {
        match self {
            Self::Promotion => compare_promotion(a, b),
            Self::Popularity => compare_popularity(a, b),
        }
    }

    /// What: Stable-sort borrowed items in place under this policy.
    ///
    /// Inputs:
    /// - `items`: References into the accumulated feed
    ///
    /// Details:
    /// - Lets a renderer rank without cloning records it will not draw.
    pub fn sort_refs(self, items: &mut [&CatalogItem]) {
        items.sort_by(|a, b| self.compare(a, b));
    }

    /// Toggle between the two policies.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Promotion => Self::Popularity,
            Self::Popularity => Self::Promotion,
        }
    }
}

/// Missing promotion timestamps rank as the lowest possible value.
fn ts_or_epoch(ts: Option<DateTime<Utc>>) -> DateTime<Utc> {
    ts.unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// What: Compare two items under the promotion policy.
///
/// Inputs:
/// - `a`, `b`: Items to compare
///
/// Output:
/// - `Ordering::Less` when `a` should be shown before `b`.
///
/// Details:
/// - Ultra-top before non-ultra-top; among ultra-top, later expiry first.
/// - Then top before non-top; among top, later promotion time first.
/// - Everything else falls back to newest `created_at` first.
/// - Items equal under all rules compare `Equal` so a stable sort keeps arrival order.
#[must_use]
pub fn compare_promotion(a: &CatalogItem, b: &CatalogItem) -> Ordering {
    b.is_ultra_top
        .cmp(&a.is_ultra_top)
        .then_with(|| {
            if a.is_ultra_top && b.is_ultra_top {
                ts_or_epoch(b.ultra_top_expires_at).cmp(&ts_or_epoch(a.ultra_top_expires_at))
            } else {
                Ordering::Equal
            }
        })
        .then_with(|| b.is_top.cmp(&a.is_top))
        .then_with(|| {
            if a.is_top && b.is_top {
                ts_or_epoch(b.top_promoted_at).cmp(&ts_or_epoch(a.top_promoted_at))
            } else {
                Ordering::Equal
            }
        })
        .then_with(|| b.created_at.cmp(&a.created_at))
}

/// What: Rank catalog items by promotion tier and recency.
///
/// Inputs:
/// - `items`: Items in any order; duplicates are kept as-is
///
/// Output:
/// - New vector ordered by [`compare_promotion`]; ties keep their input order.
#[must_use]
pub fn rank(items: &[CatalogItem]) -> Vec<CatalogItem> {
    let mut out = items.to_vec();
    out.sort_by(compare_promotion);
    out
}

/// Popular listing order: more views first (absent counts as zero), then newest.
#[must_use]
pub fn compare_popularity(a: &CatalogItem, b: &CatalogItem) -> Ordering {
    b.view_count
        .unwrap_or(0)
        .cmp(&a.view_count.unwrap_or(0))
        .then_with(|| b.created_at.cmp(&a.created_at))
}

/// What: Rank catalog items for the popular listing.
///
/// Inputs:
/// - `items`: Items in any order
///
/// Output:
/// - New vector ordered by `view_count` descending (absent counts as zero), then
///   newest `created_at` first.
#[must_use]
pub fn rank_by_popularity(items: &[CatalogItem]) -> Vec<CatalogItem> {
    let mut out = items.to_vec();
    out.sort_by(compare_popularity);
    out
}
