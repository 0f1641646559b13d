//! Core value types shared by the feed pipeline.

use chrono::{DateTime, Utc};

/// Kind of catalog listing.
///
/// Ids are unique only within a kind, so identity checks across a mixed feed
/// must compare `(kind, id)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// Broadcast channel.
    #[default]
    Channel,
    /// Bot account.
    Bot,
    /// Group chat.
    Group,
    /// News post.
    News,
}

impl ItemKind {
    /// All kinds in tab order.
    pub const ALL: [Self; 4] = [Self::Channel, Self::Bot, Self::Group, Self::News];

    /// Return the string key used in settings and on the command line.
    #[must_use]
    pub const fn as_config_key(self) -> &'static str {
        match self {
            Self::Channel => "channel",
            Self::Bot => "bot",
            Self::Group => "group",
            Self::News => "news",
        }
    }

    /// Parse a kind from its config key, accepting plural and capitalised forms.
    #[must_use]
    pub fn from_config_key(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "channel" | "channels" => Some(Self::Channel),
            "bot" | "bots" => Some(Self::Bot),
            "group" | "groups" => Some(Self::Group),
            "news" => Some(Self::News),
            _ => None,
        }
    }

    /// Path segment of the listing endpoint for this kind.
    #[must_use]
    pub const fn endpoint(self) -> &'static str {
        match self {
            Self::Channel => "channels",
            Self::Bot => "bots",
            Self::Group => "groups",
            Self::News => "news",
        }
    }

    /// Next kind in tab order, wrapping around.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Channel => Self::Bot,
            Self::Bot => Self::Group,
            Self::Group => Self::News,
            Self::News => Self::Channel,
        }
    }
}

/// One listing entity shown in a feed.
///
/// Promotion flags are independent: an item may be ultra-top, top, both or
/// neither. A promoted item without its timestamp ranks as if the timestamp
/// were the Unix epoch.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    /// Identifier, unique within `kind`.
    pub id: i64,
    /// Listing kind.
    pub kind: ItemKind,
    /// Holds the ultra-top promotion tier.
    #[serde(default)]
    pub is_ultra_top: bool,
    /// When the ultra-top promotion expires.
    #[serde(default)]
    pub ultra_top_expires_at: Option<DateTime<Utc>>,
    /// Holds the top promotion tier.
    #[serde(default)]
    pub is_top: bool,
    /// When the top promotion was granted.
    #[serde(default)]
    pub top_promoted_at: Option<DateTime<Utc>>,
    /// Creation time of the listing.
    pub created_at: DateTime<Utc>,
    /// Display title.
    #[serde(default)]
    pub title: String,
    /// Public handle (e.g. `@name`), if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Short description for list rows.
    #[serde(default)]
    pub description: String,
    /// Category the listing belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    /// View counter used by the popularity listing.
    #[serde(default, alias = "views", skip_serializing_if = "Option::is_none")]
    pub view_count: Option<u64>,
}

impl CatalogItem {
    /// What: Build a bare item with no promotion and no display text.
    ///
    /// Inputs:
    /// - `id`: Identifier within `kind`
    /// - `kind`: Listing kind
    /// - `created_at`: Creation timestamp
    ///
    /// Output:
    /// - `CatalogItem` with every optional field empty.
    #[must_use]
    pub fn new(id: i64, kind: ItemKind, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            kind,
            is_ultra_top: false,
            ultra_top_expires_at: None,
            is_top: false,
            top_promoted_at: None,
            created_at,
            title: String::new(),
            username: None,
            description: String::new(),
            category_id: None,
            view_count: None,
        }
    }

    /// Identity key used for deduplication across pages and mixed feeds.
    #[must_use]
    pub const fn identity(&self) -> (ItemKind, i64) {
        (self.kind, self.id)
    }
}

/// Filter a feed is loaded for. Each distinct key owns its own loader.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct QueryKey {
    /// Listing kind.
    pub kind: ItemKind,
    /// Optional category restriction.
    pub category_id: Option<i64>,
}

impl QueryKey {
    /// Key for an unfiltered listing of `kind`.
    #[must_use]
    pub const fn kind(kind: ItemKind) -> Self {
        Self {
            kind,
            category_id: None,
        }
    }
}

/// Accumulated pagination state owned by one loader.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedState {
    /// Items in arrival order across pages (not ranked, not deduplicated).
    pub items: Vec<CatalogItem>,
    /// Next page index to request.
    pub page: u32,
    /// True only while a fetch is outstanding.
    pub is_loading: bool,
    /// False once a page came back short or empty.
    pub has_more: bool,
    /// Message of the last failed fetch.
    pub error: Option<String>,
}

impl FeedState {
    /// Fresh state starting at `initial_page`.
    #[must_use]
    pub const fn new(initial_page: u32) -> Self {
        Self {
            items: Vec::new(),
            page: initial_page,
            is_loading: false,
            has_more: true,
            error: None,
        }
    }

    /// What: Derive the loader phase from the stored flags.
    ///
    /// Output:
    /// - `Loading` while a fetch is in flight, then `Exhausted`, `Errored`, `Idle`
    ///   in that order of precedence.
    #[must_use]
    pub const fn phase(&self) -> LoaderPhase {
        if self.is_loading {
            LoaderPhase::Loading
        } else if !self.has_more {
            LoaderPhase::Exhausted
        } else if self.error.is_some() {
            LoaderPhase::Errored
        } else {
            LoaderPhase::Idle
        }
    }
}

/// Observable state of an incremental loader.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoaderPhase {
    /// No fetch in flight and more pages may exist.
    Idle,
    /// A page fetch is outstanding.
    Loading,
    /// No further pages exist for the current query.
    Exhausted,
    /// The last fetch failed; retry is permitted.
    Errored,
}

/// Scroll position of the consuming view, in the same unit as item heights.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollMetrics {
    /// Distance scrolled from the top of the document.
    pub scroll_offset: f64,
    /// Height of the visible container.
    pub viewport_height: f64,
    /// Full scrollable height of the document.
    pub document_height: f64,
}

impl ScrollMetrics {
    /// Remaining distance between the bottom of the viewport and the bottom of
    /// the document, never negative.
    #[must_use]
    pub fn distance_to_bottom(&self) -> f64 {
        (self.document_height - self.scroll_offset - self.viewport_height).max(0.0)
    }
}
