use std::fs;
use std::path::Path;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::paths::resolve_settings_config_path;
use crate::feed::{FeedOptions, LoaderConfig, TriggerConfig};
use crate::logic::{RankingMode, ViewportWindow};
use crate::state::ItemKind;

/// User-configurable application settings parsed from `settings.conf`.
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    /// Root of the catalog HTTP API.
    pub api_base_url: String,
    /// Items requested per page.
    pub page_size: usize,
    /// First page index of every feed.
    pub initial_page: u32,
    /// Height of one list row, in terminal rows.
    pub item_height: u16,
    /// Extra rows rendered beyond each viewport edge.
    pub overscan: usize,
    /// Remaining rows below the viewport that trigger the next page.
    pub load_threshold: f64,
    /// Quiet period after scrolling before the trigger is evaluated.
    pub debounce_ms: u64,
    /// Coalescing interval for scroll events.
    pub frame_ms: u64,
    /// Feeds at least this long are windowed.
    pub virtualize_min_items: usize,
    /// Listing shown at startup.
    pub default_kind: ItemKind,
    /// Whole-request HTTP timeout.
    pub request_timeout_secs: u64,
    /// Pages kept in the in-memory cache.
    pub cache_capacity: usize,
    /// Age after which cached pages are refetched.
    pub cache_ttl_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080/api".to_string(),
            page_size: 20,
            initial_page: 1,
            item_height: 3,
            overscan: 2,
            load_threshold: 30.0,
            debounce_ms: 100,
            frame_ms: 16,
            virtualize_min_items: 50,
            default_kind: ItemKind::Channel,
            request_timeout_secs: 15,
            cache_capacity: 64,
            cache_ttl_secs: 60,
        }
    }
}

impl Settings {
    /// Loader parameters derived from these settings.
    #[must_use]
    pub const fn loader_config(&self) -> LoaderConfig {
        LoaderConfig {
            page_size: self.page_size,
            initial_page: self.initial_page,
        }
    }

    /// Feed view options derived from these settings.
    #[must_use]
    pub fn feed_options(&self, ranking: RankingMode) -> FeedOptions {
        FeedOptions {
            window: ViewportWindow::new(f64::from(self.item_height), self.overscan),
            virtualize_min_items: self.virtualize_min_items,
            ranking,
        }
    }

    /// Scroll trigger parameters derived from these settings.
    #[must_use]
    pub const fn trigger_config(&self) -> TriggerConfig {
        TriggerConfig {
            threshold: self.load_threshold,
            frame: Duration::from_millis(self.frame_ms),
            debounce: Duration::from_millis(self.debounce_ms),
        }
    }
}

/// What: Remove an inline comment from a configuration value.
///
/// Inputs:
/// - `s`: Raw value text
///
/// Output:
/// - Trimmed value with any trailing `#` or `//` comment removed.
///
/// Details:
/// - `//` is only treated as a comment when not part of a URL scheme (`://`).
fn strip_inline_comment(s: &str) -> &str {
    let mut end = s.len();
    if let Some(i) = s.find('#') {
        end = end.min(i);
    }
    let mut search_from = 0;
    while let Some(rel) = s[search_from..].find("//") {
        let i = search_from + rel;
        if i > 0 && s.as_bytes()[i - 1] == b':' {
            search_from = i + 2;
            continue;
        }
        end = end.min(i);
        break;
    }
    s[..end].trim()
}

/// Parse an unsigned integer setting, keeping the current value on failure.
fn parse_into<T: std::str::FromStr>(key: &str, val: &str, slot: &mut T) {
    match val.parse::<T>() {
        Ok(v) => *slot = v,
        Err(_) => warn!(key, value = val, "ignoring unparsable setting"),
    }
}

/// What: Apply settings from `settings.conf` content onto `settings`.
///
/// Inputs:
/// - `content`: File content
/// - `settings`: Settings to update in place
///
/// Details:
/// - Skips blank lines and lines starting with `#`, `//` or `;`.
/// - Keys are lowercased and `.`, `-` and spaces become `_`.
/// - Unknown keys and unparsable values are ignored.
pub fn parse_settings(content: &str, settings: &mut Settings) {
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty()
            || trimmed.starts_with('#')
            || trimmed.starts_with("//")
            || trimmed.starts_with(';')
        {
            continue;
        }
        let Some((raw_key, raw_val)) = trimmed.split_once('=') else {
            continue;
        };
        let key = raw_key.trim().to_lowercase().replace(['.', '-', ' '], "_");
        let val = strip_inline_comment(raw_val.trim());
        match key.as_str() {
            "api_base_url" | "api_url" => {
                if !val.is_empty() {
                    settings.api_base_url = val.to_string();
                }
            }
            "page_size" => parse_into(&key, val, &mut settings.page_size),
            "initial_page" => parse_into(&key, val, &mut settings.initial_page),
            "item_height" => parse_into(&key, val, &mut settings.item_height),
            "overscan" => parse_into(&key, val, &mut settings.overscan),
            "load_threshold" => parse_into(&key, val, &mut settings.load_threshold),
            "debounce_ms" => parse_into(&key, val, &mut settings.debounce_ms),
            "frame_ms" => parse_into(&key, val, &mut settings.frame_ms),
            "virtualize_min_items" => parse_into(&key, val, &mut settings.virtualize_min_items),
            "default_kind" | "kind" => {
                if let Some(kind) = ItemKind::from_config_key(val) {
                    settings.default_kind = kind;
                } else {
                    warn!(value = val, "unknown default_kind");
                }
            }
            "request_timeout_secs" => parse_into(&key, val, &mut settings.request_timeout_secs),
            "cache_capacity" => parse_into(&key, val, &mut settings.cache_capacity),
            "cache_ttl_secs" => parse_into(&key, val, &mut settings.cache_ttl_secs),
            _ => debug!(key = %key, "ignoring unknown setting"),
        }
    }
}

/// What: Load settings from a specific file.
///
/// Inputs:
/// - `path`: Settings file
///
/// Output:
/// - Parsed settings, or defaults when the file cannot be read.
#[must_use]
pub fn load_settings_from(path: &Path) -> Settings {
    let mut settings = Settings::default();
    match fs::read_to_string(path) {
        Ok(content) => {
            parse_settings(&content, &mut settings);
            debug!(path = %path.display(), "loaded settings");
        }
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %path.display(), error = %e, "failed to read settings file");
            }
        }
    }
    settings
}

/// What: Load user settings from the config directory.
///
/// Output:
/// - Settings from `settings.conf` if found; otherwise defaults.
#[must_use]
pub fn settings() -> Settings {
    resolve_settings_config_path().map_or_else(Settings::default, |p| load_settings_from(&p))
}
