//! Command-line argument definition and processing.

use clap::Parser;

use crate::config::Settings;
use crate::logic::RankingMode;
use crate::state::{ItemKind, QueryKey};

/// What: Parse a listing kind from the command line.
///
/// Inputs:
/// - `s`: Raw flag value
///
/// Output:
/// - `ItemKind` or a message listing the accepted values.
fn parse_kind(s: &str) -> Result<ItemKind, String> {
    ItemKind::from_config_key(s).ok_or_else(|| {
        format!("unknown kind '{s}' (expected one of: channel, bot, group, news)")
    })
}

/// catalog-feed - Browse ranked catalog listings with infinite scrolling
#[derive(Parser, Debug)]
#[command(name = "catalog-feed")]
#[command(version)]
#[command(about = "Browse ranked catalog listings with infinite scrolling", long_about = None)]
pub struct Args {
    /// Catalog API root (overrides `api_base_url` in settings.conf)
    #[arg(long)]
    pub api_url: Option<String>,

    /// Listing to open: channel, bot, group or news
    #[arg(short, long, value_parser = parse_kind)]
    pub kind: Option<ItemKind>,

    /// Restrict the listing to one category id
    #[arg(short, long)]
    pub category: Option<i64>,

    /// Order by view count instead of promotion tier
    #[arg(long)]
    pub popular: bool,

    /// Items requested per page
    #[arg(long)]
    pub page_size: Option<usize>,

    /// Set the logging level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Enable verbose output (equivalent to --log-level debug)
    #[arg(short, long)]
    pub verbose: bool,

    /// Fetch this many pages, print the ranked feed as JSON and exit
    #[arg(long, value_name = "PAGES")]
    pub dump: Option<u32>,
}

impl Args {
    /// What: Overlay command-line values onto loaded settings.
    ///
    /// Inputs:
    /// - `settings`: Settings read from `settings.conf`
    ///
    /// Details:
    /// - Only flags that were given replace the file values.
    pub fn apply_to(&self, settings: &mut Settings) {
        if let Some(url) = &self.api_url {
            settings.api_base_url.clone_from(url);
        }
        if let Some(kind) = self.kind {
            settings.default_kind = kind;
        }
        if let Some(size) = self.page_size {
            settings.page_size = size;
        }
    }

    /// Ordering policy requested on the command line.
    #[must_use]
    pub const fn ranking(&self) -> RankingMode {
        if self.popular {
            RankingMode::Popularity
        } else {
            RankingMode::Promotion
        }
    }

    /// Initial query: the configured kind plus the optional category.
    #[must_use]
    pub const fn query_key(&self, settings: &Settings) -> QueryKey {
        QueryKey {
            kind: settings.default_kind,
            category_id: self.category,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    /// What: Given flags override settings; absent flags keep file values
    fn apply_to_overrides_only_given_flags() {
        let args = Args::parse_from([
            "catalog-feed",
            "--api-url",
            "https://api.test",
            "--kind",
            "groups",
            "--category",
            "4",
        ]);
        let mut s = Settings {
            page_size: 33,
            ..Settings::default()
        };
        args.apply_to(&mut s);
        assert_eq!(s.api_base_url, "https://api.test");
        assert_eq!(s.default_kind, ItemKind::Group);
        assert_eq!(s.page_size, 33);
        assert_eq!(
            args.query_key(&s),
            QueryKey {
                kind: ItemKind::Group,
                category_id: Some(4)
            }
        );
        assert_eq!(args.ranking(), RankingMode::Promotion);
    }

    #[test]
    /// What: `--popular` selects the popularity policy and `--dump` takes a page count
    fn popular_and_dump_flags() {
        let args = Args::parse_from(["catalog-feed", "--popular", "--dump", "3"]);
        assert_eq!(args.ranking(), RankingMode::Popularity);
        assert_eq!(args.dump, Some(3));
    }

    #[test]
    /// What: Unknown kinds are rejected by the parser
    fn unknown_kind_rejected() {
        assert!(Args::try_parse_from(["catalog-feed", "--kind", "stickers"]).is_err());
    }
}
