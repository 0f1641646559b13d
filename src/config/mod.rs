//! Configuration for catalog-feed: settings file and directory layout.

/// Path resolution for config directories.
mod paths;
/// Settings parsing and access.
mod settings;

pub use paths::{config_dir, logs_dir};
pub use settings::{Settings, load_settings_from, parse_settings, settings};
