//! Ranked feed runtime: incremental loading, scroll triggering and assembly.

pub mod assembly;
pub mod loader;
pub mod notify;
pub mod trigger;

pub use assembly::{FeedFrame, FeedOptions, FeedView};
pub use loader::{FetchError, FnFetcher, IncrementalLoader, LoadOutcome, LoaderConfig, PageFetcher};
pub use notify::{ChannelNotifier, Notice, NoticeLevel, Notifier, SharedNotifier, TracingNotifier};
pub use trigger::{ScrollTrigger, TriggerConfig, should_load};
