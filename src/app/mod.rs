//! catalog-feed application: terminal lifecycle, session state and event loop.

/// Terminal event reader thread.
mod background;
/// Runtime event loop.
mod runtime;
/// Feeds, scroll position and trigger of an interactive session.
pub mod session;
/// Terminal setup and restoration utilities.
mod terminal;

pub use runtime::run;
pub use session::{FetcherFactory, Session, SessionConfig};
