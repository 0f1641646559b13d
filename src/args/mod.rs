//! Command-line argument parsing and handling.

pub mod definition;
pub mod dump;
pub mod utils;

// Re-export commonly used items
pub use definition::Args;
pub use dump::handle_dump;
pub use utils::determine_log_level;
