// Public modules
pub mod error;
pub mod patch;
pub mod presets;
pub mod rewrite;
pub mod rules;

// Re-export common types for convenience
pub use error::{Error, ErrorCode, Result};
