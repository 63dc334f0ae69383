//! Project configuration.
//!
//! - [`loader`]: reads `.curriculum-kit/` from disk
//! - [`models`]: the combined `AppConfig`
//! - [`error`]: `ConfigError`

pub mod error;
pub mod loader;
pub mod models;

/// Name of the per-project configuration directory.
pub const CONFIG_DIR: &str = ".curriculum-kit";
