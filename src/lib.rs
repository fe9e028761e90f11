//! captainlog library
//!
//! A personal time-tracking log: tasks with a start/stop schedule, a
//! project, a description, tags and a comment, stored in SQLite and driven
//! from an interactive CLI, a JSON HTTP API or CSV files.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod text;
pub mod types;
pub mod web;

/// Application name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Application version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Commit the binary was built from, when the build provides it.
pub const GIT_HASH: &str = match option_env!("CAPTAINLOG_GIT_HASH") {
    Some(hash) => hash,
    None => "unknown",
};

/// `Debug` or `Release`.
pub fn build_type() -> &'static str {
    if is_debug_build() { "Debug" } else { "Release" }
}

/// Debug builds read the `-dev` configuration and database.
pub fn is_debug_build() -> bool {
    cfg!(debug_assertions)
}
