//! Web front-end: JSON task API plus the static pages of the day view.
//!
//! Started with the `--web` CLI option.

mod assets;
mod server;

pub use server::WebServer;
