//! ccnotify library.
//!
//! This crate provides the hook entry point and the notification machinery
//! behind the `ccnotify` binary.

pub mod app;
mod cli;
mod config;
pub mod focus;
pub mod logging;
pub mod mechanism;
pub mod notify;
pub mod router;

pub use cli::Cli;
pub use config::Config;
