//! Core domain logic for ccnotify.
//!
//! This crate contains the fundamental types and logic for:
//! - Hook events: kinds, required-field validation and typed payloads
//! - Task records and their lifecycle status
//! - Duration formatting for completed tasks
//! - Classifying assistant notification messages
//! - Parsing terminal session identifiers

pub mod classify;
pub mod duration;
pub mod event_kind;
pub mod hook;
pub mod task;
pub mod terminal;
mod validate;

pub use classify::{Category, classify};
pub use duration::format_duration;
pub use event_kind::{HookEvent, UnknownHookEvent};
pub use hook::{HookPayload, title_for_cwd};
pub use task::{TaskRecord, TaskStatus};
pub use terminal::TerminalSession;
pub use validate::{ValidationError, validate};
