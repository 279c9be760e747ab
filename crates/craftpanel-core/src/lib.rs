//! Core types for craftpanel.
//!
//! This crate provides the data structures shared by the operation engine,
//! the session layer and the terminal UI: normalized remote paths, directory
//! listings, response envelopes, push events and configuration.

mod config;
mod envelope;
mod error;
mod event;
mod listing;
mod path;
mod uptime;

pub use config::{ConfigError, PanelConfig, PanelConfigBuilder};
pub use envelope::{Envelope, ListingBody, MessageBody, StatusBody};
pub use error::{NETWORK_FAILURE_MESSAGE, PanelError, ValidationError};
pub use event::{BackupNotice, LogChannel, PushEvent};
pub use listing::{DirEntry, DirectoryView, ListingRow};
pub use path::{Breadcrumb, ROOT_SENTINEL, RemotePath};
pub use uptime::format_uptime;
