//! Operator session for craftpanel.
//!
//! [`Session`] holds every piece of client state (current directory,
//! selection, clipboard, upload job, log buffers, lifecycle controls) and
//! exposes pure transitions. [`Controller`] runs the remote calls those
//! transitions ask for and feeds the results back in arrival order.

mod browser;
mod clipboard;
mod controller;
mod lifecycle;
mod notice;
mod reconciler;
mod selection;
mod session;
mod upload;

pub use browser::{Browser, NavOutcome};
pub use clipboard::{ClipboardMode, ClipboardState};
pub use controller::{Controller, Inbound};
pub use lifecycle::{ControlIntent, Lifecycle};
pub use notice::{Notice, NoticeLevel};
pub use reconciler::{LinkState, LogStream, Reconciler};
pub use selection::Selection;
pub use session::{Effect, Session, SessionEvent};
pub use upload::{UploadJob, UploadPipeline};
