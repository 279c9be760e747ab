//! Terminal user interface for craftpanel.
//!
//! The TUI drives a [`craftpanel_session::Controller`] against the panel's
//! HTTP API and renders its state with ratatui.
//!
//! # Views
//!
//! - **Files** - browse the remote tree, cut/paste, rename and upload
//! - **Console** - live server console with command input
//! - **Backup** - live backup log
//!
//! # Usage
//!
//! ```rust,no_run
//! use craftpanel_core::PanelConfig;
//!
//! craftpanel_tui::run(PanelConfig::new("http://localhost:5000")).unwrap();
//! ```
//!
//! # Keyboard Navigation
//!
//! - `j`/`k` - Move down/up
//! - `Enter` - Open directory
//! - `Backspace` - Parent directory
//! - `Space` - Select entry
//! - `x`/`p` - Cut/paste
//! - `Tab` - Switch view
//! - `?` - Help
//! - `q` - Quit

pub mod app;
mod event;
mod theme;
mod ui;

use craftpanel_core::PanelConfig;

pub use app::{App, AppResult};
pub use theme::Theme;

/// Run the TUI application.
pub fn run(config: PanelConfig) -> AppResult<()> {
    let rt = tokio::runtime::Runtime::new()?;

    // The client and controller spawn tasks, so they are built inside the runtime.
    let app = rt.block_on(async { App::new(config) })?;

    let terminal = ratatui::init();
    let result = rt.block_on(app.run(terminal));
    ratatui::restore();

    // Shutdown runtime immediately to cancel background tasks
    rt.shutdown_timeout(std::time::Duration::from_millis(100));

    result
}
