//! Application constants.

/// Event loop tick interval in milliseconds.
pub const TICK_INTERVAL_MS: u64 = 50;

/// Lines scrolled per keypress in the log views.
pub const LOG_SCROLL_STEP: usize = 3;
