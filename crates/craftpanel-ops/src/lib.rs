//! Remote operations engine for craftpanel.
//!
//! This crate talks to the panel: plain requests, batched moves with
//! per-item progress, streamed uploads with byte-level progress, and the
//! push channel that carries console and backup output.

mod api;
mod http;
mod move_op;
mod progress;
pub mod push;
mod rename;
mod upload;

pub use api::{PanelApi, UploadFile, total_size};
pub use http::HttpPanelClient;
pub use move_op::{MoveResult, move_batch, start_move};
pub use progress::{
    OperationComplete, OperationError, OperationProgress, TransferMeter, TransferProgress,
};
pub use push::{push_url, spawn_push_listener};
pub use rename::{prepare_rename, rename, validate_filename};
pub use upload::{UploadResult, start_upload};

/// Default channel buffer size for operation progress updates.
pub const OPERATION_CHANNEL_SIZE: usize = 100;
