//! The panel's push channel (Socket.IO over websocket).

pub mod codec;
mod listener;

pub use codec::{CodecError, EnginePacket, SocketPacket, decode_frame, event_to_push};
pub use listener::{push_url, spawn_push_listener};
