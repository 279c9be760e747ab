//! Decoding of the panel's Socket.IO frames (Engine.IO v4 over websocket).
//!
//! Only the text subset the panel emits is handled: open, ping, close and
//! messages carrying Socket.IO connect, disconnect and event packets.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use craftpanel_core::{BackupNotice, LogChannel, PushEvent};

/// Frame sent to join the default namespace once the transport is open.
pub const CONNECT_FRAME: &str = "40";

/// Frame answering a server ping.
pub const PONG_FRAME: &str = "3";

/// Errors decoding a frame.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("Empty frame")]
    Empty,

    #[error("Unknown packet type {0:?}")]
    UnknownPacket(char),

    #[error("Malformed payload: {0}")]
    Malformed(String),
}

/// Handshake data from the Engine.IO open packet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenInfo {
    pub sid: String,
    #[serde(default)]
    pub ping_interval: u64,
    #[serde(default)]
    pub ping_timeout: u64,
}

/// An Engine.IO packet.
#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    Open(OpenInfo),
    Close,
    Ping,
    Pong,
    Message(SocketPacket),
    Noop,
}

/// A Socket.IO packet carried in an Engine.IO message.
#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect,
    Disconnect,
    Event { name: String, payload: Value },
    ConnectError(String),
    /// Acks and binary packets, which the panel does not use.
    Unsupported(char),
}

/// Decode one websocket text frame.
pub fn decode_frame(text: &str) -> Result<EnginePacket, CodecError> {
    let mut chars = text.chars();
    let kind = chars.next().ok_or(CodecError::Empty)?;
    let rest = chars.as_str();

    match kind {
        '0' => serde_json::from_str(rest)
            .map(EnginePacket::Open)
            .map_err(|e| CodecError::Malformed(e.to_string())),
        '1' => Ok(EnginePacket::Close),
        '2' => Ok(EnginePacket::Ping),
        '3' => Ok(EnginePacket::Pong),
        '4' => decode_socket_packet(rest).map(EnginePacket::Message),
        '6' => Ok(EnginePacket::Noop),
        other => Err(CodecError::UnknownPacket(other)),
    }
}

fn decode_socket_packet(text: &str) -> Result<SocketPacket, CodecError> {
    let mut chars = text.chars();
    let kind = chars.next().ok_or(CodecError::Empty)?;
    let body = skip_namespace(chars.as_str());

    match kind {
        '0' => Ok(SocketPacket::Connect),
        '1' => Ok(SocketPacket::Disconnect),
        '2' => {
            // Optional ack id precedes the JSON array.
            let json = body.trim_start_matches(|c: char| c.is_ascii_digit());
            let value: Value =
                serde_json::from_str(json).map_err(|e| CodecError::Malformed(e.to_string()))?;
            let mut items = match value {
                Value::Array(items) if !items.is_empty() => items.into_iter(),
                _ => return Err(CodecError::Malformed("event is not a non-empty array".into())),
            };
            let name = match items.next() {
                Some(Value::String(name)) => name,
                _ => return Err(CodecError::Malformed("event name is not a string".into())),
            };
            Ok(SocketPacket::Event {
                name,
                payload: items.next().unwrap_or(Value::Null),
            })
        }
        '4' => Ok(SocketPacket::ConnectError(body.to_string())),
        other => Ok(SocketPacket::Unsupported(other)),
    }
}

/// Strip a `/namespace,` prefix if present.
fn skip_namespace(text: &str) -> &str {
    if text.starts_with('/') {
        text.split_once(',').map(|(_, rest)| rest).unwrap_or("")
    } else {
        text
    }
}

/// Map a Socket.IO event onto a typed push event.
///
/// Returns `None` for events the client does not consume.
pub fn event_to_push(name: &str, payload: &Value) -> Option<PushEvent> {
    let event = match name {
        "console_history" => PushEvent::History {
            channel: LogChannel::Console,
            text: text_payload(payload)?,
        },
        "backup_history" => PushEvent::History {
            channel: LogChannel::Backup,
            text: text_payload(payload)?,
        },
        "console_output" => PushEvent::Output {
            channel: LogChannel::Console,
            text: text_payload(payload)?,
        },
        "backup_output" => PushEvent::Output {
            channel: LogChannel::Backup,
            text: text_payload(payload)?,
        },
        "backup_status" => PushEvent::BackupStatus(backup_notice(payload)),
        "uptime" => PushEvent::Uptime(uptime_payload(payload)?),
        other => {
            debug!(event = other, "ignoring push event");
            return None;
        }
    };
    Some(event)
}

fn text_payload(payload: &Value) -> Option<String> {
    match payload {
        Value::String(text) => Some(text.clone()),
        Value::Object(map) => map.get("data").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

fn backup_notice(payload: &Value) -> BackupNotice {
    match payload {
        Value::String(message) => BackupNotice {
            status: None,
            message: Some(message.clone()),
        },
        Value::Object(_) => serde_json::from_value(payload.clone()).unwrap_or_default(),
        _ => BackupNotice::default(),
    }
}

fn uptime_payload(payload: &Value) -> Option<u64> {
    let value = match payload {
        Value::Object(map) => map.get("uptime").or_else(|| map.get("data"))?,
        other => other,
    };
    match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f.max(0.0) as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_open() {
        let frame = r#"0{"sid":"abc","upgrades":[],"pingInterval":25000,"pingTimeout":20000}"#;
        match decode_frame(frame).unwrap() {
            EnginePacket::Open(info) => {
                assert_eq!(info.sid, "abc");
                assert_eq!(info.ping_interval, 25000);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_decode_ping_and_connect() {
        assert_eq!(decode_frame("2").unwrap(), EnginePacket::Ping);
        assert_eq!(
            decode_frame(r#"40{"sid":"xyz"}"#).unwrap(),
            EnginePacket::Message(SocketPacket::Connect)
        );
    }

    #[test]
    fn test_decode_event() {
        let frame = r#"42["console_output",{"data":"[12:00:00] Done (3.2s)!\n"}]"#;
        let EnginePacket::Message(SocketPacket::Event { name, payload }) = decode_frame(frame).unwrap()
        else {
            panic!("expected event");
        };
        assert_eq!(name, "console_output");
        assert_eq!(
            event_to_push(&name, &payload),
            Some(PushEvent::Output {
                channel: LogChannel::Console,
                text: "[12:00:00] Done (3.2s)!\n".into()
            })
        );
    }

    #[test]
    fn test_decode_event_with_namespace_and_ack_id() {
        let frame = r#"42/panel,7["uptime",42]"#;
        let EnginePacket::Message(SocketPacket::Event { name, payload }) = decode_frame(frame).unwrap()
        else {
            panic!("expected event");
        };
        assert_eq!(event_to_push(&name, &payload), Some(PushEvent::Uptime(42)));
    }

    #[test]
    fn test_uptime_payload_shapes() {
        assert_eq!(uptime_payload(&json!({"uptime": 90061})), Some(90061));
        assert_eq!(uptime_payload(&json!({"data": "15"})), Some(15));
        assert_eq!(uptime_payload(&json!(12.7)), Some(12));
        assert_eq!(uptime_payload(&json!(null)), None);
    }

    #[test]
    fn test_backup_status_shapes() {
        let event = event_to_push("backup_status", &json!({"status": "complete"})).unwrap();
        assert_eq!(
            event,
            PushEvent::BackupStatus(BackupNotice {
                status: Some("complete".into()),
                message: None
            })
        );
        assert!(matches!(
            event_to_push("backup_status", &json!(null)),
            Some(PushEvent::BackupStatus(_))
        ));
    }

    #[test]
    fn test_unknown_event_ignored() {
        assert_eq!(event_to_push("player_join", &json!({})), None);
    }

    #[test]
    fn test_malformed_frames() {
        assert_eq!(decode_frame(""), Err(CodecError::Empty));
        assert_eq!(decode_frame("9"), Err(CodecError::UnknownPacket('9')));
        assert!(matches!(decode_frame("42{}"), Err(CodecError::Malformed(_))));
    }
}
