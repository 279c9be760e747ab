//! Websocket listener feeding decoded push events into a channel.

use futures::{SinkExt, StreamExt};
use reqwest::Url;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use craftpanel_core::{PanelConfig, PanelError, PushEvent};

use super::codec::{
    CONNECT_FRAME, EnginePacket, PONG_FRAME, SocketPacket, decode_frame, event_to_push,
};

/// Build the websocket URL for the panel's push channel.
pub fn push_url(config: &PanelConfig) -> Result<Url, PanelError> {
    let mut url = Url::parse(&config.base_url)
        .map_err(|e| PanelError::network(format!("Invalid base URL {}: {e}", config.base_url)))?;

    let scheme = match url.scheme() {
        "https" => "wss",
        _ => "ws",
    };
    url.set_scheme(scheme)
        .map_err(|()| PanelError::network(format!("Cannot derive websocket URL from {url}")))?;

    let base_path = url.path().trim_end_matches('/').to_string();
    let socket_path = config.socket_path.trim_matches('/');
    url.set_path(&format!("{base_path}/{socket_path}/"));
    url.set_query(Some("EIO=4&transport=websocket"));
    Ok(url)
}

/// Spawn a listener task.
///
/// The task emits [`PushEvent::Connected`] once the namespace is joined and
/// always finishes with exactly one [`PushEvent::Disconnected`]. It does not
/// reconnect on its own.
pub fn spawn_push_listener(
    url: Url,
    tx: mpsc::Sender<PushEvent>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let reason = match listen(&url, &tx, &cancel).await {
            Ok(reason) => reason,
            Err(err) => {
                warn!(%url, error = %err, "push channel failed");
                Some(err.to_string())
            }
        };
        info!(%url, reason = reason.as_deref().unwrap_or("closed"), "push channel closed");
        let _ = tx.send(PushEvent::Disconnected { reason }).await;
    })
}

async fn listen(
    url: &Url,
    tx: &mpsc::Sender<PushEvent>,
    cancel: &CancellationToken,
) -> Result<Option<String>, PanelError> {
    let (stream, _) = connect_async(url.as_str())
        .await
        .map_err(|e| PanelError::network(e.to_string()))?;
    debug!(%url, "websocket open");
    let (mut sink, mut source) = stream.split();

    loop {
        let message = tokio::select! {
            () = cancel.cancelled() => {
                let _ = sink.close().await;
                return Ok(Some("cancelled".into()));
            }
            message = source.next() => message,
        };

        let text = match message {
            None => return Ok(None),
            Some(Err(e)) => return Err(PanelError::network(e.to_string())),
            Some(Ok(Message::Text(text))) => text,
            Some(Ok(Message::Close(frame))) => {
                return Ok(frame.map(|f| f.reason.to_string()).filter(|r| !r.is_empty()));
            }
            Some(Ok(_)) => continue,
        };

        let packet = match decode_frame(&text) {
            Ok(packet) => packet,
            Err(err) => {
                debug!(error = %err, frame = %text, "skipping frame");
                continue;
            }
        };

        match packet {
            EnginePacket::Open(info) => {
                debug!(sid = %info.sid, "engine open");
                send_frame(&mut sink, CONNECT_FRAME).await?;
            }
            EnginePacket::Ping => send_frame(&mut sink, PONG_FRAME).await?,
            EnginePacket::Close => return Ok(Some("server closed the transport".into())),
            EnginePacket::Message(SocketPacket::Connect) => {
                if tx.send(PushEvent::Connected).await.is_err() {
                    return Ok(None);
                }
            }
            EnginePacket::Message(SocketPacket::Disconnect) => {
                return Ok(Some("server disconnected".into()));
            }
            EnginePacket::Message(SocketPacket::ConnectError(detail)) => {
                return Err(PanelError::network(format!("connect refused: {detail}")));
            }
            EnginePacket::Message(SocketPacket::Event { name, payload }) => {
                trace!(event = %name, "push event");
                if let Some(event) = event_to_push(&name, &payload)
                    && tx.send(event).await.is_err()
                {
                    return Ok(None);
                }
            }
            EnginePacket::Message(SocketPacket::Unsupported(_))
            | EnginePacket::Pong
            | EnginePacket::Noop => {}
        }
    }
}

async fn send_frame<S>(sink: &mut S, frame: &str) -> Result<(), PanelError>
where
    S: SinkExt<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    sink.send(Message::Text(frame.to_string()))
        .await
        .map_err(|e| PanelError::network(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str) -> PanelConfig {
        PanelConfig::new(url)
    }

    #[test]
    fn test_push_url_http() {
        let url = push_url(&config("http://mc.local:5000")).unwrap();
        assert_eq!(
            url.as_str(),
            "ws://mc.local:5000/socket.io/?EIO=4&transport=websocket"
        );
    }

    #[test]
    fn test_push_url_https_with_prefix() {
        let url = push_url(&config("https://mc.example.org/panel/")).unwrap();
        assert_eq!(
            url.as_str(),
            "wss://mc.example.org/panel/socket.io/?EIO=4&transport=websocket"
        );
    }
}
