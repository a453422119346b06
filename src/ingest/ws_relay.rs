//! WebSocket relay transport.
//!
//! Connects to a relay that forwards channel messages as JSON frames:
//! `{"chat": "name" | 123, "chat_id": 123, "text": "...", "date": 1760673000}`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use tracing::{debug, error, info, warn};

use crate::error::{TransportError, TransportResult};
use crate::events::{ChannelRef, InboundMessage};

use super::listener::MessageHandler;
use super::transport::{Backoff, MessageTransport};

#[derive(Debug, Deserialize)]
struct RelayFrame {
    chat: Option<Value>,
    chat_id: Option<i64>,
    text: Option<String>,
    date: Option<i64>,
}

/// Decode one relay frame. Control frames and frames without text yield `None`.
pub fn decode_frame(text: &str) -> TransportResult<Option<InboundMessage>> {
    let frame: RelayFrame = serde_json::from_str(text)?;
    let Some(body) = frame.text.filter(|t| !t.is_empty()) else {
        return Ok(None);
    };

    let mut channel = ChannelRef {
        name: None,
        id: frame.chat_id,
    };
    match frame.chat {
        Some(Value::String(name)) => match name.parse::<i64>() {
            Ok(id) => channel.id = channel.id.or(Some(id)),
            Err(_) => channel.name = Some(name),
        },
        Some(Value::Number(n)) => channel.id = channel.id.or(n.as_i64()),
        _ => {}
    }

    let received_at = frame
        .date
        .and_then(|d| DateTime::from_timestamp(d, 0))
        .unwrap_or_else(Utc::now);

    Ok(Some(InboundMessage {
        channel,
        text: body,
        received_at,
    }))
}

pub struct WsRelayTransport {
    url: String,
    token: Option<String>,
}

impl WsRelayTransport {
    pub fn new(url: String, token: Option<String>) -> Self {
        Self { url, token }
    }

    /// One connection lifetime. Returns when the relay closes the stream.
    async fn session(&self, handler: &Arc<dyn MessageHandler>, backoff: &mut Backoff) -> TransportResult<()> {
        info!("Connecting to relay WebSocket: {}", self.url);
        let (ws_stream, _) = connect_async(self.url.as_str()).await?;
        info!("✓ Relay WebSocket Connected");
        backoff.reset();

        let (mut write, mut read) = ws_stream.split();

        if let Some(token) = &self.token {
            let auth_msg = json!({"action": "auth", "token": token});
            write.send(Message::Text(auth_msg.to_string())).await?;
            info!("✓ Relay Auth Sent");
        }

        while let Some(msg) = read.next().await {
            match msg? {
                Message::Text(text) => match decode_frame(&text) {
                    Ok(Some(message)) => {
                        handler.handle(message);
                    }
                    Ok(None) => debug!("Relay control frame: {}", text),
                    Err(e) => warn!("⚠ Failed to parse relay frame: {}", e),
                },
                Message::Ping(ping) => {
                    write.send(Message::Pong(ping)).await.ok();
                }
                Message::Close(_) => break,
                _ => {}
            }
        }

        Err(TransportError::Closed)
    }
}

#[async_trait]
impl MessageTransport for WsRelayTransport {
    fn name(&self) -> &'static str {
        "ws_relay"
    }

    async fn run(&self, handler: Arc<dyn MessageHandler>) -> TransportResult<()> {
        let mut backoff = Backoff::default();

        loop {
            if let Err(e) = self.session(&handler, &mut backoff).await {
                match e {
                    TransportError::Closed => warn!("⚠ Relay WebSocket Closed"),
                    other => error!("❌ Relay WS Error: {}", other),
                }
            }

            let delay = backoff.next_delay();
            warn!(
                attempt = backoff.attempt(),
                delay_ms = delay.as_millis() as u64,
                "Reconnecting to relay"
            );
            tokio::time::sleep(delay).await;
        }
    }
}
