//! Telegram Bot API long-polling transport.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, warn};

use crate::constants::transport::{TELEGRAM_API_BASE, TELEGRAM_POLL_TIMEOUT_SECS};
use crate::error::{TransportError, TransportResult};
use crate::events::{ChannelRef, InboundMessage};

use super::listener::MessageHandler;
use super::transport::{Backoff, MessageTransport};

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<TgMessage>,
    pub channel_post: Option<TgMessage>,
}

#[derive(Debug, Deserialize)]
pub struct TgMessage {
    pub chat: TgChat,
    pub date: i64,
    pub text: Option<String>,
    pub caption: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TgChat {
    pub id: i64,
    pub username: Option<String>,
}

impl Update {
    /// Text-bearing message or channel post, if any.
    pub fn into_inbound(self) -> Option<InboundMessage> {
        let msg = self.channel_post.or(self.message)?;
        let text = msg.text.or(msg.caption).filter(|t| !t.is_empty())?;
        Some(InboundMessage {
            channel: ChannelRef {
                name: msg.chat.username,
                id: Some(msg.chat.id),
            },
            text,
            received_at: DateTime::from_timestamp(msg.date, 0).unwrap_or_else(Utc::now),
        })
    }
}

pub struct TelegramBotTransport {
    client: Client,
    api_base: String,
    poll_timeout_secs: u64,
}

impl TelegramBotTransport {
    pub fn new(bot_token: String) -> TransportResult<Self> {
        Self::with_api_base(TELEGRAM_API_BASE, bot_token)
    }

    pub fn with_api_base(api_base: &str, bot_token: String) -> TransportResult<Self> {
        // HTTP timeout must outlast the long-poll window.
        let client = Client::builder()
            .timeout(Duration::from_secs(TELEGRAM_POLL_TIMEOUT_SECS + 15))
            .build()?;
        Ok(Self {
            client,
            api_base: format!("{}/bot{}", api_base.trim_end_matches('/'), bot_token),
            poll_timeout_secs: TELEGRAM_POLL_TIMEOUT_SECS,
        })
    }

    pub async fn get_updates(&self, offset: Option<i64>) -> TransportResult<Vec<Update>> {
        let mut query = vec![
            ("timeout".to_string(), self.poll_timeout_secs.to_string()),
            (
                "allowed_updates".to_string(),
                r#"["message","channel_post"]"#.to_string(),
            ),
        ];
        if let Some(offset) = offset {
            query.push(("offset".to_string(), offset.to_string()));
        }

        let response = self
            .client
            .get(format!("{}/getUpdates", self.api_base))
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ApiResponse<Vec<Update>> = response.json().await?;
        if !parsed.ok {
            return Err(TransportError::Api(
                parsed.description.unwrap_or_else(|| "getUpdates failed".to_string()),
            ));
        }
        Ok(parsed.result.unwrap_or_default())
    }
}

#[async_trait]
impl MessageTransport for TelegramBotTransport {
    fn name(&self) -> &'static str {
        "telegram_bot"
    }

    async fn run(&self, handler: Arc<dyn MessageHandler>) -> TransportResult<()> {
        info!("🔍 Telegram monitoring started...");
        let mut offset: Option<i64> = None;
        let mut backoff = Backoff::default();

        loop {
            match self.get_updates(offset).await {
                Ok(updates) => {
                    backoff.reset();
                    for update in updates {
                        offset = Some(update.update_id + 1);
                        if let Some(message) = update.into_inbound() {
                            handler.handle(message);
                        }
                    }
                }
                Err(TransportError::Http { status: 401, body }) | Err(TransportError::Http { status: 404, body }) => {
                    return Err(TransportError::Api(format!("bot token rejected: {}", body)));
                }
                Err(e) => {
                    let delay = backoff.next_delay();
                    warn!(
                        attempt = backoff.attempt(),
                        delay_ms = delay.as_millis() as u64,
                        "⚠️ Telegram poll failed: {}",
                        e
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
