use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use crate::config::{TransportConfig, TransportKind};
use crate::constants::transport::{
    RECONNECT_BASE_DELAY_MS, RECONNECT_MAX_DELAY_MS, RECONNECT_MAX_JITTER_MS,
};
use crate::error::{TransportError, TransportResult};

use super::listener::MessageHandler;
use super::telegram::TelegramBotTransport;
use super::ws_relay::WsRelayTransport;

/// Source of inbound channel messages.
///
/// `run` owns its own reconnect policy and only returns on an
/// unrecoverable error.
#[async_trait]
pub trait MessageTransport: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self, handler: Arc<dyn MessageHandler>) -> TransportResult<()>;
}

/// `None` when no transport is configured (manual submissions only).
pub fn build_transport(config: &TransportConfig) -> TransportResult<Option<Arc<dyn MessageTransport>>> {
    match config.kind {
        TransportKind::TelegramBot => {
            let token = config
                .bot_token
                .clone()
                .ok_or_else(|| TransportError::Config("telegram_bot transport needs bot_token".to_string()))?;
            Ok(Some(Arc::new(TelegramBotTransport::new(token)?)))
        }
        TransportKind::WsRelay => {
            let url = config
                .relay_url
                .clone()
                .ok_or_else(|| TransportError::Config("ws_relay transport needs relay_url".to_string()))?;
            Ok(Some(Arc::new(WsRelayTransport::new(url, config.relay_token.clone()))))
        }
        TransportKind::None => Ok(None),
    }
}

/// Exponential reconnect delay: base * 2^(attempt-1), capped, plus jitter.
#[derive(Clone, Debug)]
pub struct Backoff {
    base_ms: u64,
    max_ms: u64,
    attempt: u32,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(RECONNECT_BASE_DELAY_MS, RECONNECT_MAX_DELAY_MS)
    }
}

impl Backoff {
    pub fn new(base_ms: u64, max_ms: u64) -> Self {
        Self {
            base_ms,
            max_ms,
            attempt: 0,
        }
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Delay before the next attempt, without jitter.
    pub fn next_base_delay(&mut self) -> Duration {
        self.attempt = self.attempt.saturating_add(1);
        let exponent = self.attempt.saturating_sub(1).min(10);
        let delay = self.base_ms.saturating_mul(1u64 << exponent).min(self.max_ms);
        Duration::from_millis(delay)
    }

    pub fn next_delay(&mut self) -> Duration {
        let jitter = rand::thread_rng().gen_range(0..=RECONNECT_MAX_JITTER_MS);
        self.next_base_delay() + Duration::from_millis(jitter)
    }
}
