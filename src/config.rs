use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

use crate::constants::{defaults, storage};
use crate::error::ConfigError;

#[derive(Clone, Deserialize)]
pub struct StorageConfig {
    pub endpoint: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub bucket: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_object_key")]
    pub object_key: String,
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("endpoint", &self.endpoint)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("object_key", &self.object_key)
            .finish()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    TelegramBot,
    WsRelay,
    #[default]
    None,
}

#[derive(Clone, Default, Deserialize)]
pub struct TransportConfig {
    #[serde(default)]
    pub kind: TransportKind,
    pub bot_token: Option<String>,
    pub relay_url: Option<String>,
    pub relay_token: Option<String>,
}

impl std::fmt::Debug for TransportConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportConfig")
            .field("kind", &self.kind)
            .field("bot_token", &self.bot_token.as_ref().map(|_| "<redacted>"))
            .field("relay_url", &self.relay_url)
            .field("relay_token", &self.relay_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ListenerConfig {
    /// Channel usernames or numeric ids whose messages are parsed
    #[serde(default)]
    pub allow_list: Vec<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_api_bind")]
    pub bind: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind: default_api_bind(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct StatusConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_status_schedule")]
    pub schedule: String,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            schedule: default_status_schedule(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct AppConfig {
    /// Remote snapshot store; `None` keeps snapshots in memory only
    pub storage: Option<StorageConfig>,
    #[serde(default)]
    pub listener: ListenerConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub status: StatusConfig,
    #[serde(default)]
    pub log: LogConfig,
}

fn default_region() -> String {
    storage::DEFAULT_REGION.to_string()
}

fn default_object_key() -> String {
    storage::SNAPSHOT_KEY.to_string()
}

fn default_true() -> bool {
    true
}

fn default_api_bind() -> String {
    defaults::API_BIND.to_string()
}

fn default_status_schedule() -> String {
    defaults::STATUS_SCHEDULE.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Read the YAML file named by `SIGNAL_WATCH_CONFIG` (default
    /// `config.yaml`), then apply environment overrides. A missing file
    /// means defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = env::var("SIGNAL_WATCH_CONFIG").unwrap_or_else(|_| defaults::CONFIG_PATH.to_string());
        let mut config = Self::from_file(Path::new(&path))?;
        config.apply_env(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        // Strip BOM if present
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Overlay values from the environment. `lookup` is injectable so tests
    /// don't touch the process environment.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let endpoint = var("R2_ENDPOINT");
        let access_key_id = var("R2_ACCESS_KEY_ID");
        let secret_access_key = var("R2_SECRET_ACCESS_KEY");
        let bucket = var("R2_BUCKET");
        let region = var("R2_REGION");

        match self.storage.as_mut() {
            Some(storage) => {
                if let Some(v) = endpoint {
                    storage.endpoint = v;
                }
                if let Some(v) = access_key_id {
                    storage.access_key_id = v;
                }
                if let Some(v) = secret_access_key {
                    storage.secret_access_key = v;
                }
                if let Some(v) = bucket {
                    storage.bucket = v;
                }
                if let Some(v) = region {
                    storage.region = v;
                }
            }
            None => {
                // Storage is only enabled when every required value is present.
                if let (Some(endpoint), Some(access_key_id), Some(secret_access_key), Some(bucket)) =
                    (endpoint, access_key_id, secret_access_key, bucket)
                {
                    self.storage = Some(StorageConfig {
                        endpoint,
                        access_key_id,
                        secret_access_key,
                        bucket,
                        region: region.unwrap_or_else(default_region),
                        object_key: default_object_key(),
                    });
                }
            }
        }

        if let Some(chats) = var("TARGET_CHATS") {
            self.listener.allow_list = chats
                .split(',')
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect();
        }

        if let Some(token) = var("TELEGRAM_BOT_TOKEN") {
            self.transport.bot_token = Some(token);
            if self.transport.kind == TransportKind::None {
                self.transport.kind = TransportKind::TelegramBot;
            }
        }
        if let Some(url) = var("RELAY_URL") {
            self.transport.relay_url = Some(url);
            if self.transport.kind == TransportKind::None {
                self.transport.kind = TransportKind::WsRelay;
            }
        }
        if let Some(token) = var("RELAY_TOKEN") {
            self.transport.relay_token = Some(token);
        }

        if let Some(bind) = var("API_BIND") {
            self.api.bind = bind;
        }
        if let Some(level) = var("LOG_LEVEL") {
            self.log.level = level;
        }
    }

    /// Checks only what the selected components actually need.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(storage) = &self.storage {
            for (field, value) in [
                ("storage.endpoint", &storage.endpoint),
                ("storage.access_key_id", &storage.access_key_id),
                ("storage.secret_access_key", &storage.secret_access_key),
                ("storage.bucket", &storage.bucket),
            ] {
                if value.trim().is_empty() {
                    return Err(ConfigError::Invalid {
                        field,
                        reason: "must not be empty".to_string(),
                    });
                }
            }
        }

        match self.transport.kind {
            TransportKind::TelegramBot if self.transport.bot_token.is_none() => Err(ConfigError::Invalid {
                field: "transport.bot_token",
                reason: "required for the telegram_bot transport".to_string(),
            }),
            TransportKind::WsRelay if self.transport.relay_url.is_none() => Err(ConfigError::Invalid {
                field: "transport.relay_url",
                reason: "required for the ws_relay transport".to_string(),
            }),
            _ => Ok(()),
        }
    }
}
