//! Unit tests for configuration structures and parsing.

#[cfg(test)]
mod config_tests {
    use crate::config::*;
    use crate::error::ConfigError;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const R2_ENV: &[(&str, &str)] = &[
        ("R2_ENDPOINT", "https://abc123.r2.cloudflarestorage.com"),
        ("R2_ACCESS_KEY_ID", "AKIDEXAMPLE"),
        ("R2_SECRET_ACCESS_KEY", "wJalrXUtnFEMI"),
        ("R2_BUCKET", "signals"),
    ];

    // ============= Defaults =============

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();

        assert!(config.storage.is_none());
        assert!(config.listener.allow_list.is_empty());
        assert_eq!(config.transport.kind, TransportKind::None);
        assert!(config.api.enabled);
        assert_eq!(config.api.bind, "0.0.0.0:3000");
        assert!(config.status.enabled);
        assert_eq!(config.status.schedule, "*/3 * * * * *");
        assert_eq!(config.log.level, "info");
        assert_eq!(config.log.format, LogFormat::Pretty);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let config = AppConfig::from_yaml_str("").unwrap();
        assert!(config.storage.is_none());
        assert!(config.api.enabled);

        let config = AppConfig::from_yaml_str("\u{feff}   \n").unwrap();
        assert!(config.storage.is_none());
    }

    #[test]
    fn test_missing_file_is_default() {
        let config = AppConfig::from_file(std::path::Path::new("/nonexistent/signal_watch.yaml")).unwrap();
        assert!(config.storage.is_none());
    }

    // ============= YAML =============

    #[test]
    fn test_full_yaml() {
        let yaml = r#"
storage:
  endpoint: "https://abc123.r2.cloudflarestorage.com"
  access_key_id: "AKID"
  secret_access_key: "secret"
  bucket: "signals"
listener:
  allow_list: ["@SignalChannel", "-100123"]
transport:
  kind: ws_relay
  relay_url: "wss://relay.example.com/feed"
api:
  bind: "127.0.0.1:8080"
status:
  enabled: false
log:
  level: debug
  format: json
"#;
        let config = AppConfig::from_yaml_str(yaml).unwrap();

        let storage = config.storage.as_ref().unwrap();
        assert_eq!(storage.bucket, "signals");
        assert_eq!(storage.region, "auto");
        assert_eq!(storage.object_key, "signals_data.json");
        assert_eq!(config.listener.allow_list, vec!["@SignalChannel", "-100123"]);
        assert_eq!(config.transport.kind, TransportKind::WsRelay);
        assert!(config.api.enabled);
        assert_eq!(config.api.bind, "127.0.0.1:8080");
        assert!(!config.status.enabled);
        assert_eq!(config.status.schedule, "*/3 * * * * *");
        assert_eq!(config.log.format, LogFormat::Json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_with_bom() {
        let yaml = "\u{feff}listener:\n  allow_list: [\"signals\"]\n";
        let config = AppConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.listener.allow_list, vec!["signals"]);
    }

    #[test]
    fn test_invalid_yaml() {
        let result = AppConfig::from_yaml_str("transport:\n  kind: carrier_pigeon\n");
        assert!(matches!(result, Err(ConfigError::Yaml(_))));
    }

    // ============= Environment overrides =============

    #[test]
    fn test_env_enables_storage() {
        let mut config = AppConfig::default();
        config.apply_env(env_of(R2_ENV));

        let storage = config.storage.expect("storage enabled");
        assert_eq!(storage.endpoint, "https://abc123.r2.cloudflarestorage.com");
        assert_eq!(storage.bucket, "signals");
        assert_eq!(storage.region, "auto");
    }

    #[test]
    fn test_partial_r2_env_leaves_storage_disabled() {
        let mut config = AppConfig::default();
        config.apply_env(env_of(&R2_ENV[..3]));
        assert!(config.storage.is_none());
    }

    #[test]
    fn test_env_overrides_yaml_storage() {
        let yaml = r#"
storage:
  endpoint: "https://old.example.com"
  access_key_id: "AKID"
  secret_access_key: "secret"
  bucket: "old"
"#;
        let mut config = AppConfig::from_yaml_str(yaml).unwrap();
        config.apply_env(env_of(&[("R2_BUCKET", "new"), ("R2_REGION", "weur")]));

        let storage = config.storage.unwrap();
        assert_eq!(storage.endpoint, "https://old.example.com");
        assert_eq!(storage.bucket, "new");
        assert_eq!(storage.region, "weur");
    }

    #[test]
    fn test_target_chats_split() {
        let mut config = AppConfig::default();
        config.apply_env(env_of(&[("TARGET_CHATS", " @alpha, beta ,,-100200 ")]));
        assert_eq!(config.listener.allow_list, vec!["@alpha", "beta", "-100200"]);
    }

    #[test]
    fn test_bot_token_selects_transport() {
        let mut config = AppConfig::default();
        config.apply_env(env_of(&[("TELEGRAM_BOT_TOKEN", "123:abc")]));
        assert_eq!(config.transport.kind, TransportKind::TelegramBot);
        assert_eq!(config.transport.bot_token.as_deref(), Some("123:abc"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_explicit_kind_not_overridden() {
        let mut config = AppConfig::from_yaml_str("transport:\n  kind: ws_relay\n").unwrap();
        config.apply_env(env_of(&[
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("RELAY_URL", "ws://127.0.0.1:9000"),
        ]));
        assert_eq!(config.transport.kind, TransportKind::WsRelay);
        assert_eq!(config.transport.relay_url.as_deref(), Some("ws://127.0.0.1:9000"));
    }

    #[test]
    fn test_blank_env_values_ignored() {
        let mut config = AppConfig::default();
        config.apply_env(env_of(&[("API_BIND", "   "), ("LOG_LEVEL", "warn")]));
        assert_eq!(config.api.bind, "0.0.0.0:3000");
        assert_eq!(config.log.level, "warn");
    }

    // ============= Validation =============

    #[test]
    fn test_validate_rejects_empty_storage_field() {
        let yaml = r#"
storage:
  endpoint: "https://abc.example.com"
  access_key_id: ""
  secret_access_key: "secret"
  bucket: "signals"
"#;
        let config = AppConfig::from_yaml_str(yaml).unwrap();
        match config.validate() {
            Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, "storage.access_key_id"),
            other => panic!("Expected invalid field, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_requires_transport_credentials() {
        let config = AppConfig::from_yaml_str("transport:\n  kind: telegram_bot\n").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "transport.bot_token", .. })
        ));

        let config = AppConfig::from_yaml_str("transport:\n  kind: ws_relay\n").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "transport.relay_url", .. })
        ));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut config = AppConfig::default();
        config.apply_env(env_of(R2_ENV));
        config.apply_env(env_of(&[("TELEGRAM_BOT_TOKEN", "123:supersecret")]));

        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("wJalrXUtnFEMI"));
        assert!(!rendered.contains("supersecret"));
        assert!(rendered.contains("<redacted>"));
    }
}
