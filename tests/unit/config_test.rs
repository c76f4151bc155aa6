//! Unit tests for configuration parsing
//!
//! Tests environment variable parsing and default values.
//!
//! Note: These tests modify global environment variables and must run serially.

use std::path::PathBuf;
use std::time::Duration;

use resq_dispatch::config::{
    Config, DatabaseConfig, DiscordConfig, DispatchConfig, FacebookConfig, PushConfig,
    TelegramConfig, DEFAULT_FACEBOOK_GRAPH_URL, DEFAULT_FCM_URL, DEFAULT_TELEGRAM_API_URL,
};
use serial_test::serial;

const CHANNEL_VARS: &[&str] = &[
    "FCM_URL",
    "FCM_SERVER_KEY",
    "FACEBOOK_PAGE_ID",
    "FACEBOOK_ACCESS_TOKEN",
    "FACEBOOK_GRAPH_URL",
    "TELEGRAM_BOT_TOKEN",
    "TELEGRAM_CHAT_ID",
    "TELEGRAM_API_URL",
    "DISCORD_WEBHOOK_URL",
];

fn clear(vars: &[&str]) {
    for var in vars {
        std::env::remove_var(var);
    }
}

// =============================================================================
// Dispatch Config Tests
// =============================================================================

#[test]
#[serial]
fn test_dispatch_config_defaults() {
    clear(&["CHANNEL_TIMEOUT_SECS", "MEDIA_DIR"]);

    let config = DispatchConfig::from_env();

    assert_eq!(config.channel_timeout, Duration::from_secs(30));
    assert_eq!(config.media_dir, PathBuf::from("./media"));
}

#[test]
#[serial]
fn test_dispatch_config_custom_values() {
    std::env::set_var("CHANNEL_TIMEOUT_SECS", "5");
    std::env::set_var("MEDIA_DIR", "/var/lib/resq/media");

    let config = DispatchConfig::from_env();

    assert_eq!(config.channel_timeout, Duration::from_secs(5));
    assert_eq!(config.media_dir, PathBuf::from("/var/lib/resq/media"));

    clear(&["CHANNEL_TIMEOUT_SECS", "MEDIA_DIR"]);
}

#[test]
#[serial]
fn test_dispatch_config_invalid_timeout_uses_default() {
    for value in ["0", "-3", "soon"] {
        std::env::set_var("CHANNEL_TIMEOUT_SECS", value);
        assert_eq!(
            DispatchConfig::from_env().channel_timeout,
            Duration::from_secs(30),
            "CHANNEL_TIMEOUT_SECS={}",
            value
        );
    }

    clear(&["CHANNEL_TIMEOUT_SECS"]);
}

// =============================================================================
// Database Config Tests
// =============================================================================

#[test]
#[serial]
fn test_database_config_absent_without_url() {
    clear(&["DATABASE_URL"]);
    assert!(DatabaseConfig::from_env().is_none());

    std::env::set_var("DATABASE_URL", "");
    assert!(DatabaseConfig::from_env().is_none());

    clear(&["DATABASE_URL"]);
}

#[test]
#[serial]
fn test_database_config_pool_defaults() {
    std::env::set_var("DATABASE_URL", "postgres://localhost/resq");
    clear(&["DATABASE_MAX_CONNECTIONS", "DATABASE_MIN_CONNECTIONS"]);

    let config = DatabaseConfig::from_env().unwrap();

    assert_eq!(config.url, "postgres://localhost/resq");
    assert_eq!(config.max_connections, 10);
    assert_eq!(config.min_connections, 1);
    assert_eq!(config.acquire_timeout, Duration::from_secs(5));

    clear(&["DATABASE_URL"]);
}

// =============================================================================
// Channel Config Tests
// =============================================================================

#[test]
#[serial]
fn test_push_config_defaults() {
    clear(CHANNEL_VARS);

    let config = PushConfig::from_env().unwrap();

    assert_eq!(config.url, DEFAULT_FCM_URL);
    assert_eq!(config.server_key, None);
}

#[test]
#[serial]
fn test_social_configs_absent_without_credentials() {
    clear(CHANNEL_VARS);

    assert!(FacebookConfig::from_env().unwrap().is_none());
    assert!(TelegramConfig::from_env().unwrap().is_none());
    assert!(DiscordConfig::from_env().unwrap().is_none());
}

#[test]
#[serial]
fn test_social_config_requires_every_credential() {
    clear(CHANNEL_VARS);
    std::env::set_var("FACEBOOK_PAGE_ID", "123");
    std::env::set_var("TELEGRAM_CHAT_ID", "-1001");

    assert!(FacebookConfig::from_env().unwrap().is_none());
    assert!(TelegramConfig::from_env().unwrap().is_none());

    clear(CHANNEL_VARS);
}

#[test]
#[serial]
fn test_social_configs_with_credentials() {
    clear(CHANNEL_VARS);
    std::env::set_var("FACEBOOK_PAGE_ID", "123");
    std::env::set_var("FACEBOOK_ACCESS_TOKEN", "page-token");
    std::env::set_var("TELEGRAM_BOT_TOKEN", "bot-token");
    std::env::set_var("TELEGRAM_CHAT_ID", "-1001");
    std::env::set_var(
        "DISCORD_WEBHOOK_URL",
        "https://discord.com/api/webhooks/1/abc",
    );

    let facebook = FacebookConfig::from_env().unwrap().unwrap();
    assert_eq!(facebook.graph_url, DEFAULT_FACEBOOK_GRAPH_URL);
    assert_eq!(facebook.page_id, "123");

    let telegram = TelegramConfig::from_env().unwrap().unwrap();
    assert_eq!(telegram.api_url, DEFAULT_TELEGRAM_API_URL);
    assert_eq!(telegram.chat_id, "-1001");

    let discord = DiscordConfig::from_env().unwrap().unwrap();
    assert_eq!(discord.webhook_url, "https://discord.com/api/webhooks/1/abc");

    clear(CHANNEL_VARS);
}

#[test]
#[serial]
fn test_invalid_urls_are_rejected() {
    clear(CHANNEL_VARS);

    std::env::set_var("FCM_URL", "not a url");
    assert!(PushConfig::from_env().is_err());

    std::env::set_var("DISCORD_WEBHOOK_URL", "ftp://discord.example/hook");
    assert!(DiscordConfig::from_env().is_err());

    clear(CHANNEL_VARS);
}

#[test]
#[serial]
fn test_plain_http_only_allowed_for_loopback() {
    clear(CHANNEL_VARS);

    std::env::set_var("DISCORD_WEBHOOK_URL", "http://discord.example/hook");
    let err = DiscordConfig::from_env().unwrap_err();
    assert_eq!(
        err.to_string(),
        "DISCORD_WEBHOOK_URL must use https outside localhost"
    );

    std::env::set_var("FCM_URL", "http://127.0.0.1:9000/fcm/send");
    assert_eq!(
        PushConfig::from_env().unwrap().url,
        "http://127.0.0.1:9000/fcm/send"
    );

    std::env::set_var("DISCORD_WEBHOOK_URL", "http://localhost:9000/hook");
    assert!(DiscordConfig::from_env().unwrap().is_some());

    clear(CHANNEL_VARS);
}

// =============================================================================
// Full Config Tests
// =============================================================================

#[test]
#[serial]
fn test_config_invalid_port() {
    clear(CHANNEL_VARS);
    std::env::set_var("PORT", "eighty");

    let err = Config::from_env().unwrap_err();
    assert_eq!(err.to_string(), "PORT must be a valid number");

    clear(&["PORT"]);
}

#[test]
#[serial]
fn test_config_defaults() {
    clear(CHANNEL_VARS);
    clear(&["HOST", "PORT", "DATABASE_URL"]);

    let config = Config::from_env().unwrap();

    assert_eq!(config.host, "0.0.0.0");
    assert_eq!(config.port, 8080);
    assert!(config.database.is_none());
    assert!(config.facebook.is_none());
    assert!(config.telegram.is_none());
    assert!(config.discord.is_none());
}
