use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_FCM_URL: &str = "https://fcm.googleapis.com/fcm/send";
pub const DEFAULT_FACEBOOK_GRAPH_URL: &str = "https://graph.facebook.com";
pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Without a database the in-memory stores are used
    pub database: Option<DatabaseConfig>,
    pub dispatch: DispatchConfig,
    pub push: PushConfig,
    pub facebook: Option<FacebookConfig>,
    pub telegram: Option<TelegramConfig>,
    pub discord: Option<DiscordConfig>,
}

/// Database connection pool configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

/// Fan-out behaviour
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Upper bound for a single channel delivery, timeouts count as FAILED
    pub channel_timeout: Duration,
    /// Directory holding uploaded media referenced by emergency reports
    pub media_dir: PathBuf,
}

/// Push provider (FCM) configuration
#[derive(Debug, Clone)]
pub struct PushConfig {
    pub url: String,
    pub server_key: Option<String>,
}

/// Facebook page configuration
#[derive(Debug, Clone)]
pub struct FacebookConfig {
    pub graph_url: String,
    pub page_id: String,
    pub access_token: String,
}

/// Telegram bot configuration
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub api_url: String,
    pub bot_token: String,
    pub chat_id: String,
}

/// Discord webhook configuration
#[derive(Debug, Clone)]
pub struct DiscordConfig {
    pub webhook_url: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidPort)?,
            database: DatabaseConfig::from_env(),
            dispatch: DispatchConfig::from_env(),
            push: PushConfig::from_env()?,
            facebook: FacebookConfig::from_env()?,
            telegram: TelegramConfig::from_env()?,
            discord: DiscordConfig::from_env()?,
        })
    }
}

impl DatabaseConfig {
    /// Load database configuration, `None` when DATABASE_URL is not set
    pub fn from_env() -> Option<Self> {
        let url = env::var("DATABASE_URL").ok().filter(|u| !u.is_empty())?;

        Some(Self {
            url,
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),
            min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                .unwrap_or_else(|_| "1".to_string())
                .parse()
                .unwrap_or(1),
            acquire_timeout: Duration::from_secs(
                env::var("DATABASE_ACQUIRE_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .unwrap_or(5),
            ),
            idle_timeout: Duration::from_secs(
                env::var("DATABASE_IDLE_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "600".to_string())
                    .parse()
                    .unwrap_or(600),
            ),
            max_lifetime: Duration::from_secs(
                env::var("DATABASE_MAX_LIFETIME_SECS")
                    .unwrap_or_else(|_| "1800".to_string())
                    .parse()
                    .unwrap_or(1800),
            ),
        })
    }
}

impl DispatchConfig {
    /// Load dispatch configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            channel_timeout: Duration::from_secs(
                env::var("CHANNEL_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .ok()
                    .filter(|secs| *secs > 0)
                    .unwrap_or(30),
            ),
            media_dir: PathBuf::from(
                env::var("MEDIA_DIR").unwrap_or_else(|_| "./media".to_string()),
            ),
        }
    }
}

impl PushConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = env::var("FCM_URL").unwrap_or_else(|_| DEFAULT_FCM_URL.to_string());
        validate_url("FCM_URL", &url)?;

        Ok(Self {
            url,
            server_key: env::var("FCM_SERVER_KEY").ok().filter(|k| !k.is_empty()),
        })
    }
}

impl FacebookConfig {
    /// `None` unless both FACEBOOK_PAGE_ID and FACEBOOK_ACCESS_TOKEN are set
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        let (Some(page_id), Some(access_token)) = (
            non_empty_var("FACEBOOK_PAGE_ID"),
            non_empty_var("FACEBOOK_ACCESS_TOKEN"),
        ) else {
            return Ok(None);
        };

        let graph_url = env::var("FACEBOOK_GRAPH_URL")
            .unwrap_or_else(|_| DEFAULT_FACEBOOK_GRAPH_URL.to_string());
        validate_url("FACEBOOK_GRAPH_URL", &graph_url)?;

        Ok(Some(Self {
            graph_url,
            page_id,
            access_token,
        }))
    }
}

impl TelegramConfig {
    /// `None` unless both TELEGRAM_BOT_TOKEN and TELEGRAM_CHAT_ID are set
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        let (Some(bot_token), Some(chat_id)) = (
            non_empty_var("TELEGRAM_BOT_TOKEN"),
            non_empty_var("TELEGRAM_CHAT_ID"),
        ) else {
            return Ok(None);
        };

        let api_url =
            env::var("TELEGRAM_API_URL").unwrap_or_else(|_| DEFAULT_TELEGRAM_API_URL.to_string());
        validate_url("TELEGRAM_API_URL", &api_url)?;

        Ok(Some(Self {
            api_url,
            bot_token,
            chat_id,
        }))
    }
}

impl DiscordConfig {
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(webhook_url) = non_empty_var("DISCORD_WEBHOOK_URL") else {
            return Ok(None);
        };
        validate_url("DISCORD_WEBHOOK_URL", &webhook_url)?;

        Ok(Some(Self { webhook_url }))
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Ensures the value is an absolute https URL, plain http only for loopback hosts
fn validate_url(name: &'static str, value: &str) -> Result<(), ConfigError> {
    let parsed = url::Url::parse(value).map_err(|_| ConfigError::InvalidUrl(name))?;
    match parsed.scheme() {
        "https" => Ok(()),
        "http" if is_loopback(&parsed) => Ok(()),
        "http" => Err(ConfigError::InsecureUrl(name)),
        _ => Err(ConfigError::InvalidUrl(name)),
    }
}

fn is_loopback(url: &url::Url) -> bool {
    match url.host() {
        Some(url::Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(url::Host::Ipv4(ip)) => ip.is_loopback(),
        Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidUrl(&'static str),
    InsecureUrl(&'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "PORT must be a valid number"),
            ConfigError::InvalidUrl(name) => {
                write!(f, "{} must be an absolute http or https URL", name)
            }
            ConfigError::InsecureUrl(name) => {
                write!(f, "{} must use https outside localhost", name)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
