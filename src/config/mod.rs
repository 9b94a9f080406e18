//! Configuration module for the Aegis bot.
//!
//! Loads configuration from environment variables.

use serde::Deserialize;
use std::env;

/// Bot running mode
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BotMode {
    Polling,
    Webhook,
}

impl Default for BotMode {
    fn default() -> Self {
        Self::Polling
    }
}

/// Global moderation defaults, applied when a chat has no stored config.
///
/// Per-chat overrides live in `ChatConfig`; these are only the fallback
/// values for chats the bot has never been configured in.
#[derive(Debug, Clone)]
pub struct ModerationDefaults {
    /// Warnings before a ban is issued.
    pub warn_limit: u32,
    /// Default ban duration in seconds (None = permanent).
    pub ban_duration_secs: Option<u64>,
    /// Whether content analysis runs on every message.
    pub ai_moderation_enabled: bool,
    /// Messages within the flood window that count as flooding.
    pub flood_threshold: u32,
    /// Flood window in seconds.
    pub flood_window_secs: u32,
}

impl Default for ModerationDefaults {
    fn default() -> Self {
        Self {
            warn_limit: 3,
            ban_duration_secs: Some(3600),
            ai_moderation_enabled: true,
            flood_threshold: 5,
            flood_window_secs: 10,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    // Telegram
    pub bot_token: String,
    pub bot_mode: BotMode,
    pub webhook_url: Option<String>,
    pub webhook_port: u16,
    pub webhook_secret: Option<String>,

    /// Owner user IDs (comma-separated)
    /// These users bypass all moderation and have full command access.
    pub owner_ids: Vec<u64>,

    // MongoDB
    pub mongodb_uri: String,
    pub mongodb_database: String,

    /// Moderation defaults for unconfigured chats.
    pub defaults: ModerationDefaults,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Panics
    /// Panics if required environment variables are not set.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let bot_mode = env::var("BOT_MODE")
            .unwrap_or_else(|_| "polling".to_string())
            .to_lowercase();

        let bot_mode = match bot_mode.as_str() {
            "webhook" => BotMode::Webhook,
            _ => BotMode::Polling,
        };

        let webhook_url = env::var("WEBHOOK_URL").ok();

        // Validate webhook URL is set if mode is webhook
        if bot_mode == BotMode::Webhook && webhook_url.is_none() {
            panic!("WEBHOOK_URL must be set when BOT_MODE is webhook");
        }

        let webhook_port = env::var("WEBHOOK_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(8443);

        let webhook_secret = env::var("WEBHOOK_SECRET").ok().filter(|s| !s.is_empty());

        // Parse owner IDs
        let owner_ids = env::var("OWNER_IDS")
            .unwrap_or_default()
            .split(',')
            .filter_map(|s| s.trim().parse::<u64>().ok())
            .collect();

        Self {
            bot_token: env::var("BOT_TOKEN").expect("BOT_TOKEN must be set"),
            bot_mode,
            webhook_url,
            webhook_port,
            webhook_secret,
            owner_ids,
            mongodb_uri: env::var("MONGODB_URI").expect("MONGODB_URI must be set"),
            mongodb_database: env::var("MONGODB_DATABASE")
                .unwrap_or_else(|_| "aegis".to_string()),
            defaults: moderation_defaults_from_env(),
        }
    }
}

fn moderation_defaults_from_env() -> ModerationDefaults {
    let base = ModerationDefaults::default();

    ModerationDefaults {
        warn_limit: env_parse("DEFAULT_WARN_LIMIT", base.warn_limit),
        ban_duration_secs: match env::var("DEFAULT_BAN_DURATION").ok().as_deref() {
            Some("permanent") => None,
            Some(s) => s.parse().ok().map(Some).unwrap_or(base.ban_duration_secs),
            None => base.ban_duration_secs,
        },
        ai_moderation_enabled: env::var("ENABLE_AI_MODERATION")
            .map(|v| v.to_lowercase() != "false")
            .unwrap_or(base.ai_moderation_enabled),
        flood_threshold: env_parse("FLOOD_THRESHOLD", base.flood_threshold),
        flood_window_secs: env_parse("FLOOD_TIME_WINDOW", base.flood_window_secs),
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
