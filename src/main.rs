//! Aegis - Group chat moderation bot.
//!
//! Rule-based content classification, flood control, and a warning-to-ban
//! escalation ledger for Telegram groups.
//!
//! ## Architecture
//!
//! - `config` - Environment configuration
//! - `database` - MongoDB integration (configs, warning/ban logs)
//! - `moderation` - Classifier, rate tracker, escalation engine
//! - `permissions` - Admin checking with caching
//! - `bot` - Core bot functionality (with Throttle for API rate limiting)
//! - `plugins` - Command handlers (extensible)
//! - `events` - Event handlers (moderation pipeline, welcomes)
//! - `utils` - Utility functions

mod bot;
mod config;
mod database;
mod events;
mod moderation;
mod permissions;
mod plugins;
mod utils;

use std::sync::Arc;

use teloxide::adaptors::throttle::Limits;
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Config;
use database::Database;
use moderation::RateTracker;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file first (before anything else)
    dotenvy::dotenv().ok();

    // If RUST_LOG is not set, default to "info" level for our crate
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("aegis=info,teloxide=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting Aegis...");

    let config = Config::from_env();
    info!("Configuration loaded successfully");
    info!("Bot mode: {:?}", config.bot_mode);

    info!("Connecting to MongoDB...");
    let db = Database::connect(&config.mongodb_uri, &config.mongodb_database).await?;
    let db = Arc::new(db);
    info!("Database connected");

    // Initialize bot with Throttle for automatic rate limiting.
    // This respects Telegram's rate limits:
    // - 30 messages per second globally
    // - 1 message per second to the same chat
    // - 20 messages per minute to the same group
    let bot = Bot::new(&config.bot_token).throttle(Limits::default());
    info!("Bot initialized with rate limiting (Throttle)");

    let me = bot.get_me().await?;
    info!("Bot username: @{}", me.username());

    if config.owner_ids.is_empty() {
        info!("No owner IDs configured (OWNER_IDS is empty)");
    } else {
        info!("Bot owners: {:?}", config.owner_ids);
    }

    // Rate tracker is process-wide; the sweeper bounds its memory.
    let rate = RateTracker::new();
    rate.spawn_sweeper();

    let dispatcher = bot::build_dispatcher(
        bot.clone(),
        db,
        config.defaults.clone(),
        config.owner_ids.clone(),
        me.id.0,
        rate,
    );

    bot::run(&config, dispatcher, bot).await;

    Ok(())
}
