//! Per-chat config repository with on-demand caching.
//!
//! Medium TTL (5min): config changes are command-triggered and rare, while
//! reads happen on every moderated message.

use std::time::Duration;

use moka::sync::Cache;
use mongodb::Collection;
use mongodb::bson::doc;
use tracing::debug;

use crate::config::ModerationDefaults;
use crate::database::Database;
use crate::database::models::{ChatConfig, ChatConfigPatch};
use crate::moderation::stores::{ConfigStore, StoreError};

const CACHE_CAPACITY: u64 = 5_000;
const CACHE_TTL: Duration = Duration::from_secs(300);

/// Repository for chat moderation configs.
#[derive(Clone)]
pub struct ConfigRepository {
    collection: Collection<ChatConfig>,
    cache: Cache<i64, ChatConfig>,
    defaults: ModerationDefaults,
}

impl ConfigRepository {
    pub fn new(db: &Database, defaults: ModerationDefaults) -> Self {
        Self {
            collection: db.collection("chat_configs"),
            cache: Cache::builder()
                .max_capacity(CACHE_CAPACITY)
                .time_to_live(CACHE_TTL)
                .build(),
            defaults,
        }
    }

    /// Get the config for a chat, falling back to process defaults.
    ///
    /// The defaults are not persisted until the first explicit update, so
    /// changing the process defaults affects all untouched chats.
    pub async fn get(&self, chat_id: i64) -> Result<ChatConfig, StoreError> {
        if let Some(config) = self.cache.get(&chat_id) {
            return Ok(config);
        }

        let filter = doc! { "chat_id": chat_id };
        let config = self
            .collection
            .find_one(filter)
            .await?
            .unwrap_or_else(|| ChatConfig::with_defaults(chat_id, &self.defaults));

        self.cache.insert(chat_id, config.clone());
        Ok(config)
    }

    /// Apply a patch and persist the result (upsert).
    pub async fn update(
        &self,
        chat_id: i64,
        patch: ChatConfigPatch,
    ) -> Result<ChatConfig, StoreError> {
        let mut config = self.get(chat_id).await?;
        config.apply(patch);

        let filter = doc! { "chat_id": chat_id };
        let options = mongodb::options::ReplaceOptions::builder()
            .upsert(true)
            .build();
        self.collection
            .replace_one(filter, &config)
            .with_options(options)
            .await?;

        self.cache.insert(chat_id, config.clone());
        debug!("Saved ChatConfig for chat {chat_id}");

        Ok(config)
    }

    /// Invalidate cache.
    pub fn invalidate(&self, chat_id: i64) {
        self.cache.invalidate(&chat_id);
    }
}

impl ConfigStore for ConfigRepository {
    async fn get(&self, chat_id: i64) -> Result<ChatConfig, StoreError> {
        ConfigRepository::get(self, chat_id).await
    }

    async fn update(
        &self,
        chat_id: i64,
        patch: ChatConfigPatch,
    ) -> Result<ChatConfig, StoreError> {
        ConfigRepository::update(self, chat_id, patch).await
    }
}
