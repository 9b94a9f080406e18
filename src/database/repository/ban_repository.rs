//! Ban log repository.
//!
//! Append-only like the warning log: ban status is derived from the latest
//! record per (chat, user), never stored as a mutable flag. An expired
//! temporary ban needs no cleanup write; it simply stops being active.

use chrono::{DateTime, Utc};
use mongodb::Collection;
use mongodb::bson::doc;
use tracing::debug;

use crate::database::Database;
use crate::database::models::{BanRecord, BanStatus};
use crate::moderation::stores::{BanStore, StoreError};

/// Repository for the per-(chat, user) ban log.
#[derive(Clone)]
pub struct BanRepository {
    collection: Collection<BanRecord>,
}

impl BanRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("bans"),
        }
    }

    /// Append a ban record. `duration_secs = None` means permanent.
    pub async fn add(
        &self,
        chat_id: i64,
        user_id: u64,
        reason: &str,
        issued_by: u64,
        duration_secs: Option<u64>,
        timestamp: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let record = BanRecord::new(chat_id, user_id, reason, issued_by, duration_secs, timestamp);
        self.collection.insert_one(&record).await?;
        debug!("Recorded ban for user {user_id} in chat {chat_id}");
        Ok(())
    }

    /// Derive ban status from the latest record for the pair.
    pub async fn status(&self, chat_id: i64, user_id: u64) -> Result<BanStatus, StoreError> {
        let filter = doc! { "chat_id": chat_id, "user_id": user_id as i64 };
        let latest = self
            .collection
            .find_one(filter)
            .sort(doc! { "timestamp": -1 })
            .await?;

        Ok(BanStatus::from_latest(latest.as_ref(), Utc::now()))
    }
}

impl BanStore for BanRepository {
    async fn add(
        &self,
        chat_id: i64,
        user_id: u64,
        reason: &str,
        issued_by: u64,
        duration_secs: Option<u64>,
        timestamp: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        BanRepository::add(self, chat_id, user_id, reason, issued_by, duration_secs, timestamp)
            .await
    }

    async fn status(&self, chat_id: i64, user_id: u64) -> Result<BanStatus, StoreError> {
        BanRepository::status(self, chat_id, user_id).await
    }
}
