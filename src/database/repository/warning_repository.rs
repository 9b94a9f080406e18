//! Warning log repository.
//!
//! Append-only: warnings are individual records, never an embedded counter,
//! so the count is always derivable after a restart and concurrent appends
//! from several bot instances cannot clobber each other. Uncached; warning
//! reads sit on the violation path, not the per-message hot path.

use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::Collection;
use mongodb::bson::doc;
use tracing::debug;

use crate::database::Database;
use crate::database::models::WarningRecord;
use crate::moderation::stores::{StoreError, WarningStore};

/// Repository for the per-(chat, user) warning log.
#[derive(Clone)]
pub struct WarningRepository {
    collection: Collection<WarningRecord>,
}

impl WarningRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("warnings"),
        }
    }

    /// Append a warning record, returning its ID.
    pub async fn add(
        &self,
        chat_id: i64,
        user_id: u64,
        reason: &str,
        issued_by: u64,
        timestamp: DateTime<Utc>,
    ) -> Result<String, StoreError> {
        let record = WarningRecord::new(chat_id, user_id, reason, issued_by, timestamp);
        let result = self.collection.insert_one(&record).await?;

        let id = result
            .inserted_id
            .as_object_id()
            .map(|oid| oid.to_hex())
            .unwrap_or_default();
        debug!("Recorded warning {id} for user {user_id} in chat {chat_id}");
        Ok(id)
    }

    /// Count warnings for a user in a chat.
    pub async fn count(&self, chat_id: i64, user_id: u64) -> Result<u32, StoreError> {
        let filter = doc! { "chat_id": chat_id, "user_id": user_id as i64 };
        let count = self.collection.count_documents(filter).await?;
        Ok(count as u32)
    }

    /// List warnings for a user, newest first.
    pub async fn list(
        &self,
        chat_id: i64,
        user_id: u64,
    ) -> Result<Vec<WarningRecord>, StoreError> {
        let filter = doc! { "chat_id": chat_id, "user_id": user_id as i64 };
        let records = self
            .collection
            .find(filter)
            .sort(doc! { "timestamp": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(records)
    }

    /// Delete all warnings for a user, returning how many were removed.
    pub async fn clear(&self, chat_id: i64, user_id: u64) -> Result<u64, StoreError> {
        let filter = doc! { "chat_id": chat_id, "user_id": user_id as i64 };
        let result = self.collection.delete_many(filter).await?;
        debug!(
            "Cleared {} warning(s) for user {user_id} in chat {chat_id}",
            result.deleted_count
        );
        Ok(result.deleted_count)
    }
}

impl WarningStore for WarningRepository {
    async fn add(
        &self,
        chat_id: i64,
        user_id: u64,
        reason: &str,
        issued_by: u64,
        timestamp: DateTime<Utc>,
    ) -> Result<String, StoreError> {
        WarningRepository::add(self, chat_id, user_id, reason, issued_by, timestamp).await
    }

    async fn count(&self, chat_id: i64, user_id: u64) -> Result<u32, StoreError> {
        WarningRepository::count(self, chat_id, user_id).await
    }

    async fn list(&self, chat_id: i64, user_id: u64) -> Result<Vec<WarningRecord>, StoreError> {
        WarningRepository::list(self, chat_id, user_id).await
    }

    async fn clear(&self, chat_id: i64, user_id: u64) -> Result<u64, StoreError> {
        WarningRepository::clear(self, chat_id, user_id).await
    }
}
