//! Store contracts consumed by the moderation core.
//!
//! The engine and service are generic over these traits so the decision logic
//! can be tested against in-memory stores and swapped over a real database in
//! production. Warning and ban stores are append-only logs: counts and ban
//! status are always derived from the records, never from a separately
//! mutable counter.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::database::models::{BanStatus, ChatConfig, ChatConfigPatch, WarningRecord};

/// Failure talking to a backing store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Per-chat configuration, created lazily with global defaults.
#[allow(async_fn_in_trait)]
pub trait ConfigStore: Send + Sync {
    /// Get the config for a chat, falling back to defaults on miss.
    async fn get(&self, chat_id: i64) -> Result<ChatConfig, StoreError>;

    /// Apply a pre-validated partial update and return the merged config.
    async fn update(
        &self,
        chat_id: i64,
        patch: ChatConfigPatch,
    ) -> Result<ChatConfig, StoreError>;
}

/// Append-only warning log.
#[allow(async_fn_in_trait)]
pub trait WarningStore: Send + Sync {
    /// Append a warning, returning the new record's ID.
    async fn add(
        &self,
        chat_id: i64,
        user_id: u64,
        reason: &str,
        issued_by: u64,
        timestamp: DateTime<Utc>,
    ) -> Result<String, StoreError>;

    /// Number of live warnings for the pair.
    async fn count(&self, chat_id: i64, user_id: u64) -> Result<u32, StoreError>;

    /// All warnings for the pair, most recent first.
    async fn list(&self, chat_id: i64, user_id: u64) -> Result<Vec<WarningRecord>, StoreError>;

    /// Remove every warning for the pair, returning how many were removed.
    async fn clear(&self, chat_id: i64, user_id: u64) -> Result<u64, StoreError>;
}

/// Append-only ban log; status derives from the most recent record.
#[allow(async_fn_in_trait)]
pub trait BanStore: Send + Sync {
    /// Append a ban record (None duration = permanent).
    async fn add(
        &self,
        chat_id: i64,
        user_id: u64,
        reason: &str,
        issued_by: u64,
        duration_secs: Option<u64>,
        timestamp: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Current ban status for the pair.
    async fn status(&self, chat_id: i64, user_id: u64) -> Result<BanStatus, StoreError>;
}

/// Message-rate event sink. Best-effort: writes may be dropped on failure
/// without affecting correctness of the warning/ban logs.
#[allow(async_fn_in_trait)]
pub trait EventSink: Send + Sync {
    async fn record(
        &self,
        chat_id: i64,
        user_id: u64,
        timestamp: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Events for the pair with a timestamp in `[since, now]`.
    async fn count_since(
        &self,
        chat_id: i64,
        user_id: u64,
        since: DateTime<Utc>,
    ) -> Result<u32, StoreError>;
}
