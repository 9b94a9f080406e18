//! Warning records.
//!
//! Warnings are an append-only log; a user's warning count in a chat is
//! always the number of live records, never a separately mutated counter.

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// A single rule violation attributed to a user in a chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarningRecord {
    /// MongoDB document ID
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub user_id: u64,
    pub chat_id: i64,

    /// Why the warning was issued (classifier reason, "flood", or admin text).
    pub reason: String,

    /// User ID of the issuer; the bot's own ID for automatic warnings.
    pub issued_by: u64,

    pub timestamp: DateTime<Utc>,
}

impl WarningRecord {
    pub fn new(
        chat_id: i64,
        user_id: u64,
        reason: impl Into<String>,
        issued_by: u64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            user_id,
            chat_id,
            reason: reason.into(),
            issued_by,
            timestamp,
        }
    }
}
