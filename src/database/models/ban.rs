//! Ban records and derived ban status.
//!
//! Bans are an append-only log; the current status for a (user, chat) pair is
//! derived from the most recent record.

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// A restriction applied to a user in a chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BanRecord {
    /// MongoDB document ID
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub user_id: u64,
    pub chat_id: i64,

    pub reason: String,

    /// User ID of the issuer; the bot's own ID for automatic bans.
    pub issued_by: u64,

    pub timestamp: DateTime<Utc>,

    /// When a temporary ban lifts. Ignored when `permanent` is set.
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,

    #[serde(default)]
    pub permanent: bool,
}

impl BanRecord {
    /// Build a record issued at `now`, temporary when `duration_secs` is set.
    pub fn new(
        chat_id: i64,
        user_id: u64,
        reason: impl Into<String>,
        issued_by: u64,
        duration_secs: Option<u64>,
        now: DateTime<Utc>,
    ) -> Self {
        let expiry = duration_secs.map(|secs| now + chrono::Duration::seconds(secs as i64));

        Self {
            id: None,
            user_id,
            chat_id,
            reason: reason.into(),
            issued_by,
            timestamp: now,
            expiry,
            permanent: duration_secs.is_none(),
        }
    }

    /// Whether this record restricts the user at the given instant.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        if self.permanent {
            return true;
        }
        match self.expiry {
            Some(expiry) => now < expiry,
            None => false,
        }
    }
}

/// Current ban status for a (user, chat) pair, derived from the latest record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BanStatus {
    pub active: bool,
    pub permanent: bool,
    pub expiry: Option<DateTime<Utc>>,
}

impl BanStatus {
    /// Status when no ban record exists.
    pub fn clear() -> Self {
        Self::default()
    }

    /// Derive the status from the most recent record, if any.
    pub fn from_latest(record: Option<&BanRecord>, now: DateTime<Utc>) -> Self {
        match record {
            Some(r) => Self {
                active: r.is_active_at(now),
                permanent: r.permanent,
                expiry: r.expiry,
            },
            None => Self::clear(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn temporary_ban_expires() {
        let issued = at(1_000_000);
        let record = BanRecord::new(-100, 42, "spam", 1, Some(3600), issued);

        assert!(record.is_active_at(issued));
        assert!(record.is_active_at(issued + chrono::Duration::seconds(3599)));
        assert!(!record.is_active_at(issued + chrono::Duration::seconds(3600)));
        assert!(!record.is_active_at(issued + chrono::Duration::seconds(7200)));
    }

    #[test]
    fn permanent_ban_never_expires() {
        let issued = at(1_000_000);
        let record = BanRecord::new(-100, 42, "repeat offender", 1, None, issued);

        assert!(record.permanent);
        assert!(record.expiry.is_none());
        assert!(record.is_active_at(issued + chrono::Duration::days(10_000)));
    }

    #[test]
    fn status_derives_from_latest_record() {
        let issued = at(1_000_000);
        let record = BanRecord::new(-100, 42, "flood", 1, Some(60), issued);

        let status = BanStatus::from_latest(Some(&record), issued);
        assert!(status.active);
        assert!(!status.permanent);
        assert_eq!(status.expiry, Some(issued + chrono::Duration::seconds(60)));

        let status = BanStatus::from_latest(Some(&record), issued + chrono::Duration::seconds(61));
        assert!(!status.active);

        assert_eq!(BanStatus::from_latest(None, issued), BanStatus::clear());
    }
}
