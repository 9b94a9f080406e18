//! Moderation core: content classification, rate tracking, and escalation.
//!
//! This module is deliberately free of Telegram types. It consumes
//! [`InboundEvent`]s and produces ordered [`service::Action`] lists; the
//! `events` layer translates between the two worlds and executes the actions.
//!
//! ## Pipeline
//!
//! inbound message -> [`rate::RateTracker`] record/query ->
//! [`classifier::ContentClassifier`] (skipped when the flood check already
//! fires) -> [`escalation::EscalationEngine`] -> ordered action list.

pub mod classifier;
pub mod escalation;
pub mod rate;
pub mod sentiment;
pub mod service;
pub mod stores;

use chrono::{DateTime, Utc};

pub use classifier::{ClassificationResult, ContentClassifier};
pub use escalation::{EscalationEngine, Verdict};
pub use rate::RateTracker;
pub use sentiment::{LexiconSentiment, ScorerError, SentimentScorer};
pub use service::{Action, ModerationService};
pub use stores::{BanStore, ConfigStore, EventSink, StoreError, WarningStore};

/// A message event entering the moderation pipeline.
///
/// Ephemeral: retained only inside the rate tracker, and only long enough to
/// answer rate queries.
#[derive(Debug, Clone)]
pub struct InboundEvent {
    pub chat_id: i64,
    pub user_id: u64,
    /// Message to delete if the verdict calls for it.
    pub message_id: Option<i32>,
    pub text: Option<String>,
    /// Decision-path time derives from this, never from the wall clock.
    pub timestamp: DateTime<Utc>,
    /// Commands are handled by the command dispatcher, not moderated.
    pub is_command: bool,
}

/// Errors surfaced by the moderation pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ModerationError {
    #[error(transparent)]
    Store(#[from] StoreError),
}
