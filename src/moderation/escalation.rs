//! Warning -> ban escalation state machine.
//!
//! Per-(chat, user) state is `clean -> warned(n) -> restricted`, monotonic
//! except for explicit admin unban/clear. The state itself lives in the
//! append-only warning/ban logs; this engine only appends to them and reads
//! counts back, so recovery after a restart needs nothing beyond re-reading
//! the logs.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::classifier::ClassificationResult;
use super::stores::{BanStore, StoreError, WarningStore};
use super::{InboundEvent, ModerationError};
use crate::database::models::ChatConfig;

/// Warning reason recorded for rate violations.
pub const FLOOD_REASON: &str = "flood";

/// Bounded retry for writes that affect moderation state. Rate writes are
/// best-effort, but silently losing a warning or ban record would be a
/// user-visible correctness gap.
const WRITE_ATTEMPTS: u32 = 3;
const RETRY_BACKOFF: Duration = Duration::from_millis(50);

/// Outcome of evaluating one message.
///
/// Flood and content violations are mutually exclusive per message; flood
/// wins and content classification is skipped entirely.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// No violation.
    Clean,
    /// Content warning, message left in place.
    NotifyWarn { reason: String, count: u32, limit: u32 },
    /// Content warning plus deletion of the offending message.
    DeleteAndWarn { reason: String, count: u32, limit: u32 },
    /// Warning limit reached through content violations.
    Ban { reason: String, duration_secs: Option<u64> },
    /// Rate violation below the warning limit.
    FloodWarn { count: u32, limit: u32 },
    /// Warning limit reached through a rate violation.
    FloodBan { reason: String, duration_secs: Option<u64> },
}

/// Escalation engine over injected warning/ban stores.
///
/// The read-decide-write sequence for one (chat, user) pair runs under a
/// per-key async lock: two concurrent evaluations can never both observe a
/// below-limit count and each issue a warning without one of them seeing the
/// resulting ban. Different pairs proceed in parallel.
pub struct EscalationEngine<W, B> {
    warnings: Arc<W>,
    bans: Arc<B>,
    /// Actor recorded on automatic warnings/bans (the bot's own user ID).
    actor_id: u64,
    locks: DashMap<(i64, u64), Arc<Mutex<()>>>,
}

impl<W: WarningStore, B: BanStore> EscalationEngine<W, B> {
    pub fn new(warnings: Arc<W>, bans: Arc<B>, actor_id: u64) -> Self {
        Self {
            warnings,
            bans,
            actor_id,
            locks: DashMap::new(),
        }
    }

    /// Decide the action for one message.
    ///
    /// `classification` is `None` when the rate check already escalated (the
    /// caller skips the classifier) or when AI moderation is disabled.
    pub async fn decide(
        &self,
        event: &InboundEvent,
        classification: Option<&ClassificationResult>,
        recent_count: u32,
        config: &ChatConfig,
    ) -> Result<Verdict, ModerationError> {
        let key = (event.chat_id, event.user_id);
        let lock = self
            .locks
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        // Flood precedence: content is not consulted for this message.
        if recent_count >= config.flood_threshold {
            let count = self.add_warning(event, FLOOD_REASON).await?;
            if count >= config.warn_limit {
                let reason = format!("flood ({count} warnings)");
                self.record_ban(event, &reason, config.ban_duration_secs)
                    .await?;
                return Ok(Verdict::FloodBan {
                    reason,
                    duration_secs: config.ban_duration_secs,
                });
            }
            return Ok(Verdict::FloodWarn {
                count,
                limit: config.warn_limit,
            });
        }

        if config.ai_moderation_enabled
            && let Some(flagged) = classification.filter(|c| c.should_flag)
        {
            let count = self.add_warning(event, &flagged.reason).await?;
            if count >= config.warn_limit {
                let reason = format!("repeated violations ({count} warnings)");
                self.record_ban(event, &reason, config.ban_duration_secs)
                    .await?;
                return Ok(Verdict::Ban {
                    reason,
                    duration_secs: config.ban_duration_secs,
                });
            }
            if flagged.is_spam || flagged.has_profanity {
                return Ok(Verdict::DeleteAndWarn {
                    reason: flagged.reason.clone(),
                    count,
                    limit: config.warn_limit,
                });
            }
            return Ok(Verdict::NotifyWarn {
                reason: flagged.reason.clone(),
                count,
                limit: config.warn_limit,
            });
        }

        Ok(Verdict::Clean)
    }

    /// Append a warning with bounded retry, returning the resulting count.
    async fn add_warning(&self, event: &InboundEvent, reason: &str) -> Result<u32, StoreError> {
        let mut attempt = 1;
        loop {
            match self
                .warnings
                .add(
                    event.chat_id,
                    event.user_id,
                    reason,
                    self.actor_id,
                    event.timestamp,
                )
                .await
            {
                Ok(_) => break,
                Err(e) if attempt < WRITE_ATTEMPTS => {
                    warn!(
                        "warning write failed (attempt {attempt}/{WRITE_ATTEMPTS}), retrying: {e}"
                    );
                    attempt += 1;
                    tokio::time::sleep(RETRY_BACKOFF).await;
                }
                Err(e) => return Err(e),
            }
        }

        let count = self.warnings.count(event.chat_id, event.user_id).await?;
        info!(
            "warned user {} in chat {} for '{}' ({count} total)",
            event.user_id, event.chat_id, reason
        );
        Ok(count)
    }

    /// Append a ban record with bounded retry.
    ///
    /// Idempotent: a user with an already-active ban gets no duplicate
    /// record; re-emitting the platform ban action is harmless.
    async fn record_ban(
        &self,
        event: &InboundEvent,
        reason: &str,
        duration_secs: Option<u64>,
    ) -> Result<(), StoreError> {
        let status = self.bans.status(event.chat_id, event.user_id).await?;
        if status.active {
            debug!(
                "user {} already banned in chat {}, skipping duplicate record",
                event.user_id, event.chat_id
            );
            return Ok(());
        }

        let mut attempt = 1;
        loop {
            match self
                .bans
                .add(
                    event.chat_id,
                    event.user_id,
                    reason,
                    self.actor_id,
                    duration_secs,
                    event.timestamp,
                )
                .await
            {
                Ok(()) => break,
                Err(e) if attempt < WRITE_ATTEMPTS => {
                    warn!("ban write failed (attempt {attempt}/{WRITE_ATTEMPTS}), retrying: {e}");
                    attempt += 1;
                    tokio::time::sleep(RETRY_BACKOFF).await;
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            "banned user {} in chat {} for '{}' ({})",
            event.user_id,
            event.chat_id,
            reason,
            match duration_secs {
                Some(secs) => format!("{secs}s"),
                None => "permanent".to_string(),
            }
        );
        Ok(())
    }
}
