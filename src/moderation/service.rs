//! Moderation service: the per-event orchestration layer.
//!
//! Holds the classifier, the rate tracker, and the escalation engine behind
//! injected store handles. `process_event` turns one inbound message into an
//! ordered list of platform actions; it never performs platform I/O itself,
//! so a stalled Telegram call for one chat cannot delay decisions for
//! another.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::classifier::ContentClassifier;
use super::escalation::{EscalationEngine, FLOOD_REASON, Verdict};
use super::stores::{BanStore, ConfigStore, EventSink, WarningStore};
use super::{InboundEvent, ModerationError};

/// A platform action for the transport layer to execute.
///
/// Each action carries enough data to be applied independently and
/// idempotently; presentation formatting happens at the transport layer.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    DeleteMessage {
        chat_id: i64,
        message_id: i32,
    },
    /// Announce a warning with escalation progress.
    Warn {
        chat_id: i64,
        user_id: u64,
        reason: String,
        count: u32,
        limit: u32,
        /// Rate violation rather than content violation.
        flood: bool,
    },
    /// Restrict the user; `until = None` means permanent.
    Ban {
        chat_id: i64,
        user_id: u64,
        reason: String,
        until: Option<DateTime<Utc>>,
    },
}

/// Per-event moderation pipeline over injected stores.
pub struct ModerationService<C, W, B, E> {
    config_store: Arc<C>,
    rate: Arc<E>,
    classifier: ContentClassifier,
    engine: EscalationEngine<W, B>,
}

impl<C, W, B, E> ModerationService<C, W, B, E>
where
    C: ConfigStore,
    W: WarningStore,
    B: BanStore,
    E: EventSink,
{
    pub fn new(
        config_store: Arc<C>,
        warnings: Arc<W>,
        bans: Arc<B>,
        rate: Arc<E>,
        classifier: ContentClassifier,
        actor_id: u64,
    ) -> Self {
        Self {
            config_store,
            rate,
            classifier,
            engine: EscalationEngine::new(warnings, bans, actor_id),
        }
    }

    /// Process one inbound message event.
    ///
    /// Returns the ordered action list for the transport layer. Commands are
    /// never moderated. All time derives from `event.timestamp`.
    pub async fn process_event(&self, event: &InboundEvent) -> Result<Vec<Action>, ModerationError> {
        if event.is_command {
            return Ok(Vec::new());
        }

        // Rate writes are best-effort and non-authoritative.
        if let Err(e) = self
            .rate
            .record(event.chat_id, event.user_id, event.timestamp)
            .await
        {
            warn!("dropping rate event for chat {}: {e}", event.chat_id);
        }

        let config = self.config_store.get(event.chat_id).await?;

        let window_start =
            event.timestamp - chrono::Duration::seconds(config.flood_window_secs as i64);
        let recent_count = match self
            .rate
            .count_since(event.chat_id, event.user_id, window_start)
            .await
        {
            Ok(n) => n,
            Err(e) => {
                warn!("rate query failed for chat {}, assuming zero: {e}", event.chat_id);
                0
            }
        };

        // Flood wins over content: the classifier is skipped entirely when
        // the rate check already escalates this message.
        let flood_pending = recent_count >= config.flood_threshold;
        let classification = if !flood_pending && config.ai_moderation_enabled {
            Some(self.classifier.analyze(event.text.as_deref().unwrap_or("")))
        } else {
            None
        };

        let verdict = self
            .engine
            .decide(event, classification.as_ref(), recent_count, &config)
            .await?;

        Ok(self.actions_for(event, verdict))
    }

    /// Map a verdict to the ordered platform action list.
    ///
    /// A ban implies the platform restriction also stops further sending, so
    /// no separate deletion is requested alongside it.
    fn actions_for(&self, event: &InboundEvent, verdict: Verdict) -> Vec<Action> {
        let mut actions = Vec::new();

        match verdict {
            Verdict::Clean => {
                debug!("clean message from user {} in chat {}", event.user_id, event.chat_id);
            }
            Verdict::NotifyWarn { reason, count, limit } => {
                actions.push(Action::Warn {
                    chat_id: event.chat_id,
                    user_id: event.user_id,
                    reason,
                    count,
                    limit,
                    flood: false,
                });
            }
            Verdict::DeleteAndWarn { reason, count, limit } => {
                if let Some(message_id) = event.message_id {
                    actions.push(Action::DeleteMessage {
                        chat_id: event.chat_id,
                        message_id,
                    });
                }
                actions.push(Action::Warn {
                    chat_id: event.chat_id,
                    user_id: event.user_id,
                    reason,
                    count,
                    limit,
                    flood: false,
                });
            }
            Verdict::FloodWarn { count, limit } => {
                if let Some(message_id) = event.message_id {
                    actions.push(Action::DeleteMessage {
                        chat_id: event.chat_id,
                        message_id,
                    });
                }
                actions.push(Action::Warn {
                    chat_id: event.chat_id,
                    user_id: event.user_id,
                    reason: FLOOD_REASON.to_string(),
                    count,
                    limit,
                    flood: true,
                });
            }
            Verdict::Ban { reason, duration_secs } | Verdict::FloodBan { reason, duration_secs } => {
                actions.push(Action::Ban {
                    chat_id: event.chat_id,
                    user_id: event.user_id,
                    reason,
                    until: duration_secs
                        .map(|secs| event.timestamp + chrono::Duration::seconds(secs as i64)),
                });
            }
        }

        if !actions.is_empty() {
            info!(
                "moderation produced {} action(s) for user {} in chat {}",
                actions.len(),
                event.user_id,
                event.chat_id
            );
        }

        actions
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    use chrono::TimeZone;

    use super::*;
    use crate::config::ModerationDefaults;
    use crate::database::models::{BanRecord, BanStatus, ChatConfig, ChatConfigPatch, WarningRecord};
    use crate::moderation::RateTracker;
    use crate::moderation::stores::StoreError;

    struct MemConfigStore {
        config: Mutex<ChatConfig>,
    }

    impl MemConfigStore {
        fn new(config: ChatConfig) -> Self {
            Self {
                config: Mutex::new(config),
            }
        }
    }

    impl ConfigStore for MemConfigStore {
        async fn get(&self, _chat_id: i64) -> Result<ChatConfig, StoreError> {
            Ok(self.config.lock().unwrap().clone())
        }

        async fn update(
            &self,
            _chat_id: i64,
            patch: ChatConfigPatch,
        ) -> Result<ChatConfig, StoreError> {
            let mut config = self.config.lock().unwrap();
            config.apply(patch);
            Ok(config.clone())
        }
    }

    #[derive(Default)]
    struct MemWarningStore {
        records: Mutex<Vec<WarningRecord>>,
        /// Number of leading add calls that fail, for retry tests.
        failures_left: AtomicU32,
    }

    impl WarningStore for MemWarningStore {
        async fn add(
            &self,
            chat_id: i64,
            user_id: u64,
            reason: &str,
            issued_by: u64,
            timestamp: DateTime<Utc>,
        ) -> Result<String, StoreError> {
            if self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(StoreError::Unavailable("injected failure".to_string()));
            }

            let mut records = self.records.lock().unwrap();
            records.push(WarningRecord::new(chat_id, user_id, reason, issued_by, timestamp));
            Ok(format!("warn-{}", records.len()))
        }

        async fn count(&self, chat_id: i64, user_id: u64) -> Result<u32, StoreError> {
            Ok(self
                .records
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.chat_id == chat_id && r.user_id == user_id)
                .count() as u32)
        }

        async fn list(
            &self,
            chat_id: i64,
            user_id: u64,
        ) -> Result<Vec<WarningRecord>, StoreError> {
            let mut records: Vec<_> = self
                .records
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.chat_id == chat_id && r.user_id == user_id)
                .cloned()
                .collect();
            records.reverse();
            Ok(records)
        }

        async fn clear(&self, chat_id: i64, user_id: u64) -> Result<u64, StoreError> {
            let mut records = self.records.lock().unwrap();
            let before = records.len();
            records.retain(|r| !(r.chat_id == chat_id && r.user_id == user_id));
            Ok((before - records.len()) as u64)
        }
    }

    #[derive(Default)]
    struct MemBanStore {
        records: Mutex<Vec<BanRecord>>,
    }

    impl BanStore for MemBanStore {
        async fn add(
            &self,
            chat_id: i64,
            user_id: u64,
            reason: &str,
            issued_by: u64,
            duration_secs: Option<u64>,
            timestamp: DateTime<Utc>,
        ) -> Result<(), StoreError> {
            self.records.lock().unwrap().push(BanRecord::new(
                chat_id,
                user_id,
                reason,
                issued_by,
                duration_secs,
                timestamp,
            ));
            Ok(())
        }

        async fn status(&self, chat_id: i64, user_id: u64) -> Result<BanStatus, StoreError> {
            let records = self.records.lock().unwrap();
            let latest = records
                .iter()
                .filter(|r| r.chat_id == chat_id && r.user_id == user_id)
                .next_back();
            Ok(BanStatus::from_latest(latest, Utc::now()))
        }
    }

    const CHAT: i64 = -1000;
    const USER: u64 = 42;
    const BOT: u64 = 99;

    type TestService = ModerationService<MemConfigStore, MemWarningStore, MemBanStore, RateTracker>;

    struct Fixture {
        service: Arc<TestService>,
        warnings: Arc<MemWarningStore>,
        bans: Arc<MemBanStore>,
    }

    fn fixture(config: ChatConfig) -> Fixture {
        fixture_with_warnings(config, MemWarningStore::default())
    }

    fn fixture_with_warnings(config: ChatConfig, warnings: MemWarningStore) -> Fixture {
        let warnings = Arc::new(warnings);
        let bans = Arc::new(MemBanStore::default());
        let service = Arc::new(ModerationService::new(
            Arc::new(MemConfigStore::new(config)),
            warnings.clone(),
            bans.clone(),
            Arc::new(RateTracker::new()),
            ContentClassifier::default(),
            BOT,
        ));
        Fixture {
            service,
            warnings,
            bans,
        }
    }

    fn test_config() -> ChatConfig {
        let mut config = ChatConfig::with_defaults(CHAT, &ModerationDefaults::default());
        // Keep the flood path quiet unless a test wants it.
        config.flood_threshold = 50;
        config
    }

    fn event_at(secs: i64, text: &str) -> InboundEvent {
        InboundEvent {
            chat_id: CHAT,
            user_id: USER,
            message_id: Some(secs as i32),
            text: Some(text.to_string()),
            timestamp: Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap(),
            is_command: false,
        }
    }

    fn warn_action(actions: &[Action]) -> Option<(&String, u32, u32, bool)> {
        actions.iter().find_map(|a| match a {
            Action::Warn {
                reason,
                count,
                limit,
                flood,
                ..
            } => Some((reason, *count, *limit, *flood)),
            _ => None,
        })
    }

    #[tokio::test]
    async fn commands_are_not_moderated() {
        let fx = fixture(test_config());
        let mut event = event_at(0, "/ban @someone");
        event.is_command = true;

        let actions = fx.service.process_event(&event).await.unwrap();
        assert!(actions.is_empty());
        assert_eq!(fx.warnings.count(CHAT, USER).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn clean_and_empty_messages_produce_no_actions() {
        let fx = fixture(test_config());

        let actions = fx
            .service
            .process_event(&event_at(0, "hello there, nice day"))
            .await
            .unwrap();
        assert!(actions.is_empty());

        let mut event = event_at(1, "");
        event.text = None;
        let actions = fx.service.process_event(&event).await.unwrap();
        assert!(actions.is_empty());

        assert_eq!(fx.warnings.count(CHAT, USER).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn profanity_deletes_and_warns_then_bans_at_limit() {
        let fx = fixture(test_config()); // warn_limit = 3

        // Spread events out so the flood window never accumulates.
        let actions = fx
            .service
            .process_event(&event_at(0, "fuck this"))
            .await
            .unwrap();
        assert!(matches!(actions[0], Action::DeleteMessage { .. }));
        let (reason, count, limit, flood) = warn_action(&actions).unwrap();
        assert!(reason.contains("profanity"));
        assert_eq!((count, limit, flood), (1, 3, false));

        let actions = fx
            .service
            .process_event(&event_at(60, "shit again"))
            .await
            .unwrap();
        let (_, count, _, _) = warn_action(&actions).unwrap();
        assert_eq!(count, 2);
        assert!(!actions.iter().any(|a| matches!(a, Action::Ban { .. })));

        let actions = fx
            .service
            .process_event(&event_at(120, "damn it"))
            .await
            .unwrap();
        assert_eq!(actions.len(), 1);
        match &actions[0] {
            Action::Ban { until, reason, .. } => {
                // Default ban duration is 3600s from the event timestamp.
                let expected = event_at(120, "").timestamp + chrono::Duration::seconds(3600);
                assert_eq!(*until, Some(expected));
                assert!(reason.contains("repeated violations"));
            }
            other => panic!("expected ban, got {other:?}"),
        }

        assert_eq!(fx.warnings.count(CHAT, USER).await.unwrap(), 3);
        assert_eq!(fx.bans.records.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn toxic_without_spam_or_profanity_warns_without_deleting() {
        let fx = fixture(test_config());

        let actions = fx
            .service
            .process_event(&event_at(0, "you should die"))
            .await
            .unwrap();

        assert_eq!(actions.len(), 1);
        let (reason, _, _, flood) = warn_action(&actions).unwrap();
        assert!(reason.contains("harassment language"));
        assert!(!flood);
        assert!(!actions.iter().any(|a| matches!(a, Action::DeleteMessage { .. })));
    }

    #[tokio::test]
    async fn flood_skips_content_classification() {
        let mut config = test_config();
        config.warn_limit = 5;
        config.flood_threshold = 3;
        config.flood_window_secs = 10;
        let fx = fixture(config);

        // Profane text: if the classifier ran, the reason would say so.
        fx.service.process_event(&event_at(0, "fuck")).await.unwrap();
        fx.service.process_event(&event_at(1, "fuck")).await.unwrap();
        let actions = fx.service.process_event(&event_at(2, "fuck")).await.unwrap();

        let (reason, count, _, flood) = warn_action(&actions).unwrap();
        assert_eq!(reason, "flood");
        assert!(flood);
        assert_eq!(count, 3); // two content warnings + one flood warning

        let warnings = fx.warnings.list(CHAT, USER).await.unwrap();
        assert_eq!(warnings[0].reason, "flood");
    }

    #[tokio::test]
    async fn flood_ban_fires_when_limit_reached() {
        let mut config = test_config();
        config.warn_limit = 1;
        config.flood_threshold = 2;
        config.flood_window_secs = 10;
        let fx = fixture(config);

        fx.service.process_event(&event_at(0, "hi")).await.unwrap();
        let actions = fx.service.process_event(&event_at(1, "hi")).await.unwrap();

        assert_eq!(actions.len(), 1);
        assert!(matches!(actions[0], Action::Ban { .. }));
        assert_eq!(fx.bans.records.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn disabled_ai_moderation_ignores_content() {
        let mut config = test_config();
        config.ai_moderation_enabled = false;
        let fx = fixture(config);

        let actions = fx
            .service
            .process_event(&event_at(0, "fuck shit damn"))
            .await
            .unwrap();

        assert!(actions.is_empty());
        assert_eq!(fx.warnings.count(CHAT, USER).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn transient_warning_write_failures_are_retried() {
        let warnings = MemWarningStore {
            failures_left: AtomicU32::new(2),
            ..Default::default()
        };
        let fx = fixture_with_warnings(test_config(), warnings);

        let actions = fx
            .service
            .process_event(&event_at(0, "fuck this"))
            .await
            .unwrap();

        assert!(warn_action(&actions).is_some());
        assert_eq!(fx.warnings.count(CHAT, USER).await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_violations_serialize_and_ban_once() {
        let mut config = test_config();
        config.warn_limit = 5;
        let fx = fixture(config);

        // Timestamps near the wall clock so recorded bans read as active,
        // spaced far apart so the flood path stays quiet.
        let base = Utc::now();
        let mut handles = Vec::new();
        for i in 0..8i64 {
            let service = fx.service.clone();
            let event = InboundEvent {
                timestamp: base + chrono::Duration::seconds(i * 120),
                ..event_at(i, "fuck this")
            };
            handles.push(tokio::spawn(async move {
                service.process_event(&event).await.unwrap()
            }));
        }

        let mut ban_actions = 0;
        for handle in handles {
            let actions = handle.await.unwrap();
            ban_actions += actions
                .iter()
                .filter(|a| matches!(a, Action::Ban { .. }))
                .count();
        }

        // Every successful add is visible in the count...
        assert_eq!(fx.warnings.count(CHAT, USER).await.unwrap(), 8);
        // ...and exactly one ban record exists even though several
        // evaluations crossed the limit.
        assert_eq!(fx.bans.records.lock().unwrap().len(), 1);
        assert!(ban_actions >= 1);
    }
}
