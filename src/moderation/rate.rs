//! Per-(chat, user) sliding-window message rate tracking.
//!
//! In-memory over dashmap. Counts are a heuristic trigger, not a
//! billing-grade tally: small over/undercounts during concurrent writes to
//! the same key are acceptable. A periodic sweep bounds memory by evicting
//! events older than a fixed retention horizon, independent of any single
//! chat's configured window.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;

use super::stores::{EventSink, StoreError};

/// Events older than this are evictable regardless of chat windows.
const RETENTION_SECS: i64 = 24 * 3600;

/// How often the background sweep runs.
const SWEEP_INTERVAL: Duration = Duration::from_secs(600);

type PairKey = (i64, u64);

/// Sliding-window message counter.
#[derive(Clone, Default)]
pub struct RateTracker {
    events: Arc<DashMap<PairKey, Vec<DateTime<Utc>>>>,
}

impl RateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message event for the pair.
    ///
    /// Opportunistically prunes events already past the retention horizon so
    /// hot keys stay small between sweeps.
    pub fn record_event(&self, chat_id: i64, user_id: u64, timestamp: DateTime<Utc>) {
        let horizon = timestamp - chrono::Duration::seconds(RETENTION_SECS);
        let mut entry = self.events.entry((chat_id, user_id)).or_default();
        entry.retain(|&t| t > horizon);
        entry.push(timestamp);
    }

    /// Count events for the pair with a timestamp at or after `since`.
    pub fn count_in_window(&self, chat_id: i64, user_id: u64, since: DateTime<Utc>) -> u32 {
        self.events
            .get(&(chat_id, user_id))
            .map(|times| times.iter().filter(|&&t| t >= since).count() as u32)
            .unwrap_or(0)
    }

    /// Evict all events older than the retention horizon; drops empty keys.
    pub fn sweep(&self, now: DateTime<Utc>) {
        let horizon = now - chrono::Duration::seconds(RETENTION_SECS);
        self.events.retain(|_, times| {
            times.retain(|&t| t > horizon);
            !times.is_empty()
        });
        debug!("rate tracker sweep complete, {} keys live", self.events.len());
    }

    /// Spawn the periodic background sweep.
    pub fn spawn_sweeper(&self) {
        let tracker = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SWEEP_INTERVAL);
            // The first tick fires immediately; harmless.
            loop {
                interval.tick().await;
                tracker.sweep(Utc::now());
            }
        });
    }
}

impl EventSink for RateTracker {
    async fn record(
        &self,
        chat_id: i64,
        user_id: u64,
        timestamp: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.record_event(chat_id, user_id, timestamp);
        Ok(())
    }

    async fn count_since(
        &self,
        chat_id: i64,
        user_id: u64,
        since: DateTime<Utc>,
    ) -> Result<u32, StoreError> {
        Ok(self.count_in_window(chat_id, user_id, since))
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
    fn counts_only_events_inside_window() {
        let tracker = RateTracker::new();
        let base = at(1_000_000);

        for offset in [0, 2, 4, 30] {
            tracker.record_event(-1, 7, base + chrono::Duration::seconds(offset));
        }

        // Window covering the last 10 seconds from t=+34.
        let since = base + chrono::Duration::seconds(24);
        assert_eq!(tracker.count_in_window(-1, 7, since), 1);

        // Window covering everything.
        assert_eq!(tracker.count_in_window(-1, 7, base), 4);
    }

    #[test]
    fn pairs_are_independent() {
        let tracker = RateTracker::new();
        let base = at(1_000_000);

        tracker.record_event(-1, 7, base);
        tracker.record_event(-1, 8, base);
        tracker.record_event(-2, 7, base);

        assert_eq!(tracker.count_in_window(-1, 7, base), 1);
        assert_eq!(tracker.count_in_window(-1, 8, base), 1);
        assert_eq!(tracker.count_in_window(-2, 7, base), 1);
        assert_eq!(tracker.count_in_window(-3, 7, base), 0);
    }

    #[test]
    fn sweep_evicts_past_retention_horizon() {
        let tracker = RateTracker::new();
        let base = at(1_000_000);

        tracker.record_event(-1, 7, base);
        tracker.record_event(-1, 7, base + chrono::Duration::seconds(RETENTION_SECS));

        tracker.sweep(base + chrono::Duration::seconds(RETENTION_SECS));

        // The old event is gone, the fresh one survives.
        assert_eq!(tracker.count_in_window(-1, 7, base), 1);
    }
}
