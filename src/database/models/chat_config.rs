//! Per-chat moderation configuration.
//!
//! Created lazily with global defaults on first access, mutated only through
//! validated partial updates, never deleted.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ModerationDefaults;

/// Valid range for the warning limit.
pub const WARN_LIMIT_RANGE: (u32, u32) = (1, 10);
/// Valid range for temporary ban durations, in seconds (1 min to 30 days).
pub const BAN_DURATION_RANGE: (u64, u64) = (60, 2_592_000);
/// Valid range for the flood message threshold.
pub const FLOOD_THRESHOLD_RANGE: (u32, u32) = (2, 50);
/// Valid range for the flood window, in seconds.
pub const FLOOD_WINDOW_RANGE: (u32, u32) = (1, 60);

/// Moderation configuration for a single chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Telegram chat ID (indexed).
    pub chat_id: i64,

    /// Warnings before a ban is issued.
    pub warn_limit: u32,

    /// Ban duration in seconds for automatic bans (None = permanent).
    pub ban_duration_secs: Option<u64>,

    /// Whether the content classifier runs on every message.
    pub ai_moderation_enabled: bool,

    /// Messages within the flood window that count as flooding.
    pub flood_threshold: u32,

    /// Flood window in seconds.
    pub flood_window_secs: u32,

    /// Whether flagged spam/profanity messages are deleted.
    #[serde(default = "default_true")]
    pub auto_delete_spam: bool,

    /// Chat rules shown via /rules.
    #[serde(default)]
    pub rules: Option<String>,

    /// Greeting for new members.
    #[serde(default)]
    pub welcome_text: Option<String>,
}

fn default_true() -> bool {
    true
}

impl ChatConfig {
    /// Create a config for a chat from the global defaults.
    pub fn with_defaults(chat_id: i64, defaults: &ModerationDefaults) -> Self {
        Self {
            chat_id,
            warn_limit: defaults.warn_limit,
            ban_duration_secs: defaults.ban_duration_secs,
            ai_moderation_enabled: defaults.ai_moderation_enabled,
            flood_threshold: defaults.flood_threshold,
            flood_window_secs: defaults.flood_window_secs,
            auto_delete_spam: true,
            rules: None,
            welcome_text: None,
        }
    }

    /// Apply a validated partial update, leaving untouched fields as-is.
    pub fn apply(&mut self, patch: ChatConfigPatch) {
        if let Some(limit) = patch.warn_limit {
            self.warn_limit = limit;
        }
        if let Some(duration) = patch.ban_duration_secs {
            self.ban_duration_secs = duration;
        }
        if let Some(enabled) = patch.ai_moderation_enabled {
            self.ai_moderation_enabled = enabled;
        }
        if let Some(threshold) = patch.flood_threshold {
            self.flood_threshold = threshold;
        }
        if let Some(window) = patch.flood_window_secs {
            self.flood_window_secs = window;
        }
        if let Some(auto_delete) = patch.auto_delete_spam {
            self.auto_delete_spam = auto_delete;
        }
        if let Some(rules) = patch.rules {
            self.rules = rules;
        }
        if let Some(welcome) = patch.welcome_text {
            self.welcome_text = welcome;
        }
    }
}

/// Validation failure for a config update.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("warn limit must be between {} and {}", WARN_LIMIT_RANGE.0, WARN_LIMIT_RANGE.1)]
    WarnLimit,
    #[error(
        "ban duration must be between {}s and {}s",
        BAN_DURATION_RANGE.0,
        BAN_DURATION_RANGE.1
    )]
    BanDuration,
    #[error(
        "flood threshold must be between {} and {} messages",
        FLOOD_THRESHOLD_RANGE.0,
        FLOOD_THRESHOLD_RANGE.1
    )]
    FloodThreshold,
    #[error(
        "flood window must be between {}s and {}s",
        FLOOD_WINDOW_RANGE.0,
        FLOOD_WINDOW_RANGE.1
    )]
    FloodWindow,
}

/// Partial update for a chat config.
///
/// The recognized optional fields and their valid ranges, validated once at
/// the admin-command boundary. The engine never re-validates.
///
/// `None` means "leave unchanged". For the nested options, `Some(None)` means
/// "clear" (permanent ban duration, remove rules/welcome text).
#[derive(Debug, Clone, Default)]
pub struct ChatConfigPatch {
    pub warn_limit: Option<u32>,
    pub ban_duration_secs: Option<Option<u64>>,
    pub ai_moderation_enabled: Option<bool>,
    pub flood_threshold: Option<u32>,
    pub flood_window_secs: Option<u32>,
    pub auto_delete_spam: Option<bool>,
    pub rules: Option<Option<String>>,
    pub welcome_text: Option<Option<String>>,
}

impl ChatConfigPatch {
    /// Check every set field against its valid range.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if let Some(limit) = self.warn_limit
            && !(WARN_LIMIT_RANGE.0..=WARN_LIMIT_RANGE.1).contains(&limit)
        {
            return Err(ConfigValidationError::WarnLimit);
        }

        if let Some(Some(duration)) = self.ban_duration_secs
            && !(BAN_DURATION_RANGE.0..=BAN_DURATION_RANGE.1).contains(&duration)
        {
            return Err(ConfigValidationError::BanDuration);
        }

        if let Some(threshold) = self.flood_threshold
            && !(FLOOD_THRESHOLD_RANGE.0..=FLOOD_THRESHOLD_RANGE.1).contains(&threshold)
        {
            return Err(ConfigValidationError::FloodThreshold);
        }

        if let Some(window) = self.flood_window_secs
            && !(FLOOD_WINDOW_RANGE.0..=FLOOD_WINDOW_RANGE.1).contains(&window)
        {
            return Err(ConfigValidationError::FloodWindow);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> ChatConfig {
        ChatConfig::with_defaults(-100, &ModerationDefaults::default())
    }

    #[test]
    fn patch_preserves_unset_fields() {
        let mut config = base_config();
        config.rules = Some("be nice".to_string());
        config.flood_threshold = 7;

        config.apply(ChatConfigPatch {
            warn_limit: Some(5),
            ..Default::default()
        });

        assert_eq!(config.warn_limit, 5);
        assert_eq!(config.rules.as_deref(), Some("be nice"));
        assert_eq!(config.flood_threshold, 7);
        assert!(config.ai_moderation_enabled);
    }

    #[test]
    fn patch_can_clear_ban_duration() {
        let mut config = base_config();
        assert_eq!(config.ban_duration_secs, Some(3600));

        config.apply(ChatConfigPatch {
            ban_duration_secs: Some(None),
            ..Default::default()
        });

        assert_eq!(config.ban_duration_secs, None);
    }

    #[test]
    fn validation_rejects_out_of_range_values() {
        let patch = ChatConfigPatch {
            warn_limit: Some(0),
            ..Default::default()
        };
        assert_eq!(patch.validate(), Err(ConfigValidationError::WarnLimit));

        let patch = ChatConfigPatch {
            warn_limit: Some(11),
            ..Default::default()
        };
        assert_eq!(patch.validate(), Err(ConfigValidationError::WarnLimit));

        let patch = ChatConfigPatch {
            ban_duration_secs: Some(Some(59)),
            ..Default::default()
        };
        assert_eq!(patch.validate(), Err(ConfigValidationError::BanDuration));

        let patch = ChatConfigPatch {
            flood_threshold: Some(51),
            flood_window_secs: Some(30),
            ..Default::default()
        };
        assert_eq!(patch.validate(), Err(ConfigValidationError::FloodThreshold));

        let patch = ChatConfigPatch {
            flood_window_secs: Some(0),
            ..Default::default()
        };
        assert_eq!(patch.validate(), Err(ConfigValidationError::FloodWindow));
    }

    #[test]
    fn validation_accepts_in_range_and_permanent() {
        let patch = ChatConfigPatch {
            warn_limit: Some(3),
            ban_duration_secs: Some(Some(3600)),
            flood_threshold: Some(5),
            flood_window_secs: Some(10),
            ..Default::default()
        };
        assert!(patch.validate().is_ok());

        // Permanent ban duration is not range-checked.
        let patch = ChatConfigPatch {
            ban_duration_secs: Some(None),
            ..Default::default()
        };
        assert!(patch.validate().is_ok());
    }
}
