//! Database models.

mod ban;
mod chat_config;
mod warning;

pub use ban::{BanRecord, BanStatus};
pub use chat_config::{ChatConfig, ChatConfigPatch, ConfigValidationError};
pub use warning::WarningRecord;
