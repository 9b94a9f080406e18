//! Permission system for checking user roles.
//!
//! Admin lookups hit the Telegram API, so results are cached with a short
//! TTL. Bot owners (from OWNER_IDS) bypass all permission checks.

mod checker;

pub use checker::{AdminInfo, Permissions};
