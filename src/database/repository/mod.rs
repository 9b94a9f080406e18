//! Repository module - per-collection data access layer.

mod ban_repository;
mod config_repository;
mod warning_repository;

pub use ban_repository::BanRepository;
pub use config_repository::ConfigRepository;
pub use warning_repository::WarningRepository;
