//! Database module - MongoDB connection and data access.

pub mod models;
pub mod mongo;
pub mod repository;

pub use mongo::Database;
pub use repository::{BanRepository, ConfigRepository, WarningRepository};
