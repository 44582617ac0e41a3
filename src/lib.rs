pub mod api;
pub mod config;
pub mod crypto;
pub mod db;
pub mod error;
pub mod matching;
pub mod relay;

/// Schema migrations embedded from `./migrations`.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
