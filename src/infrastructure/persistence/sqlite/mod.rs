//! SQLite Persistence - SQLite 数据库持久化实现

mod database;
mod playlist_record_repo;

pub use database::*;
pub use playlist_record_repo::*;
