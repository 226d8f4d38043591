//! PhotoReviewer Database Layer
//!
//! Provides:
//! - SQLite connection pool and schema migrations
//! - Persistent counters (deletion statistics)
//! - Favorites

mod schema;
mod pool;
mod counters;
mod favorites;

pub use counters::{CounterStore, SqliteCounterStore, MemoryCounterStore, keys};
pub use favorites::{FavoritesDb, FavoriteRecord};
pub use pool::{DbPool, init_pool};
pub use schema::migrate;

use std::path::{Path, PathBuf};
use directories::ProjectDirs;
use thiserror::Error;

/// Database errors
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DbError>;

/// Get the database directory
pub fn db_dir() -> PathBuf {
    ProjectDirs::from("com", "PhotoReviewer", "PhotoReviewer")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./data"))
}

/// Initialize the database in the platform data directory
pub fn init() -> Result<DbPool> {
    init_at(&db_dir())
}

/// Initialize the database inside `dir`
pub fn init_at(dir: &Path) -> Result<DbPool> {
    std::fs::create_dir_all(dir)?;

    let sqlite_path = dir.join("reviewer.db");
    let pool = init_pool(&sqlite_path)?;
    migrate(&pool)?;

    tracing::info!("Database initialized at {:?}", sqlite_path);
    Ok(pool)
}
