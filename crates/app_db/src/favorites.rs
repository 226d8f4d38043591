//! Favorited media

use crate::{pool::conn, DbPool, Result};

/// A favorited item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoriteRecord {
    pub uri: String,
    pub mime: Option<String>,
    pub added_at: i64,
}

/// Favorites table operations
#[derive(Clone)]
pub struct FavoritesDb {
    pool: DbPool,
}

impl FavoritesDb {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Add a favorite. Returns `false` when it was already present.
    pub fn add(&self, uri: &str, mime: Option<&str>) -> Result<bool> {
        let conn = conn(&self.pool)?;

        let rows = conn.execute(
            "INSERT OR IGNORE INTO favorites (uri, mime) VALUES (?1, ?2)",
            rusqlite::params![uri, mime],
        )?;

        Ok(rows > 0)
    }

    /// Remove a favorite. Returns `false` when it was not present.
    pub fn remove(&self, uri: &str) -> Result<bool> {
        let conn = conn(&self.pool)?;
        let rows = conn.execute("DELETE FROM favorites WHERE uri = ?1", [uri])?;
        Ok(rows > 0)
    }

    pub fn contains(&self, uri: &str) -> Result<bool> {
        let conn = conn(&self.pool)?;
        let found: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM favorites WHERE uri = ?1)",
            [uri],
            |row| row.get(0),
        )?;
        Ok(found)
    }

    /// All favorites, most recent first
    pub fn list(&self) -> Result<Vec<FavoriteRecord>> {
        let conn = conn(&self.pool)?;

        let mut stmt = conn.prepare(
            "SELECT uri, mime, added_at FROM favorites ORDER BY added_at DESC, favorite_id DESC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(FavoriteRecord {
                uri: row.get(0)?,
                mime: row.get(1)?,
                added_at: row.get(2)?,
            })
        })?;

        let mut favorites = Vec::new();
        for row in rows {
            favorites.push(row?);
        }

        Ok(favorites)
    }

    pub fn count(&self) -> Result<usize> {
        let conn = conn(&self.pool)?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM favorites", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{migrate, pool::init_pool};

    #[test]
    fn test_favorites_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let pool = init_pool(&dir.path().join("fav.db")).unwrap();
        migrate(&pool).unwrap();
        let favorites = FavoritesDb::new(pool);

        assert!(favorites.add("file:///a.jpg", Some("image/jpeg")).unwrap());
        assert!(!favorites.add("file:///a.jpg", Some("image/jpeg")).unwrap());
        assert!(favorites.add("file:///b.mp4", None).unwrap());

        assert!(favorites.contains("file:///a.jpg").unwrap());
        assert_eq!(favorites.count().unwrap(), 2);

        let listed = favorites.list().unwrap();
        assert_eq!(listed[0].uri, "file:///b.mp4");
        assert_eq!(listed[1].mime.as_deref(), Some("image/jpeg"));

        assert!(favorites.remove("file:///a.jpg").unwrap());
        assert!(!favorites.remove("file:///a.jpg").unwrap());
        assert!(!favorites.contains("file:///a.jpg").unwrap());
    }
}
