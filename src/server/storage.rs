//! SQLite storage for shared trip documents.
//!
//! One row per trip id in `trip_documents`. Writes replace the whole
//! document; there is no history.

use chrono::Utc;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::models::{migrate_trip, MigrationError, Trip};

/// Opens (creating if needed) the database at `path` and runs migrations.
pub async fn init_db(path: &Path) -> Result<SqlitePool, ServerStorageError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| ServerStorageError::IoError(parent.to_path_buf(), e))?;
    }

    let db_url = format!("sqlite:{}?mode=rwc", path.display());
    let options = SqliteConnectOptions::from_str(&db_url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// An in-memory database, used by tests and throwaway servers.
///
/// Every SQLite in-memory connection is its own database, so the pool is
/// pinned to a single connection that is never recycled.
pub async fn init_memory_db() -> Result<SqlitePool, ServerStorageError> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?;

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

#[derive(sqlx::FromRow)]
struct DocumentRow {
    document: String,
}

#[derive(Debug, Clone)]
pub struct DocumentRepository {
    pool: SqlitePool,
}

impl DocumentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts or replaces the document for `trip.id`.
    pub async fn save(&self, trip: &Trip) -> Result<(), ServerStorageError> {
        let document = serde_json::to_string(trip).map_err(ServerStorageError::EncodeError)?;
        let updated_at = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO trip_documents (id, document, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                document = excluded.document,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&trip.id)
        .bind(&document)
        .bind(&updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get(&self, trip_id: &str) -> Result<Option<Trip>, ServerStorageError> {
        let row: Option<DocumentRow> =
            sqlx::query_as("SELECT document FROM trip_documents WHERE id = ?")
                .bind(trip_id)
                .fetch_optional(&self.pool)
                .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let value: Value =
            serde_json::from_str(&row.document).map_err(ServerStorageError::DecodeError)?;
        let trip = migrate_trip(value).map_err(ServerStorageError::MigrationError)?;
        Ok(Some(trip))
    }

    pub async fn count(&self) -> Result<i64, ServerStorageError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM trip_documents")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[derive(Debug)]
pub enum ServerStorageError {
    IoError(PathBuf, std::io::Error),
    DatabaseError(sqlx::Error),
    MigrateError(sqlx::migrate::MigrateError),
    EncodeError(serde_json::Error),
    DecodeError(serde_json::Error),
    MigrationError(MigrationError),
}

impl fmt::Display for ServerStorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerStorageError::IoError(path, e) => {
                write!(f, "I/O error for {}: {}", path.display(), e)
            }
            ServerStorageError::DatabaseError(e) => write!(f, "Database error: {}", e),
            ServerStorageError::MigrateError(e) => write!(f, "Migration failed: {}", e),
            ServerStorageError::EncodeError(e) => write!(f, "Failed to encode document: {}", e),
            ServerStorageError::DecodeError(e) => write!(f, "Failed to decode document: {}", e),
            ServerStorageError::MigrationError(e) => {
                write!(f, "Stored document is not a valid trip: {}", e)
            }
        }
    }
}

impl std::error::Error for ServerStorageError {}

impl From<sqlx::Error> for ServerStorageError {
    fn from(e: sqlx::Error) -> Self {
        ServerStorageError::DatabaseError(e)
    }
}

impl From<sqlx::migrate::MigrateError> for ServerStorageError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        ServerStorageError::MigrateError(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn trip(id: &str) -> Trip {
        let start = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 5, 3).unwrap();
        Trip::with_id(id, "Golden Week", "Sapporo", start, end).unwrap()
    }

    async fn test_repo() -> DocumentRepository {
        DocumentRepository::new(init_memory_db().await.unwrap())
    }

    #[tokio::test]
    async fn test_init_db_creates_tables() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("nested").join("documents.db");

        let pool = init_db(&db_path).await.unwrap();

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' AND name NOT LIKE '_sqlx_%' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();

        let table_names: Vec<&str> = tables.iter().map(|t| t.0.as_str()).collect();
        assert_eq!(table_names, vec!["trip_documents"]);
        assert!(db_path.exists());
    }

    #[tokio::test]
    async fn test_get_missing_document() {
        let repo = test_repo().await;
        assert!(repo.get("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_then_get() {
        let repo = test_repo().await;
        let trip = trip("t1");

        repo.save(&trip).await.unwrap();
        assert_eq!(repo.get("t1").await.unwrap(), Some(trip));
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let repo = test_repo().await;
        let mut trip = trip("t1");
        repo.save(&trip).await.unwrap();

        trip.memo = "second write".to_string();
        repo.save(&trip).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 1);
        assert_eq!(repo.get("t1").await.unwrap().unwrap().memo, "second write");
    }

    #[tokio::test]
    async fn test_legacy_document_is_migrated_on_read() {
        let repo = test_repo().await;
        sqlx::query("INSERT INTO trip_documents (id, document, updated_at) VALUES (?, ?, ?)")
            .bind("old")
            .bind(
                r#"{"id":"old","title":"Old","destination":"Nara","startDate":"2023-01-01","endDate":"2023-01-01","coverImageUrl":"x.png","days":[]}"#,
            )
            .bind("2023-01-01T00:00:00Z")
            .execute(&repo.pool)
            .await
            .unwrap();

        let trip = repo.get("old").await.unwrap().unwrap();
        assert_eq!(trip.memo, "");
        assert!(!trip.color.is_empty());
    }
}
