//! SQLite implementation of the BlobStore trait.
//!
//! This is the reference durable backend. It uses rusqlite with bundled
//! SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{Result, StoreError};
use crate::schema;
use crate::traits::{list_children, validate_path, BlobEntry, BlobStore};

/// SQLite-based blob store.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteBlobStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteBlobStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and the blob table if they don't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        schema::ensure(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::ensure(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a blocking operation on the connection off the async runtime.
    async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|e| StoreError::Task(format!("mutex poisoned: {}", e)))?;
            f(&conn)
        })
        .await
        .map_err(|e| StoreError::Task(format!("spawn_blocking failed: {}", e)))?
    }
}

#[async_trait]
impl BlobStore for SqliteBlobStore {
    async fn put(&self, path: &str, bytes: Bytes) -> Result<()> {
        validate_path(path)?;
        let path = path.to_string();

        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO blobs (path, data, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(path) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
                params![path, bytes.as_ref(), Utc::now().timestamp_millis()],
            )?;
            Ok(())
        })
        .await
    }

    async fn get(&self, path: &str) -> Result<Option<Bytes>> {
        let path = path.to_string();

        self.with_conn(move |conn| {
            let data: Option<Vec<u8>> = conn
                .query_row(
                    "SELECT data FROM blobs WHERE path = ?1",
                    params![path],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(data.map(Bytes::from))
        })
        .await
    }

    async fn list(&self, prefix: &str) -> Result<Vec<BlobEntry>> {
        let prefix = prefix.trim_end_matches('/').to_string();

        self.with_conn(move |conn| {
            let base = format!("{}/", prefix);
            let mut stmt = conn.prepare(
                "SELECT path FROM blobs WHERE substr(path, 1, length(?1)) = ?1 ORDER BY path",
            )?;
            let paths = stmt
                .query_map(params![base], |row| row.get::<_, String>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(list_children(&prefix, paths.iter().map(String::as_str)))
        })
        .await
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let path = path.to_string();

        self.with_conn(move |conn| {
            conn.execute("DELETE FROM blobs WHERE path = ?1", params![path])?;
            Ok(())
        })
        .await
    }
}
