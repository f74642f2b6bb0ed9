//! Blob table schema, tracked with SQLite's `user_version`.

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Schema version this build writes.
pub const SCHEMA_VERSION: u32 = 1;

/// Create the blob table on a fresh database; accept one already at
/// [`SCHEMA_VERSION`].
pub(crate) fn ensure(conn: &Connection) -> Result<()> {
    let version: u32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    match version {
        0 => {
            conn.execute_batch(
                "BEGIN;
                 CREATE TABLE blobs (
                     path TEXT PRIMARY KEY,
                     data BLOB NOT NULL,
                     updated_at INTEGER NOT NULL
                 );
                 PRAGMA user_version = 1;
                 COMMIT;",
            )?;
            tracing::debug!(version = SCHEMA_VERSION, "created blob schema");
            Ok(())
        }
        SCHEMA_VERSION => Ok(()),
        newer => Err(StoreError::Schema(format!(
            "database is at schema version {newer}, this build supports {SCHEMA_VERSION}"
        ))),
    }
}
