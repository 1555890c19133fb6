//! SQLite-backed document store via libsql. Implements DocumentStore.
//!
//! Single `documents` table keyed by (collection, id); the payload is a JSON object
//! and ordered reads use `json_extract`. All collections share one database file:
//! data/checkin.db

use super::{MonotonicClock, new_document_id};
use crate::domain::DomainError;
use crate::ports::{Document, DocumentStore, Fields, Query, TIMESTAMP_FIELD};
use chrono::{DateTime, Utc};
use libsql::{Database, params};
use std::path::{Path, PathBuf};
use tokio::sync::broadcast;
use tracing::{debug, info};

const DOCUMENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,
    id TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    data TEXT NOT NULL,
    PRIMARY KEY (collection, id)
)"#;
const DOCUMENTS_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_documents_collection_created ON documents (collection, created_at)";

const CHANGE_BUFFER: usize = 64;

fn store_err(e: impl std::fmt::Display) -> DomainError {
    DomainError::Store(e.to_string())
}

/// Sort keys go into a JSON path; keep them to plain identifiers.
fn json_path(field: &str) -> Result<String, DomainError> {
    if field.is_empty() || !field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(DomainError::Store(format!("invalid sort field: {:?}", field)));
    }
    Ok(format!("$.{}", field))
}

/// SQLite document store. One database file (checkin.db) in the given base directory.
pub struct SqliteDocumentStore {
    db: Database,
    db_path: PathBuf,
    clock: MonotonicClock,
    changes: broadcast::Sender<String>,
}

impl SqliteDocumentStore {
    /// Connect to (or create) the database and ensure the schema exists.
    /// Call this once at startup; the returned store is safe to share via Arc.
    ///
    /// Sets WAL mode and synchronous=NORMAL so the admin views can read while check-ins write.
    pub async fn connect(base_dir: impl AsRef<Path>) -> Result<Self, DomainError> {
        let base = base_dir.as_ref();
        std::fs::create_dir_all(base).map_err(store_err)?;
        let db_path = base.join("checkin.db");
        let path_str = db_path.to_string_lossy();
        let db = libsql::Builder::new_local(path_str.as_ref())
            .build()
            .await
            .map_err(store_err)?;
        let conn = db.connect().map_err(store_err)?;

        // PRAGMA returns a row (new value); use query and consume rows (execute fails when rows are returned).
        let mut wal_rows = conn
            .query("PRAGMA journal_mode=WAL", ())
            .await
            .map_err(|e| DomainError::Store(format!("WAL pragma failed: {}", e)))?;
        while wal_rows.next().await.map_err(store_err)?.is_some() {}
        let mut sync_rows = conn
            .query("PRAGMA synchronous=NORMAL", ())
            .await
            .map_err(|e| DomainError::Store(format!("synchronous pragma failed: {}", e)))?;
        while sync_rows.next().await.map_err(store_err)?.is_some() {}

        conn.execute(DOCUMENTS_TABLE, ()).await.map_err(store_err)?;
        conn.execute(DOCUMENTS_INDEX, ()).await.map_err(store_err)?;

        info!(path = %db_path.display(), "SQLite document store connected (WAL)");

        let (changes, _) = broadcast::channel(CHANGE_BUFFER);
        Ok(Self {
            db,
            db_path,
            clock: MonotonicClock::default(),
            changes,
        })
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn notify(&self, collection: &str) {
        // No receivers is fine: nobody is watching.
        let _ = self.changes.send(collection.to_string());
    }

    fn row_to_document(row: &libsql::Row) -> Result<Document, DomainError> {
        let id: String = row.get(0).map_err(store_err)?;
        let created_micros: i64 = row.get(1).map_err(store_err)?;
        let data: String = row.get(2).map_err(store_err)?;
        let created_at = DateTime::<Utc>::from_timestamp_micros(created_micros)
            .ok_or_else(|| DomainError::Store(format!("bad timestamp on document {}", id)))?;
        let data: Fields = serde_json::from_str(&data)
            .map_err(|e| DomainError::Store(format!("malformed document {}: {}", id, e)))?;
        Ok(Document {
            id,
            created_at,
            data,
        })
    }
}

#[async_trait::async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn create(&self, collection: &str, data: Fields) -> Result<Document, DomainError> {
        let doc = Document {
            id: new_document_id(),
            created_at: self.clock.now(),
            data,
        };
        let json = serde_json::to_string(&doc.data).map_err(store_err)?;
        let conn = self.db.connect().map_err(store_err)?;
        conn.execute(
            "INSERT INTO documents (collection, id, created_at, data) VALUES (?1, ?2, ?3, ?4)",
            params![
                collection,
                doc.id.as_str(),
                doc.created_at.timestamp_micros(),
                json
            ],
        )
        .await
        .map_err(store_err)?;
        debug!(collection, id = %doc.id, "document created");
        self.notify(collection);
        Ok(doc)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, DomainError> {
        let conn = self.db.connect().map_err(store_err)?;
        let mut rows = conn
            .query(
                "SELECT id, created_at, data FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection, id],
            )
            .await
            .map_err(store_err)?;
        match rows.next().await.map_err(store_err)? {
            Some(row) => Ok(Some(Self::row_to_document(&row)?)),
            None => Ok(None),
        }
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), DomainError> {
        let conn = self.db.connect().map_err(store_err)?;
        let tx = conn.transaction().await.map_err(store_err)?;
        let mut rows = tx
            .query(
                "SELECT data FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection, id],
            )
            .await
            .map_err(store_err)?;
        let current: String = match rows.next().await.map_err(store_err)? {
            Some(row) => row.get(0).map_err(store_err)?,
            None => {
                return Err(DomainError::NotFound(format!("{}/{}", collection, id)));
            }
        };
        drop(rows);
        let mut data: Fields = serde_json::from_str(&current)
            .map_err(|e| DomainError::Store(format!("malformed document {}: {}", id, e)))?;
        data.extend(fields);
        let json = serde_json::to_string(&data).map_err(store_err)?;
        tx.execute(
            "UPDATE documents SET data = ?3 WHERE collection = ?1 AND id = ?2",
            params![collection, id, json],
        )
        .await
        .map_err(store_err)?;
        tx.commit().await.map_err(store_err)?;
        debug!(collection, id, "document updated");
        self.notify(collection);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), DomainError> {
        let conn = self.db.connect().map_err(store_err)?;
        let affected = conn
            .execute(
                "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection, id],
            )
            .await
            .map_err(store_err)?;
        if affected == 0 {
            return Err(DomainError::NotFound(format!("{}/{}", collection, id)));
        }
        debug!(collection, id, "document deleted");
        self.notify(collection);
        Ok(())
    }

    async fn query(&self, query: &Query) -> Result<Vec<Document>, DomainError> {
        let dir = query.direction.as_sql();
        let limit = query.limit.map(|l| l as i64).unwrap_or(-1);
        let conn = self.db.connect().map_err(store_err)?;
        let mut rows = if query.order_by == TIMESTAMP_FIELD {
            let sql = format!(
                "SELECT id, created_at, data FROM documents WHERE collection = ?1 \
                 ORDER BY created_at {dir}, id {dir} LIMIT ?2"
            );
            conn.query(&sql, params![query.collection.as_str(), limit])
                .await
                .map_err(store_err)?
        } else {
            let path = json_path(&query.order_by)?;
            let sql = format!(
                "SELECT id, created_at, data FROM documents WHERE collection = ?1 \
                 ORDER BY (json_extract(data, ?2) IS NULL) {dir}, json_extract(data, ?2) {dir}, \
                 created_at {dir}, id {dir} LIMIT ?3"
            );
            conn.query(&sql, params![query.collection.as_str(), path, limit])
                .await
                .map_err(store_err)?
        };
        let mut docs = Vec::new();
        while let Some(row) = rows.next().await.map_err(store_err)? {
            docs.push(Self::row_to_document(&row)?);
        }
        Ok(docs)
    }

    fn changes(&self) -> broadcast::Receiver<String> {
        self.changes.subscribe()
    }
}
