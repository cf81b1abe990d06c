use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use rusqlite::Connection;
use tracing::{debug, info};

use super::sqlite::{self, init_db, exec_op};
use super::types::{Document, WriteBatch};
use crate::config::StoreConfig;
use crate::error::{Error, Result};

static CLIENT: OnceCell<Arc<SqliteStore>> = OnceCell::new();

/// Process-wide store client, opened on first use and kept for the life of the process.
pub fn shared(config: &StoreConfig) -> Result<Arc<SqliteStore>> {
    CLIENT
        .get_or_try_init(|| SqliteStore::open(&config.path, config.busy_timeout_ms).map(Arc::new))
        .cloned()
}

/// Blocking document store API. Callers on the async runtime go through `spawn_blocking`.
pub trait DocumentStore: Send + Sync {
    /// Documents whose integer `field` is `>= since_ms`.
    fn query_since(&self, collection: &str, field: &str, since_ms: u64) -> Result<Vec<Document>>;

    /// Applies every op of the batch in one transaction, or none of them.
    fn commit(&self, batch: WriteBatch) -> Result<()>;

    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    fn list(&self, collection: &str) -> Result<Vec<Document>>;

    fn count(&self, collection: &str) -> Result<usize>;

    /// Removes documents whose integer `field` is `<= now_ms`. Returns how many went.
    fn delete_expired(&self, collection: &str, field: &str, now_ms: u64) -> Result<usize>;
}

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path, busy_timeout_ms: u64) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    Error::Init(format!("cannot create store directory {:?}: {}", parent, e))
                })?;
            }
        }

        let conn = Connection::open(path)
            .map_err(|e| Error::Init(format!("cannot open store at {:?}: {}", path, e)))?;
        conn.busy_timeout(Duration::from_millis(busy_timeout_ms))
            .map_err(|e| Error::Init(format!("cannot set busy timeout: {}", e)))?;
        init_db(&conn)
            .map_err(|e| Error::Init(format!("cannot initialize schema at {:?}: {}", path, e)))?;

        info!("Document store opened at {:?}", path);
        Ok(Self { conn: Mutex::new(conn) })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Init(format!("cannot open in-memory store: {}", e)))?;
        init_db(&conn).map_err(|e| Error::Init(format!("cannot initialize schema: {}", e)))?;
        Ok(Self { conn: Mutex::new(conn) })
    }
}

impl DocumentStore for SqliteStore {
    fn query_since(&self, collection: &str, field: &str, since_ms: u64) -> Result<Vec<Document>> {
        let conn = self.conn.lock();
        sqlite::query_since(&conn, collection, field, since_ms)
    }

    fn commit(&self, batch: WriteBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(Error::Write)?;
        for op in batch.ops() {
            // Dropping `tx` on the error path rolls back everything staged so far
            exec_op(&tx, op).map_err(Error::Write)?;
        }
        tx.commit().map_err(Error::Write)?;

        debug!("Committed batch of {} writes", batch.len());
        Ok(())
    }

    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let conn = self.conn.lock();
        sqlite::load_one(&conn, collection, id)
    }

    fn list(&self, collection: &str) -> Result<Vec<Document>> {
        let conn = self.conn.lock();
        sqlite::load_all(&conn, collection)
    }

    fn count(&self, collection: &str) -> Result<usize> {
        let conn = self.conn.lock();
        sqlite::count(&conn, collection)
    }

    fn delete_expired(&self, collection: &str, field: &str, now_ms: u64) -> Result<usize> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(Error::Write)?;
        let removed = sqlite::delete_expired(&tx, collection, field, now_ms).map_err(Error::Write)?;
        tx.commit().map_err(Error::Write)?;
        Ok(removed)
    }
}
