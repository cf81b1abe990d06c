#![allow(dead_code)]

use std::sync::Arc;

use recent_rides::config::{Config, CopierConfig, ExpiryConfig, ServerConfig, StoreConfig};
use recent_rides::error::{Error, Result};
use recent_rides::store::{Document, DocumentStore, SqliteStore, WriteBatch};
use serde_json::{json, Value};
use tempfile::TempDir;

pub const MINUTE_MS: u64 = 60_000;

pub const SOURCE: &str = "ride_requests";
pub const RECENT: &str = "recent_ride_requests";

pub fn setup_store() -> (Arc<SqliteStore>, TempDir) {
    let temp_dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open(&temp_dir.path().join("rides.db"), 1_000).unwrap();
    (Arc::new(store), temp_dir)
}

pub fn test_config(copier: CopierConfig) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            status_port: 0,
            status_enabled: false,
            log_level: "debug".to_string(),
        },
        store: StoreConfig {
            path: "./unused.db".into(),
            busy_timeout_ms: 1_000,
        },
        copier,
        expiry: ExpiryConfig {
            sweep_enabled: true,
            sweep_interval_secs: 60,
        },
    }
}

pub fn ride(id: &str, created_at: u64) -> Document {
    ride_with(id, created_at, json!({ "pickup": "Seoul Station", "dropoff": "Gangnam" }))
}

pub fn ride_with(id: &str, created_at: u64, extra: Value) -> Document {
    let mut fields = match extra {
        Value::Object(fields) => fields,
        _ => panic!("ride fixture must be a JSON object"),
    };
    fields.insert("createdAt".to_string(), json!(created_at));
    Document::new(id, fields)
}

pub fn seed(store: &dyn DocumentStore, collection: &str, docs: Vec<Document>) {
    let mut batch = WriteBatch::new();
    for doc in docs {
        batch.set(collection, doc);
    }
    store.commit(batch).unwrap();
}

pub fn ids(docs: &[Document]) -> Vec<String> {
    docs.iter().map(|d| d.id.clone()).collect()
}

/// Delegates reads, rejects every commit, counts attempts.
pub struct FailingCommitStore {
    pub inner: Arc<SqliteStore>,
    pub commit_attempts: parking_lot::Mutex<usize>,
    /// Commits allowed through before failures start
    pub allow: usize,
}

impl FailingCommitStore {
    pub fn new(inner: Arc<SqliteStore>, allow: usize) -> Self {
        Self { inner, commit_attempts: parking_lot::Mutex::new(0), allow }
    }
}

impl DocumentStore for FailingCommitStore {
    fn query_since(&self, collection: &str, field: &str, since_ms: u64) -> Result<Vec<Document>> {
        self.inner.query_since(collection, field, since_ms)
    }

    fn commit(&self, batch: WriteBatch) -> Result<()> {
        let mut attempts = self.commit_attempts.lock();
        *attempts += 1;
        if *attempts > self.allow {
            return Err(Error::Write(rusqlite::Error::ExecuteReturnedResults));
        }
        self.inner.commit(batch)
    }

    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        self.inner.get(collection, id)
    }

    fn list(&self, collection: &str) -> Result<Vec<Document>> {
        self.inner.list(collection)
    }

    fn count(&self, collection: &str) -> Result<usize> {
        self.inner.count(collection)
    }

    fn delete_expired(&self, collection: &str, field: &str, now_ms: u64) -> Result<usize> {
        self.inner.delete_expired(collection, field, now_ms)
    }
}

/// Delegates everything, but every window query stalls for `delay` first.
pub struct SlowQueryStore {
    pub inner: Arc<SqliteStore>,
    pub delay: std::time::Duration,
}

impl DocumentStore for SlowQueryStore {
    fn query_since(&self, collection: &str, field: &str, since_ms: u64) -> Result<Vec<Document>> {
        std::thread::sleep(self.delay);
        self.inner.query_since(collection, field, since_ms)
    }

    fn commit(&self, batch: WriteBatch) -> Result<()> {
        self.inner.commit(batch)
    }

    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        self.inner.get(collection, id)
    }

    fn list(&self, collection: &str) -> Result<Vec<Document>> {
        self.inner.list(collection)
    }

    fn count(&self, collection: &str) -> Result<usize> {
        self.inner.count(collection)
    }

    fn delete_expired(&self, collection: &str, field: &str, now_ms: u64) -> Result<usize> {
        self.inner.delete_expired(collection, field, now_ms)
    }
}
