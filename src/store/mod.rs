//! Document store: JSON documents grouped in collections, backed by SQLite.

pub mod types;
pub mod sqlite;
pub mod document_store;

pub use document_store::{shared, DocumentStore, SqliteStore};
pub use types::{Document, WriteBatch, WriteOp};
