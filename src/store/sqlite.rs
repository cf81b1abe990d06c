use rusqlite::{params, Connection, OptionalExtension, Transaction};
use serde_json::Value;

use super::types::{Document, WriteOp};
use crate::error::{Error, Result};

pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA cache_size = -16000;
         PRAGMA temp_store = MEMORY;
         ",
    )?;

    // One table for every collection; body holds the JSON object
    conn.execute(
        "CREATE TABLE IF NOT EXISTS documents (
            collection TEXT NOT NULL,
            id TEXT NOT NULL,
            body TEXT NOT NULL,
            PRIMARY KEY (collection, id)
        )",
        [],
    )?;

    Ok(())
}

pub fn exec_op(tx: &Transaction, op: &WriteOp) -> rusqlite::Result<()> {
    match op {
        WriteOp::Set { collection, doc } => {
            let body = Value::Object(doc.fields.clone()).to_string();
            let mut stmt = tx.prepare_cached(
                "INSERT INTO documents (collection, id, body) VALUES (?1, ?2, ?3)
                 ON CONFLICT (collection, id) DO UPDATE SET body = excluded.body",
            )?;
            stmt.execute(params![collection, doc.id, body])?;
        }
    }
    Ok(())
}

/// Inclusive lower bound on a numeric body field, oldest first.
pub fn query_since(
    conn: &Connection,
    collection: &str,
    field: &str,
    since_ms: u64,
) -> Result<Vec<Document>> {
    let path = json_path(field);
    let read_err = |source: rusqlite::Error| Error::Read {
        collection: collection.to_string(),
        source,
    };

    let mut stmt = conn
        .prepare_cached(
            "SELECT id, body FROM documents
             WHERE collection = ?1
               AND json_type(body, ?2) = 'integer'
               AND json_extract(body, ?2) >= ?3
             ORDER BY json_extract(body, ?2) ASC, id ASC",
        )
        .map_err(read_err)?;

    let rows = stmt
        .query_map(params![collection, path, to_sql_ms(since_ms)], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })
        .map_err(read_err)?;

    let mut docs = Vec::new();
    for row in rows {
        let (id, body) = row.map_err(read_err)?;
        docs.push(decode(collection, id, &body)?);
    }
    Ok(docs)
}

pub fn load_all(conn: &Connection, collection: &str) -> Result<Vec<Document>> {
    let read_err = |source: rusqlite::Error| Error::Read {
        collection: collection.to_string(),
        source,
    };

    let mut stmt = conn
        .prepare_cached("SELECT id, body FROM documents WHERE collection = ?1 ORDER BY id ASC")
        .map_err(read_err)?;
    let rows = stmt
        .query_map(params![collection], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })
        .map_err(read_err)?;

    let mut docs = Vec::new();
    for row in rows {
        let (id, body) = row.map_err(read_err)?;
        docs.push(decode(collection, id, &body)?);
    }
    Ok(docs)
}

pub fn load_one(conn: &Connection, collection: &str, id: &str) -> Result<Option<Document>> {
    let body: Option<String> = conn
        .query_row(
            "SELECT body FROM documents WHERE collection = ?1 AND id = ?2",
            params![collection, id],
            |row| row.get(0),
        )
        .optional()
        .map_err(|source| Error::Read { collection: collection.to_string(), source })?;

    body.map(|b| decode(collection, id.to_string(), &b)).transpose()
}

pub fn count(conn: &Connection, collection: &str) -> Result<usize> {
    let n: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM documents WHERE collection = ?1",
            params![collection],
            |row| row.get(0),
        )
        .map_err(|source| Error::Read { collection: collection.to_string(), source })?;
    Ok(n as usize)
}

/// Deletes documents whose numeric `field` is at or before `now_ms`.
pub fn delete_expired(
    tx: &Transaction,
    collection: &str,
    field: &str,
    now_ms: u64,
) -> rusqlite::Result<usize> {
    let mut stmt = tx.prepare_cached(
        "DELETE FROM documents
         WHERE collection = ?1
           AND json_type(body, ?2) = 'integer'
           AND json_extract(body, ?2) <= ?3",
    )?;
    let removed = stmt.execute(params![collection, json_path(field), to_sql_ms(now_ms)])?;
    Ok(removed)
}

fn decode(collection: &str, id: String, body: &str) -> Result<Document> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(fields)) => Ok(Document { id, fields }),
        Ok(_) => Err(Error::Decode {
            collection: collection.to_string(),
            id,
            reason: "body is not a JSON object".to_string(),
        }),
        Err(e) => Err(Error::Decode {
            collection: collection.to_string(),
            id,
            reason: e.to_string(),
        }),
    }
}

fn json_path(field: &str) -> String {
    format!("$.{}", field)
}

// SQLite integers are signed
fn to_sql_ms(ms: u64) -> i64 {
    ms.min(i64::MAX as u64) as i64
}
