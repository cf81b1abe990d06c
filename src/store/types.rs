use serde_json::{Map, Value};

/// A stored document: identifier plus a JSON object body.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Map<String, Value>,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self { id: id.into(), fields }
    }

    /// Reads a millisecond timestamp field. Non-integer values read as `None`.
    pub fn timestamp(&self, field: &str) -> Option<u64> {
        self.fields.get(field).and_then(Value::as_u64)
    }

    pub fn set_timestamp(&mut self, field: &str, ts_ms: u64) {
        self.fields.insert(field.to_string(), Value::from(ts_ms));
    }
}

/// Operations a batch can stage
#[derive(Debug, Clone)]
pub enum WriteOp {
    /// Upsert by (collection, id), replacing the whole body
    Set { collection: String, doc: Document },
}

/// Writes applied together in one transaction.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { ops: Vec::with_capacity(capacity) }
    }

    pub fn set(&mut self, collection: &str, doc: Document) -> &mut Self {
        self.ops.push(WriteOp::Set { collection: collection.to_string(), doc });
        self
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }
}
