use airport_core::{StoreError, StoreResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// Raw record as kept by a document store.
pub type Document = Map<String, Value>;

/// Primary key field of every stored document.
pub const ID_FIELD: &str = "_id";

/// A database/collection pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    pub database: String,
    pub collection: String,
}

impl Namespace {
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
        }
    }

    /// Rejects names that cannot be used verbatim as SQL identifiers.
    pub fn validate(&self) -> StoreResult<()> {
        let valid = |name: &str| {
            !name.is_empty()
                && name.len() <= 63
                && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        };
        if valid(&self.database) && valid(&self.collection) {
            Ok(())
        } else {
            Err(StoreError::InvalidNamespace(self.to_string()))
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeleteResult {
    pub deleted_count: u64,
}

impl DeleteResult {
    pub fn deleted(&self) -> bool {
        self.deleted_count > 0
    }
}

pub fn id_of(document: &Document) -> Option<&str> {
    document.get(ID_FIELD).and_then(Value::as_str)
}

pub fn encode<T: Serialize>(namespace: &Namespace, record: &T) -> StoreResult<Document> {
    match serde_json::to_value(record) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(other) => Err(malformed(namespace, format!("expected an object, got {other}"))),
        Err(err) => Err(malformed(namespace, err.to_string())),
    }
}

pub fn decode<T: DeserializeOwned>(namespace: &Namespace, document: Document) -> StoreResult<T> {
    serde_json::from_value(Value::Object(document))
        .map_err(|err| malformed(namespace, err.to_string()))
}

fn malformed(namespace: &Namespace, reason: String) -> StoreError {
    StoreError::Malformed {
        collection: namespace.to_string(),
        reason,
    }
}
