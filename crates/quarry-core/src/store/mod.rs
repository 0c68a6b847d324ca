pub mod memory;

pub use memory::MemoryStore;

use crate::{model::EntityModel, value::Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error as ThisError;

///
/// RowKey
///
/// Opaque storage identity of a row, assigned by the backing store.
///

pub type RowKey = u64;

///
/// StoredRow
///
/// One row as handed over by a storage session: its key plus a
/// field-name-to-value map. Missing fields read as null.
///

#[derive(Clone, Debug, PartialEq)]
pub struct StoredRow {
    pub key: RowKey,
    pub fields: BTreeMap<String, Value>,
}

impl StoredRow {
    #[must_use]
    pub fn field(&self, name: &str) -> Value {
        self.fields.get(name).cloned().unwrap_or(Value::Null)
    }
}

///
/// StorageError
///
/// Opaque failure reported by a storage session. The query core passes
/// these through unchanged and never retries.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize, ThisError)]
#[error("storage error: {message}")]
pub struct StorageError {
    pub message: String,
}

impl StorageError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

///
/// StorageSession
///
/// The seam between the query engine and whatever holds the rows. A
/// session is scoped to one caller; implementations decide visibility
/// and durability. Everything above this trait is backend-agnostic.
///

pub trait StorageSession {
    /// Every current row of `entity`, in stable key order.
    fn scan(&self, entity: &'static EntityModel) -> Result<Vec<StoredRow>, StorageError>;

    /// Apply per-row field updates directly to storage, bypassing any
    /// caller-held copies. Returns the number of rows written.
    fn apply_update(
        &self,
        entity: &'static EntityModel,
        updates: Vec<(RowKey, Vec<(String, Value)>)>,
    ) -> Result<u64, StorageError>;

    /// Delete rows by key. Returns the number of rows removed.
    fn delete_rows(
        &self,
        entity: &'static EntityModel,
        keys: Vec<RowKey>,
    ) -> Result<u64, StorageError>;
}
