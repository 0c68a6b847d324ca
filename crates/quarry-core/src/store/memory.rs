//! In-memory storage backend. Single-threaded by design, matching the
//! session model: one `MemoryStore` is one session over its own data.

use crate::{
    model::EntityModel,
    store::{RowKey, StorageError, StorageSession, StoredRow},
    value::Value,
};
use std::{
    cell::{Cell, RefCell},
    collections::BTreeMap,
};

type EntityRows = BTreeMap<RowKey, BTreeMap<String, Value>>;

///
/// MemoryStore
///
/// `BTreeMap`-backed store keyed by entity name then row key, so scans
/// come back in stable key order without extra sorting. Keys are
/// assigned from a single monotonically increasing counter shared by
/// all entities.
///

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RefCell<BTreeMap<&'static str, EntityRows>>,
    next_key: Cell<RowKey>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a row, validating every field name and kind against the
    /// model. The primary key field is filled in from the assigned row
    /// key when the caller leaves it out.
    pub fn insert(
        &self,
        entity: &'static EntityModel,
        fields: Vec<(&str, Value)>,
    ) -> Result<RowKey, StorageError> {
        let mut row = BTreeMap::new();
        for (name, value) in fields {
            let Some(field) = entity.field(name) else {
                return Err(StorageError::new(format!(
                    "entity {} has no field '{name}'",
                    entity.name
                )));
            };
            if !value.is_null() && !field.kind.comparable_with(value.kind()) {
                return Err(StorageError::new(format!(
                    "field {}.{name} expects {}, got {}",
                    entity.name,
                    field.kind,
                    value.kind()
                )));
            }
            row.insert(field.name.to_string(), value);
        }

        let key = self.next_key.get() + 1;
        self.next_key.set(key);

        #[expect(clippy::cast_possible_wrap)]
        row.entry(entity.primary_key.to_string())
            .or_insert(Value::Int(key as i64));

        self.tables
            .borrow_mut()
            .entry(entity.name)
            .or_default()
            .insert(key, row);

        Ok(key)
    }

    #[must_use]
    pub fn row_count(&self, entity: &'static EntityModel) -> usize {
        self.tables
            .borrow()
            .get(entity.name)
            .map_or(0, BTreeMap::len)
    }
}

impl StorageSession for MemoryStore {
    fn scan(&self, entity: &'static EntityModel) -> Result<Vec<StoredRow>, StorageError> {
        let tables = self.tables.borrow();
        let rows = tables
            .get(entity.name)
            .map(|rows| {
                rows.iter()
                    .map(|(&key, fields)| StoredRow {
                        key,
                        fields: fields.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(rows)
    }

    fn apply_update(
        &self,
        entity: &'static EntityModel,
        updates: Vec<(RowKey, Vec<(String, Value)>)>,
    ) -> Result<u64, StorageError> {
        let mut tables = self.tables.borrow_mut();
        let Some(rows) = tables.get_mut(entity.name) else {
            return Ok(0);
        };

        let mut written = 0;
        for (key, fields) in updates {
            if let Some(row) = rows.get_mut(&key) {
                for (name, value) in fields {
                    row.insert(name, value);
                }
                written += 1;
            }
        }

        Ok(written)
    }

    fn delete_rows(
        &self,
        entity: &'static EntityModel,
        keys: Vec<RowKey>,
    ) -> Result<u64, StorageError> {
        let mut tables = self.tables.borrow_mut();
        let Some(rows) = tables.get_mut(entity.name) else {
            return Ok(0);
        };

        let mut removed = 0;
        for key in keys {
            if rows.remove(&key).is_some() {
                removed += 1;
            }
        }

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MEMBER, TEAM};

    #[test]
    fn insert_assigns_monotonic_keys_and_fills_primary_key() {
        let store = MemoryStore::new();

        let a = store
            .insert(&TEAM, vec![("name", Value::from("teamA"))])
            .unwrap();
        let b = store
            .insert(&TEAM, vec![("name", Value::from("teamB"))])
            .unwrap();
        assert!(b > a);

        let rows = store.scan(&TEAM).unwrap();
        assert_eq!(rows.len(), 2);
        #[expect(clippy::cast_possible_wrap)]
        let expected = Value::Int(a as i64);
        assert_eq!(rows[0].field("id"), expected);
    }

    #[test]
    fn insert_rejects_unknown_field_and_wrong_kind() {
        let store = MemoryStore::new();

        let err = store
            .insert(&MEMBER, vec![("nickname", Value::from("x"))])
            .unwrap_err();
        assert!(err.message.contains("no field"));

        let err = store
            .insert(&MEMBER, vec![("age", Value::from("ten"))])
            .unwrap_err();
        assert!(err.message.contains("expects"));
    }

    #[test]
    fn update_and_delete_report_touched_row_counts() {
        let store = MemoryStore::new();
        let key = store
            .insert(&TEAM, vec![("name", Value::from("teamA"))])
            .unwrap();

        let written = store
            .apply_update(
                &TEAM,
                vec![
                    (key, vec![("name".to_string(), Value::from("renamed"))]),
                    (key + 99, vec![("name".to_string(), Value::from("ghost"))]),
                ],
            )
            .unwrap();
        assert_eq!(written, 1);

        let rows = store.scan(&TEAM).unwrap();
        assert_eq!(rows[0].field("name"), Value::from("renamed"));

        let removed = store.delete_rows(&TEAM, vec![key, key + 99]).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.row_count(&TEAM), 0);
    }

    #[test]
    fn missing_fields_read_as_null() {
        let store = MemoryStore::new();
        store
            .insert(&MEMBER, vec![("age", Value::from(10))])
            .unwrap();

        let rows = store.scan(&MEMBER).unwrap();
        assert_eq!(rows[0].field("username"), Value::Null);
    }
}
